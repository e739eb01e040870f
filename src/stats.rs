//! Derived statistics: language mix by line count and the project-type
//! heuristic.
//!
//! Project-type detection is a priority-ordered rule table evaluated
//! first-match-wins, so precedence stays auditable when a repository carries
//! manifests from more than one ecosystem.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract::FileRecord;

/// Extension (lowercase, with leading dot) to language label.
pub const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    (".py", "Python"),
    (".js", "JavaScript"),
    (".ts", "TypeScript"),
    (".jsx", "React"),
    (".tsx", "React TypeScript"),
    (".java", "Java"),
    (".cpp", "C++"),
    (".c", "C"),
    (".cs", "C#"),
    (".rb", "Ruby"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".php", "PHP"),
    (".swift", "Swift"),
    (".kt", "Kotlin"),
    (".scala", "Scala"),
];

pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_LANGUAGES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

/// Percentage of counted lines per language label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageStats {
    pub languages: BTreeMap<String, f64>,
    pub total_lines: u64,
}

impl LanguageStats {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Languages sorted by percentage, highest first (alphabetical on ties).
    pub fn sorted_desc(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .languages
            .iter()
            .map(|(language, pct)| (language.clone(), *pct))
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }
}

/// Count newline-delimited lines per recognised language and convert to
/// percentages. Files with empty content contribute zero lines; when no
/// recognised file has content the mapping is empty and the total is zero.
pub fn language_stats(files: &[FileRecord]) -> LanguageStats {
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut total_lines: u64 = 0;

    for file in files {
        if let Some(language) = language_for_extension(&file.extension) {
            let lines = if file.content.is_empty() {
                0
            } else {
                file.content.lines().count() as u64
            };
            *counts.entry(language).or_insert(0) += lines;
            total_lines += lines;
        }
    }

    let mut languages = BTreeMap::new();
    if total_lines > 0 {
        for (language, lines) in counts {
            languages.insert(
                language.to_string(),
                lines as f64 / total_lines as f64 * 100.0,
            );
        }
    }

    LanguageStats {
        languages,
        total_lines,
    }
}

/// Precomputed evidence the project-type rules match against.
pub struct ProjectSignals {
    /// Lowercased file names present in the repository.
    names: HashSet<String>,
    /// Extensions present in the repository.
    extensions: HashSet<String>,
    /// Lowercased concatenation of all file contents.
    haystack: String,
}

impl ProjectSignals {
    pub fn from_files(files: &[FileRecord]) -> Self {
        let names = files.iter().map(|f| f.name.to_lowercase()).collect();
        let extensions = files.iter().map(|f| f.extension.clone()).collect();
        let haystack = files
            .iter()
            .filter(|f| !f.content.is_empty())
            .map(|f| f.content.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            names,
            extensions,
            haystack,
        }
    }

    fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn has_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    fn content_contains(&self, needle: &str) -> bool {
        self.haystack.contains(needle)
    }

    fn has_python_manifest(&self) -> bool {
        self.has_name("requirements.txt") || self.has_name("pyproject.toml")
    }
}

/// Ordered project-type rules; the first matching label wins. Callers rely on
/// this precedence when multiple manifests coexist.
pub const PROJECT_TYPE_RULES: &[(&str, fn(&ProjectSignals) -> bool)] = &[
    ("React Application", |s| {
        s.has_name("package.json") && (s.has_extension(".jsx") || s.has_extension(".tsx"))
    }),
    ("Vue.js Application", |s| {
        s.has_name("package.json") && s.has_extension(".vue")
    }),
    ("Node.js Application", |s| s.has_name("package.json")),
    ("Django Application", |s| {
        s.has_python_manifest() && s.has_name("manage.py")
    }),
    ("Flask Application", |s| {
        s.has_python_manifest() && s.content_contains("flask")
    }),
    ("FastAPI Application", |s| {
        s.has_python_manifest() && s.content_contains("fastapi")
    }),
    ("Python Project", |s| s.has_python_manifest()),
    ("Java Project", |s| {
        s.has_name("pom.xml") || s.has_name("build.gradle")
    }),
    ("Rust Project", |s| s.has_name("cargo.toml")),
    ("Go Project", |s| s.has_name("go.mod")),
    ("Ruby Project", |s| s.has_name("gemfile")),
    ("General Project", |_| true),
];

/// Resolve the project-type label for the collected file set.
pub fn detect_project_type(files: &[FileRecord]) -> String {
    let signals = ProjectSignals::from_files(files);
    for (label, applies) in PROJECT_TYPE_RULES {
        if applies(&signals) {
            debug!(project_type = label, "Detected project type");
            return (*label).to_string();
        }
    }
    // The fallback rule always matches; this is unreachable in practice.
    "General Project".to_string()
}
