//! Prompt assembly: renders the repository snapshot into the natural-language
//! prompt submitted to the completion API.
//!
//! Pure string templating over [`RepositorySnapshot`], no network I/O. The
//! embedded excerpts are bounded by the truncation limits below so the
//! assembled prompt stays within the completion API's input budget.

use std::collections::BTreeMap;

use crate::analyze::RepositorySnapshot;
use crate::config::Config;
use crate::contract::FileRecord;

/// System message accompanying every completion request.
pub const SYSTEM_PROMPT: &str = "You are an expert technical writer specializing in creating comprehensive, professional README.md files for software projects. You analyze code repositories and generate clear, well-structured documentation that helps users understand, install, and use the software effectively.";

/// Files rendered in the structure summary.
const STRUCTURE_FILE_LIMIT: usize = 30;
/// Characters of the main entry-point excerpt.
const CODE_EXCERPT_LIMIT: usize = 500;
/// Size ceiling for verbatim configuration-file excerpts.
const CONFIG_EXCERPT_LIMIT: usize = 1000;
const CONFIG_SAMPLE_LIMIT: usize = 2;
const README_EXCERPT_LIMIT: usize = 2000;
const LICENSE_EXCERPT_LIMIT: usize = 500;

/// Canonical entry-point names across ecosystems, scanned in order; the
/// first present file supplies the code excerpt.
const MAIN_ENTRY_FILES: &[&str] = &[
    "main.py", "app.py", "index.js", "main.js", "server.js", "main.java", "Main.java",
    "main.go", "lib.rs", "main.rs",
];

/// Syntax-highlight label for a fenced code block.
pub fn fence_language(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        ".py" => "python",
        ".js" => "javascript",
        ".ts" => "typescript",
        ".jsx" => "jsx",
        ".tsx" => "tsx",
        ".java" => "java",
        ".cpp" => "cpp",
        ".c" => "c",
        ".cs" => "csharp",
        ".rb" => "ruby",
        ".go" => "go",
        ".rs" => "rust",
        ".php" => "php",
        ".swift" => "swift",
        ".kt" => "kotlin",
        ".scala" => "scala",
        ".json" => "json",
        ".yaml" | ".yml" => "yaml",
        ".toml" => "toml",
        ".xml" => "xml",
        ".html" => "html",
        ".css" => "css",
        ".sh" => "bash",
        ".bat" => "batch",
        ".md" => "markdown",
        _ => "",
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

enum TreeNode {
    Dir(BTreeMap<String, TreeNode>),
    File(u64),
}

fn insert_path(nodes: &mut BTreeMap<String, TreeNode>, path: &str, size: u64) {
    match path.split_once('/') {
        None => {
            nodes.insert(path.to_string(), TreeNode::File(size));
        }
        Some((dir, rest)) => {
            let node = nodes
                .entry(dir.to_string())
                .or_insert_with(|| TreeNode::Dir(BTreeMap::new()));
            if let TreeNode::Dir(children) = node {
                insert_path(children, rest, size);
            }
        }
    }
}

fn render_tree(nodes: &BTreeMap<String, TreeNode>, indent: usize, out: &mut String) {
    let prefix = "  ".repeat(indent);
    for (name, node) in nodes {
        match node {
            TreeNode::Dir(children) => {
                out.push_str(&prefix);
                out.push_str(name);
                out.push_str("/\n");
                render_tree(children, indent + 1, out);
            }
            TreeNode::File(size) => {
                out.push_str(&format!("{prefix}{name} ({size} bytes)\n"));
            }
        }
    }
}

/// Nested directory rendering of the first records, alphabetically sorted at
/// each level.
fn file_structure(files: &[FileRecord]) -> String {
    let mut root: BTreeMap<String, TreeNode> = BTreeMap::new();
    for file in files.iter().take(STRUCTURE_FILE_LIMIT) {
        insert_path(&mut root, &file.path, file.size);
    }
    let mut out = String::new();
    render_tree(&root, 0, &mut out);
    out.trim_end().to_string()
}

/// One main entry-point excerpt plus up to two configuration files.
fn code_samples(snapshot: &RepositorySnapshot) -> String {
    let mut samples: Vec<String> = Vec::new();

    for name in MAIN_ENTRY_FILES {
        if let Some(file) = snapshot.file_by_name(name) {
            if !file.content.is_empty() {
                samples.push(format!(
                    "### {}\n```{}\n{}...\n```",
                    file.name,
                    fence_language(&file.extension),
                    truncate_chars(&file.content, CODE_EXCERPT_LIMIT)
                ));
                break;
            }
        }
    }

    for file in snapshot.config_files().into_iter().take(CONFIG_SAMPLE_LIMIT) {
        if !file.content.is_empty() && file.content.chars().count() < CONFIG_EXCERPT_LIMIT {
            samples.push(format!(
                "### {}\n```{}\n{}\n```",
                file.name,
                fence_language(&file.extension),
                file.content
            ));
        }
    }

    if samples.is_empty() {
        "No significant code samples found.".to_string()
    } else {
        samples.join("\n\n")
    }
}

fn language_statistics(snapshot: &RepositorySnapshot) -> String {
    snapshot
        .languages
        .sorted_desc()
        .iter()
        .map(|(language, pct)| format!("- {language}: {pct:.1}%"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered README-section requirements, honouring the config toggles.
fn section_requirements(config: &Config) -> String {
    let sections: &[(&str, &str, bool)] = &[
        (
            "Project Title and Description",
            "Clear, engaging description",
            true,
        ),
        (
            "Badges",
            "Relevant badges for language, license, issues, etc.",
            config.include_badges,
        ),
        (
            "Table of Contents",
            "Well-organized navigation",
            config.include_toc,
        ),
        ("Features", "Key features and capabilities", true),
        (
            "Installation",
            "Step-by-step installation instructions",
            config.include_installation,
        ),
        (
            "Usage",
            "Code examples and usage instructions",
            config.include_usage,
        ),
        (
            "API Documentation",
            "If applicable, document key functions/classes",
            config.include_api_docs,
        ),
        (
            "Configuration",
            "Environment variables and config options",
            true,
        ),
        (
            "Contributing",
            "Guidelines for contributors",
            config.include_contributing,
        ),
        ("Testing", "How to run tests", true),
        ("Deployment", "Deployment instructions if applicable", true),
        ("License", "License information", config.include_license),
        ("Acknowledgments", "Credits and thanks", true),
    ];

    sections
        .iter()
        .filter(|(_, _, enabled)| *enabled)
        .enumerate()
        .map(|(i, (title, hint, _))| format!("{}. **{title}**: {hint}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the full analysis prompt for the completion API.
pub fn build_prompt(snapshot: &RepositorySnapshot, config: &Config) -> String {
    let readme_excerpt = if snapshot.readme_content.is_empty() {
        "No existing README found".to_string()
    } else {
        truncate_chars(&snapshot.readme_content, README_EXCERPT_LIMIT)
    };
    let license_excerpt = if snapshot.license_content.is_empty() {
        "No license file found".to_string()
    } else {
        truncate_chars(&snapshot.license_content, LICENSE_EXCERPT_LIMIT)
    };

    format!(
        r#"You are an expert technical writer tasked with creating a comprehensive README.md file for a GitHub repository.

## Repository Information:
- Name: {name}
- Description: {description}
- Project Type: {project_type}
- Main Language: {main_language}
- Stars: {stars}
- Forks: {forks}
- Open Issues: {open_issues}

## Language Statistics:
{language_statistics}

## File Structure:
{file_structure}

## Key Code Samples:
{code_samples}

## Existing README (if any):
{readme_excerpt}

## License Information:
{license_excerpt}

## Requirements:
Please generate a comprehensive README.md that includes:

{section_requirements}

## Guidelines:
- Write in clear, professional English
- Use proper Markdown formatting
- Include realistic code examples based on the actual code
- Make installation instructions specific to the project type
- Focus on practical information that helps users and contributors
- Ensure the content is accurate based on the repository analysis
- Use appropriate technical terminology for the project domain
- Include relevant links and references

Generate a complete, professional README.md file:
"#,
        name = snapshot.name,
        description = snapshot.description,
        project_type = snapshot.project_type,
        main_language = snapshot.main_language(),
        stars = snapshot.stars,
        forks = snapshot.forks,
        open_issues = snapshot.open_issues,
        language_statistics = language_statistics(snapshot),
        file_structure = file_structure(&snapshot.files),
        code_samples = code_samples(snapshot),
        readme_excerpt = readme_excerpt,
        license_excerpt = license_excerpt,
        section_requirements = section_requirements(config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    fn record(path: &str, content: &str) -> FileRecord {
        let name = path.rsplit('/').next().unwrap().to_string();
        let extension = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
            _ => String::new(),
        };
        FileRecord {
            path: path.to_string(),
            name,
            extension,
            size: content.len() as u64,
            content: content.to_string(),
        }
    }

    fn snapshot(files: Vec<FileRecord>) -> RepositorySnapshot {
        RepositorySnapshot {
            name: "demo".into(),
            full_name: "user/demo".into(),
            description: "A demo project".into(),
            url: "https://github.com/user/demo".into(),
            clone_url: "https://github.com/user/demo.git".into(),
            language: String::new(),
            languages: stats::language_stats(&files),
            stars: 12,
            forks: 3,
            open_issues: 1,
            created_at: String::new(),
            updated_at: String::new(),
            project_type: stats::detect_project_type(&files),
            files,
            readme_content: String::new(),
            license_content: String::new(),
            has_wiki: false,
            has_issues: true,
            has_projects: false,
        }
    }

    #[test]
    fn flask_project_gets_python_fenced_entry_point() {
        let snapshot = snapshot(vec![
            record("main.py", "import os\nimport sys\n"),
            record("requirements.txt", "flask\n"),
        ]);
        let prompt = build_prompt(&snapshot, &Config::default());

        assert!(prompt.contains("- Project Type: Flask Application"));
        assert!(prompt.contains("- Python: 100.0%"));
        assert!(prompt.contains("### main.py\n```python\nimport os\nimport sys\n...\n```"));
    }

    #[test]
    fn file_structure_is_nested_and_sorted() {
        let snapshot = snapshot(vec![
            record("src/zeta.py", "z\n"),
            record("src/alpha.py", "a\n"),
            record("README.md", "# demo\n"),
        ]);
        let structure = file_structure(&snapshot.files);
        let expected = "README.md (7 bytes)\nsrc/\n  alpha.py (2 bytes)\n  zeta.py (2 bytes)";
        assert_eq!(structure, expected);
    }

    #[test]
    fn at_most_two_config_excerpts_under_the_ceiling() {
        let big = "x".repeat(CONFIG_EXCERPT_LIMIT + 1);
        let snapshot = snapshot(vec![
            record("main.py", "print('hi')\n"),
            record("a.toml", "a = 1\n"),
            record("b.yaml", "b: 2\n"),
            record("c.json", "{}"),
            record("huge.toml", &big),
        ]);
        let samples = code_samples(&snapshot);
        assert!(samples.contains("### a.toml"));
        assert!(samples.contains("### b.yaml"));
        assert!(!samples.contains("### c.json"), "limited to two config files");
        assert!(!samples.contains("### huge.toml"));
    }

    #[test]
    fn missing_readme_and_license_use_placeholders() {
        let prompt = build_prompt(&snapshot(vec![]), &Config::default());
        assert!(prompt.contains("No existing README found"));
        assert!(prompt.contains("No license file found"));
        assert!(prompt.contains("No significant code samples found."));
    }

    #[test]
    fn disabled_sections_are_dropped_and_renumbered() {
        let config = Config {
            include_badges: false,
            include_toc: false,
            ..Config::default()
        };
        let requirements = section_requirements(&config);
        assert!(requirements.starts_with("1. **Project Title and Description**"));
        assert!(requirements.contains("2. **Features**"));
        assert!(!requirements.contains("**Badges**"));
        assert!(!requirements.contains("**Table of Contents**"));
    }

    #[test]
    fn default_config_requests_all_thirteen_sections() {
        let requirements = section_requirements(&Config::default());
        assert!(requirements.contains("13. **Acknowledgments**"));
    }
}
