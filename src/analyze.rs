//! Repository analysis: URL intake, the bounded tree walker and the snapshot
//! handed to prompt assembly.
//!
//! The walker lists directories depth-first through a [`RepositoryHost`],
//! accepting files by extension or special name, bounded by the configured
//! file count, recursion depth and per-file size. Listing failures yield an
//! empty subtree; content failures yield an empty-content record. The
//! resulting [`RepositorySnapshot`] is immutable apart from derived accessor
//! queries.

use std::path::Path;

use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::contract::{ApiError, EntryKind, FileRecord, RepositoryHost};
use crate::stats::{self, LanguageStats};

/// Extract `(owner, repo)` from a `https://github.com/{owner}/{repo}` URL.
/// Any other shape yields `None`.
pub fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let url = url.trim().trim_end_matches('/');
    let pattern = Regex::new(r"^https?://github\.com/([\w.-]+)/([\w.-]+)$").unwrap();
    let caps = pattern.captures(url)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Complete repository analysis data. Constructed once per run from the
/// walker's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    // Basic info
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub clone_url: String,

    // Language info
    pub language: String,
    pub languages: LanguageStats,

    // Statistics
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,

    // Timestamps
    pub created_at: String,
    pub updated_at: String,

    // Analysis results
    pub project_type: String,
    /// Depth-first traversal order, siblings as listed by the host.
    pub files: Vec<FileRecord>,

    // Special files
    pub readme_content: String,
    pub license_content: String,

    // Features
    pub has_wiki: bool,
    pub has_issues: bool,
    pub has_projects: bool,
}

impl RepositorySnapshot {
    pub fn files_by_extension(&self, extension: &str) -> Vec<&FileRecord> {
        self.files
            .iter()
            .filter(|f| f.extension == extension)
            .collect()
    }

    /// Look up a file by name, case-insensitively.
    pub fn file_by_name(&self, name: &str) -> Option<&FileRecord> {
        let wanted = name.to_lowercase();
        self.files.iter().find(|f| f.name.to_lowercase() == wanted)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.file_by_name(name).is_some()
    }

    /// Primary language: stats argmax, then the declared language, then
    /// "Unknown".
    pub fn main_language(&self) -> String {
        if let Some((language, _)) = self.languages.sorted_desc().into_iter().next() {
            return language;
        }
        if !self.language.is_empty() {
            return self.language.clone();
        }
        "Unknown".to_string()
    }

    /// Configuration files: config-style extensions, Dockerfile/Makefile, and
    /// dotenv files.
    pub fn config_files(&self) -> Vec<&FileRecord> {
        const CONFIG_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml", ".toml", ".ini", ".cfg"];
        self.files
            .iter()
            .filter(|f| {
                let name = f.name.to_lowercase();
                CONFIG_EXTENSIONS.contains(&f.extension.as_str())
                    || name == "dockerfile"
                    || name == "makefile"
                    || name.starts_with(".env")
            })
            .collect()
    }

    pub fn documentation_files(&self) -> Vec<&FileRecord> {
        const DOC_EXTENSIONS: &[&str] = &[".md", ".txt", ".rst"];
        self.files
            .iter()
            .filter(|f| DOC_EXTENSIONS.contains(&f.extension.as_str()))
            .collect()
    }
}

/// Lowercased extension with leading dot; empty for names without one.
fn extension_of(name: &str) -> String {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{}", ext.to_lowercase()),
        None => String::new(),
    }
}

/// Walks a remote repository through a [`RepositoryHost`] and assembles the
/// snapshot.
pub struct Analyzer<'a, H> {
    host: &'a H,
    config: &'a Config,
}

impl<'a, H: RepositoryHost> Analyzer<'a, H> {
    pub fn new(host: &'a H, config: &'a Config) -> Self {
        Self { host, config }
    }

    /// Analyse the repository behind `repo_url` and return its snapshot.
    ///
    /// Terminal failures of the metadata fetch propagate; walker-level
    /// listing/content failures degrade to missing records instead.
    pub async fn analyze(&self, repo_url: &str) -> Result<RepositorySnapshot, ApiError> {
        let (owner, repo) = parse_repo_url(repo_url).ok_or_else(|| {
            ApiError::Malformed(format!("not a GitHub repository URL: {repo_url}"))
        })?;
        info!(owner = %owner, repo = %repo, "Analyzing repository");

        let info = self.host.repository_info(&owner, &repo).await?;

        let files = self
            .walk(&owner, &repo, String::new(), 0, self.config.max_files)
            .await;
        info!(files = files.len(), "Repository tree walk complete");

        let languages = stats::language_stats(&files);
        let project_type = stats::detect_project_type(&files);

        let readme_content = files
            .iter()
            .find(|f| f.name.to_lowercase().starts_with("readme"))
            .map(|f| f.content.clone())
            .unwrap_or_default();
        let license_content = files
            .iter()
            .find(|f| f.name.to_lowercase().starts_with("license"))
            .map(|f| f.content.clone())
            .unwrap_or_default();

        info!(
            full_name = %info.full_name,
            project_type = %project_type,
            total_lines = languages.total_lines,
            "Repository analysis complete"
        );

        Ok(RepositorySnapshot {
            name: info.name,
            full_name: info.full_name,
            description: info.description,
            url: info.url,
            clone_url: info.clone_url,
            language: info.language,
            languages,
            stars: info.stars,
            forks: info.forks,
            open_issues: info.open_issues,
            created_at: info.created_at,
            updated_at: info.updated_at,
            project_type,
            files,
            readme_content,
            license_content,
            has_wiki: info.has_wiki,
            has_issues: info.has_issues,
            has_projects: info.has_projects,
        })
    }

    /// Depth-first bounded walk. `budget` is the number of records this
    /// subtree may still produce; recursion hands the remaining budget down
    /// so the total never exceeds `max_files`.
    fn walk<'s>(
        &'s self,
        owner: &'s str,
        repo: &'s str,
        path: String,
        level: u32,
        budget: usize,
    ) -> BoxFuture<'s, Vec<FileRecord>> {
        async move {
            if level > self.config.max_depth || budget == 0 {
                return Vec::new();
            }

            let entries = match self.host.list_directory(owner, repo, &path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path, error = %e, "Directory listing failed, skipping subtree");
                    return Vec::new();
                }
            };

            let mut files: Vec<FileRecord> = Vec::new();
            for entry in entries {
                if files.len() >= budget {
                    break;
                }
                match entry.kind {
                    EntryKind::Dir => {
                        let subtree = self
                            .walk(owner, repo, entry.path, level + 1, budget - files.len())
                            .await;
                        files.extend(subtree);
                    }
                    EntryKind::File => {
                        let extension = extension_of(&entry.name);
                        let supported = self.config.supported_extensions.contains(&extension)
                            || self.config.special_file_names.contains(&entry.name);
                        if !supported {
                            continue;
                        }
                        if entry.size > self.config.max_file_size {
                            debug!(path = %entry.path, size = entry.size, "Skipping oversized file");
                            continue;
                        }
                        let content = match self.host.file_content(owner, repo, &entry.path).await
                        {
                            Ok(Some(text)) => text,
                            Ok(None) => String::new(),
                            Err(e) => {
                                warn!(path = %entry.path, error = %e, "Content fetch failed, keeping record with empty content");
                                String::new()
                            }
                        };
                        files.push(FileRecord {
                            path: entry.path,
                            name: entry.name,
                            extension,
                            size: entry.size,
                            content,
                        });
                    }
                }
            }
            files
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_repository_url() {
        assert_eq!(
            parse_repo_url("https://github.com/rust-lang/cargo"),
            Some(("rust-lang".to_string(), "cargo".to_string()))
        );
    }

    #[test]
    fn accepts_trailing_slash_and_http() {
        assert_eq!(
            parse_repo_url("http://github.com/user/my-repo/"),
            Some(("user".to_string(), "my-repo".to_string()))
        );
    }

    #[test]
    fn rejects_other_hosts_and_shapes() {
        assert_eq!(parse_repo_url("https://gitlab.com/user/repo"), None);
        assert_eq!(parse_repo_url("https://github.com/user"), None);
        assert_eq!(parse_repo_url("https://github.com/user/repo/tree/main"), None);
        assert_eq!(parse_repo_url("not a url"), None);
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of("Main.PY"), ".py");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".env"), "");
    }

    fn snapshot_with_files(files: Vec<FileRecord>) -> RepositorySnapshot {
        RepositorySnapshot {
            name: "demo".into(),
            full_name: "user/demo".into(),
            description: String::new(),
            url: "https://github.com/user/demo".into(),
            clone_url: "https://github.com/user/demo.git".into(),
            language: "Python".into(),
            languages: stats::language_stats(&files),
            stars: 0,
            forks: 0,
            open_issues: 0,
            created_at: String::new(),
            updated_at: String::new(),
            project_type: stats::detect_project_type(&files),
            files,
            readme_content: String::new(),
            license_content: String::new(),
            has_wiki: false,
            has_issues: false,
            has_projects: false,
        }
    }

    fn record(path: &str, content: &str) -> FileRecord {
        let name = path.rsplit('/').next().unwrap().to_string();
        let extension = extension_of(&name);
        FileRecord {
            path: path.to_string(),
            name,
            extension,
            size: content.len() as u64,
            content: content.to_string(),
        }
    }

    #[test]
    fn file_lookup_is_case_insensitive() {
        let snapshot = snapshot_with_files(vec![record("README.md", "# hi\n")]);
        assert!(snapshot.file_by_name("readme.md").is_some());
        assert!(snapshot.has_file("README.MD"));
        assert!(!snapshot.has_file("missing.md"));
    }

    #[test]
    fn main_language_prefers_stats_over_declared() {
        let snapshot = snapshot_with_files(vec![record("a.go", "package main\n")]);
        assert_eq!(snapshot.main_language(), "Go");
    }

    #[test]
    fn main_language_falls_back_to_declared_then_unknown() {
        let mut snapshot = snapshot_with_files(vec![]);
        assert_eq!(snapshot.main_language(), "Python");
        snapshot.language = String::new();
        assert_eq!(snapshot.main_language(), "Unknown");
    }

    #[test]
    fn config_files_cover_extensions_and_special_names() {
        let snapshot = snapshot_with_files(vec![
            record("settings.yaml", "a: 1\n"),
            record("Dockerfile", "FROM alpine\n"),
            record(".env.example", "KEY=value\n"),
            record("main.py", "print()\n"),
        ]);
        let names: Vec<&str> = snapshot
            .config_files()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["settings.yaml", "Dockerfile", ".env.example"]);
    }
}
