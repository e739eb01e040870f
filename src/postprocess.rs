//! Markdown post-processing: normalises the completion output into a
//! well-formed document.
//!
//! Guarantees a single top-level heading, inserts a shields.io badge line
//! when enabled (idempotently), strips trailing whitespace per line and
//! collapses runs of three or more newlines to exactly two.

use regex::Regex;
use tracing::debug;

use crate::analyze::RepositorySnapshot;
use crate::config::Config;

/// Window at the start of the document scanned for existing image markup
/// before badges are inserted.
const BADGE_SCAN_WINDOW: usize = 500;

/// Normalise the generated README text.
pub fn post_process(content: &str, snapshot: &RepositorySnapshot, config: &Config) -> String {
    let mut content = content.to_string();

    if !content.starts_with("# ") {
        content = format!("# {}\n\n{}", snapshot.name, content);
    }

    if config.include_badges && !leading_window(&content).contains("![") {
        let badges = badge_line(snapshot);
        if !badges.is_empty() {
            content = insert_after_title(&content, &badges);
            debug!("Inserted badge line after title");
        }
    }

    clean_markdown(&content)
}

fn leading_window(content: &str) -> String {
    content.chars().take(BADGE_SCAN_WINDOW).collect()
}

/// Insert `paragraph` as its own paragraph directly after the first
/// top-level heading line.
fn insert_after_title(content: &str, paragraph: &str) -> String {
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let title_line = lines
        .iter()
        .position(|l| l.starts_with("# "))
        .unwrap_or(0);
    lines.insert(title_line + 1, String::new());
    lines.insert(title_line + 2, paragraph.to_string());
    lines.insert(title_line + 3, String::new());
    lines.join("\n")
}

/// Shields.io badge line for the repository; empty when nothing applies.
pub fn badge_line(snapshot: &RepositorySnapshot) -> String {
    let mut badges: Vec<String> = Vec::new();

    if !snapshot.language.is_empty() {
        badges.push(format!(
            "![Language](https://img.shields.io/badge/Language-{}-blue)",
            snapshot.language
        ));
    }
    if snapshot.stars > 0 {
        badges.push(format!(
            "![Stars](https://img.shields.io/github/stars/{})",
            snapshot.full_name
        ));
    }
    if snapshot.forks > 0 {
        badges.push(format!(
            "![Forks](https://img.shields.io/github/forks/{})",
            snapshot.full_name
        ));
    }
    if snapshot.has_issues {
        badges.push(format!(
            "![Issues](https://img.shields.io/github/issues/{})",
            snapshot.full_name
        ));
    }
    if !snapshot.license_content.is_empty() {
        badges.push(format!(
            "![License](https://img.shields.io/github/license/{})",
            snapshot.full_name
        ));
    }
    badges.push(format!(
        "![Last Commit](https://img.shields.io/github/last-commit/{})",
        snapshot.full_name
    ));

    badges.join(" ")
}

/// Strip trailing whitespace per line and collapse 3+ consecutive newlines
/// to exactly 2.
pub fn clean_markdown(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let stripped = content
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    let collapse = Regex::new(r"\n{3,}").unwrap();
    collapse.replace_all(&stripped, "\n\n").trim().to_string()
}

/// Make a name safe for file-system use: invalid characters become
/// underscores, surrounding dots/spaces are trimmed, and an empty result
/// falls back to "README".
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        "README".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Human-readable file size for log output.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FileRecord;
    use crate::stats;

    fn snapshot() -> RepositorySnapshot {
        let files: Vec<FileRecord> = Vec::new();
        RepositorySnapshot {
            name: "demo".into(),
            full_name: "user/demo".into(),
            description: String::new(),
            url: "https://github.com/user/demo".into(),
            clone_url: "https://github.com/user/demo.git".into(),
            language: "Python".into(),
            languages: stats::language_stats(&files),
            stars: 5,
            forks: 2,
            open_issues: 0,
            created_at: String::new(),
            updated_at: String::new(),
            project_type: "Python Project".into(),
            files,
            readme_content: String::new(),
            license_content: "MIT".into(),
            has_wiki: false,
            has_issues: true,
            has_projects: false,
        }
    }

    #[test]
    fn prepends_title_when_missing() {
        let result = post_process("Some description.", &snapshot(), &Config::default());
        assert!(result.starts_with("# demo\n"));
    }

    #[test]
    fn keeps_existing_title() {
        let result = post_process("# My Project\n\nBody.", &snapshot(), &Config::default());
        assert!(result.starts_with("# My Project"));
        assert_eq!(result.matches("# demo").count(), 0);
    }

    #[test]
    fn inserts_badges_after_title() {
        let result = post_process("# My Project\n\nBody.", &snapshot(), &Config::default());
        let badge_pos = result.find("![Language]").expect("badges inserted");
        let title_end = result.find('\n').unwrap();
        assert!(badge_pos > title_end);
        assert!(result.contains("![Stars](https://img.shields.io/github/stars/user/demo)"));
        assert!(result.contains("![Last Commit]"));
    }

    #[test]
    fn badge_insertion_is_idempotent() {
        let config = Config::default();
        let snapshot = snapshot();
        let once = post_process("# My Project\n\nBody.", &snapshot, &config);
        let twice = post_process(&once, &snapshot, &config);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("![Language]").count(), 1);
    }

    #[test]
    fn badges_can_be_disabled() {
        let config = Config {
            include_badges: false,
            ..Config::default()
        };
        let result = post_process("# My Project\n\nBody.", &snapshot(), &config);
        assert!(!result.contains("!["));
    }

    #[test]
    fn badge_line_omits_zero_counters() {
        let mut snap = snapshot();
        snap.stars = 0;
        snap.forks = 0;
        snap.license_content = String::new();
        snap.has_issues = false;
        let badges = badge_line(&snap);
        assert!(!badges.contains("![Stars]"));
        assert!(!badges.contains("![Forks]"));
        assert!(!badges.contains("![Issues]"));
        assert!(!badges.contains("![License]"));
        assert!(badges.contains("![Last Commit]"));
    }

    #[test]
    fn collapses_newline_runs() {
        assert_eq!(clean_markdown("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_markdown("a  \nb\t\n"), "a\nb");
    }

    #[test]
    fn sanitizes_invalid_characters() {
        let cleaned = sanitize_file_name("My:App/Name");
        assert!(!cleaned.is_empty());
        for c in "<>:\"/\\|?*".chars() {
            assert!(!cleaned.contains(c), "still contains {c:?}");
        }
        assert_eq!(cleaned, "My_App_Name");
    }

    #[test]
    fn empty_sanitized_name_falls_back() {
        assert_eq!(sanitize_file_name(" . "), "README");
        assert_eq!(sanitize_file_name("..."), "README");
    }

    #[test]
    fn formats_file_sizes() {
        assert_eq!(format_file_size(0), "0B");
        assert_eq!(format_file_size(512), "512.0B");
        assert_eq!(format_file_size(2048), "2.0KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0MB");
    }
}
