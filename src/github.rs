//! GitHub REST API client implementing [`RepositoryHost`].
//!
//! One shared `reqwest::Client` per instance, scoped to a single
//! analysis-then-generation run; dropping the client releases all pooled
//! connections on every exit path. Every call goes through the shared
//! [`RetryPolicy`]: 404 is terminal, 403 (rate limit) and transport errors
//! back off and retry, any other non-200 status is logged and retried.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::contract::{ApiError, EntryKind, RepoInfo, RepositoryHost, TreeEntry};
use crate::retry::{Outcome, RetryPolicy};

const API_ROOT: &str = "https://api.github.com";
/// GitHub rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("readme-forge/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    api_root: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct RepoInfoWire {
    name: String,
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
    clone_url: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    has_wiki: bool,
    #[serde(default)]
    has_issues: bool,
    #[serde(default)]
    has_projects: bool,
}

#[derive(Debug, Deserialize)]
struct ContentEntryWire {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;
        info!(api_root = API_ROOT, "Initialized GitHub client");
        Ok(Self {
            http,
            api_root: API_ROOT.to_string(),
            retry: config.retry_policy(),
        })
    }

    /// One GET with status classification; the retry policy drives repeats.
    async fn attempt_get(&self, url: &str) -> Outcome<serde_json::Value> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Outcome::Retryable(ApiError::Transport(e.to_string())),
        };

        match response.status() {
            StatusCode::OK => match response.json::<serde_json::Value>().await {
                Ok(value) => Outcome::Success(value),
                Err(e) => Outcome::Terminal(ApiError::Malformed(format!("invalid JSON body: {e}"))),
            },
            StatusCode::NOT_FOUND => {
                error!(url, "Repository resource not found or not accessible");
                Outcome::Terminal(ApiError::NotFound)
            }
            StatusCode::FORBIDDEN => {
                warn!(url, "GitHub API rate limit exceeded");
                Outcome::Retryable(ApiError::RateLimited)
            }
            status => {
                warn!(url, status = %status, "GitHub API returned unexpected status");
                Outcome::Retryable(ApiError::Transport(format!("unexpected status {status}")))
            }
        }
    }

    async fn get_json(&self, operation: &str, endpoint: &str) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/{}", self.api_root, endpoint);
        debug!(url = %url, "GitHub API request");
        self.retry
            .run(operation, || {
                let url = url.clone();
                async move { self.attempt_get(&url).await }
            })
            .await
    }

    fn contents_endpoint(owner: &str, repo: &str, path: &str) -> String {
        if path.is_empty() {
            format!("repos/{owner}/{repo}/contents")
        } else {
            format!("repos/{owner}/{repo}/contents/{path}")
        }
    }
}

/// Decode a base64 content payload (GitHub embeds newlines) into UTF-8 text.
/// Returns `None` for undecodable or non-UTF-8 content.
fn decode_content(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait::async_trait]
impl RepositoryHost for GithubClient {
    async fn repository_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, ApiError> {
        let value = self
            .get_json("repository_info", &format!("repos/{owner}/{repo}"))
            .await?;
        let wire: RepoInfoWire = serde_json::from_value(value)
            .map_err(|e| ApiError::Malformed(format!("unexpected repository payload: {e}")))?;
        info!(
            full_name = %wire.full_name,
            stars = wire.stargazers_count,
            "Fetched repository info"
        );
        Ok(RepoInfo {
            name: wire.name,
            full_name: wire.full_name,
            description: wire.description.unwrap_or_default(),
            url: wire.html_url,
            clone_url: wire.clone_url,
            language: wire.language.unwrap_or_default(),
            stars: wire.stargazers_count,
            forks: wire.forks_count,
            open_issues: wire.open_issues_count,
            created_at: wire.created_at.unwrap_or_default(),
            updated_at: wire.updated_at.unwrap_or_default(),
            has_wiki: wire.has_wiki,
            has_issues: wire.has_issues,
            has_projects: wire.has_projects,
        })
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, ApiError> {
        let endpoint = Self::contents_endpoint(owner, repo, path);
        let value = self.get_json("list_directory", &endpoint).await?;
        let entries: Vec<ContentEntryWire> = serde_json::from_value(value)
            .map_err(|e| ApiError::Malformed(format!("unexpected directory listing: {e}")))?;
        debug!(path = %path, entries = entries.len(), "Listed directory");
        Ok(entries
            .into_iter()
            .map(|entry| TreeEntry {
                kind: if entry.kind == "dir" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                name: entry.name,
                path: entry.path,
                size: entry.size,
            })
            .collect())
    }

    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<String>, ApiError> {
        let endpoint = Self::contents_endpoint(owner, repo, path);
        let value = self.get_json("file_content", &endpoint).await?;
        let entry: ContentEntryWire = serde_json::from_value(value)
            .map_err(|e| ApiError::Malformed(format!("unexpected file payload: {e}")))?;

        if entry.kind != "file" {
            return Ok(None);
        }
        let raw = match entry.content {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        if let Some(encoding) = &entry.encoding {
            if encoding != "base64" {
                warn!(path = %path, encoding = %encoding, "Unexpected content encoding");
                return Ok(None);
            }
        }
        match decode_content(&raw) {
            Some(text) => Ok(Some(text)),
            None => {
                warn!(path = %path, "Failed to decode file content");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_with_embedded_newlines() {
        // "hello world" split across lines the way the API delivers it
        assert_eq!(
            decode_content("aGVsbG8g\nd29ybGQ=\n"),
            Some("hello world".to_string())
        );
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_eq!(decode_content("!!not base64!!"), None);
    }

    #[test]
    fn rejects_non_utf8_payloads() {
        // 0xff 0xfe is not valid UTF-8
        assert_eq!(decode_content("//4="), None);
    }

    #[test]
    fn root_and_nested_content_endpoints() {
        assert_eq!(
            GithubClient::contents_endpoint("user", "repo", ""),
            "repos/user/repo/contents"
        );
        assert_eq!(
            GithubClient::contents_endpoint("user", "repo", "src/main.rs"),
            "repos/user/repo/contents/src/main.rs"
        );
    }
}
