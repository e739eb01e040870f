//! # contract: trait seams and shared types for the analysis/generation pipeline
//!
//! This module defines the two external-service traits the pipeline depends on
//! and the plain data types that cross those seams.
//!
//! ## Interface & Extensibility
//! - Implement [`RepositoryHost`] to plug in a source-hosting API (the crate
//!   ships a GitHub client in [`crate::github`]).
//! - Implement [`CompletionBackend`] to plug in a chat-completion API (the
//!   crate ships an OpenRouter-compatible client in [`crate::completion`]).
//! - All methods are async and return [`ApiError`], the shared failure
//!   taxonomy for both remote APIs.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Failure taxonomy shared by the repository-metadata API and the completion
/// API. Retryability is decided at the call site; see [`crate::retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Repository missing or inaccessible. Terminal.
    NotFound,
    /// Rate limit exceeded. Retryable with backoff.
    RateLimited,
    /// Invalid credential on the completion API. Terminal.
    Auth,
    /// Connection-level failure. Retryable with backoff.
    Transport(String),
    /// Unexpected payload shape. Terminal for that call.
    Malformed(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "repository not found or not accessible"),
            ApiError::RateLimited => write!(f, "API rate limit exceeded"),
            ApiError::Auth => write!(f, "invalid API credential"),
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::Malformed(msg) => write!(f, "malformed API response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Basic repository metadata as reported by the hosting API.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub description: String,
    /// Canonical browser URL of the repository.
    pub url: String,
    pub clone_url: String,
    /// Primary language as declared by the host (may be empty).
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub created_at: String,
    pub updated_at: String,
    pub has_wiki: bool,
    pub has_issues: bool,
    pub has_projects: bool,
}

/// Whether a directory-listing entry is a file or a directory.
///
/// Anything the host does not report as a directory (symlinks, submodules)
/// is treated as a file, matching the traversal contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A single entry in a remote directory listing.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes as reported by the listing (0 for directories).
    pub size: u64,
}

/// A file accepted by the tree walker. Immutable once created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FileRecord {
    /// Slash-separated path, unique within the repository.
    pub path: String,
    pub name: String,
    /// Lowercased extension including the leading dot; empty if none.
    pub extension: String,
    pub size: u64,
    /// UTF-8 text, or empty if the content was binary, undecodable or never
    /// fetched.
    pub content: String,
}

/// Trait for the repository-metadata API consumed by the tree walker.
///
/// Implementors own transport, authentication and retry; callers only see the
/// [`ApiError`] taxonomy. A failed `file_content` decode is not an error:
/// implementors return `Ok(None)` so the walker can keep the record with
/// empty content.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Fetch basic repository metadata for `owner/repo`.
    async fn repository_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, ApiError>;

    /// List the entries of a directory (`path` empty for the repository root).
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<TreeEntry>, ApiError>;

    /// Fetch and decode a file's content as UTF-8 text.
    ///
    /// Returns `Ok(None)` when the content exists but cannot be decoded.
    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<String>, ApiError>;
}

/// Trait for the chat-completion API that turns the assembled prompt into
/// README text.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Submit a system/user prompt pair and return the trimmed completion
    /// text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ApiError>;
}
