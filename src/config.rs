//! Runtime configuration for the analysis-and-generation pipeline.
//!
//! All values are plain data; loading/merging from YAML and environment lives
//! in [`crate::load_config`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // API configuration
    /// Bearer credential for the completion API. Env-only, never persisted.
    pub api_key: String,
    pub model_name: String,
    pub api_base_url: String,

    // Analysis configuration
    /// Maximum size in bytes of a file the walker will accept.
    pub max_file_size: u64,
    /// Maximum number of files collected per run.
    pub max_files: usize,
    /// Maximum directory recursion depth.
    pub max_depth: u32,
    /// Extensions (lowercase, with leading dot) accepted by the walker.
    pub supported_extensions: Vec<String>,
    /// File names accepted regardless of extension.
    pub special_file_names: Vec<String>,

    // Generation configuration
    pub include_badges: bool,
    pub include_toc: bool,
    pub include_installation: bool,
    pub include_usage: bool,
    pub include_api_docs: bool,
    pub include_contributing: bool,
    pub include_license: bool,

    // Request configuration
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Total attempts per API call (not retries after the first failure).
    pub max_retries: u32,
    /// Base backoff delay in seconds; doubles per attempt.
    pub retry_delay: f64,
    /// Completion token budget per request.
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_name: "openai/gpt-4o".to_string(),
            api_base_url: "https://openrouter.ai/api/v1".to_string(),
            max_file_size: 100_000,
            max_files: 50,
            max_depth: 3,
            supported_extensions: [
                ".py", ".js", ".ts", ".jsx", ".tsx", ".java", ".cpp", ".c", ".cs", ".rb",
                ".go", ".rs", ".php", ".swift", ".kt", ".scala", ".md", ".txt", ".yaml",
                ".yml", ".json", ".toml", ".cfg", ".ini", ".sh", ".bat",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            special_file_names: ["README.md", "LICENSE", "Dockerfile", "Makefile"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_badges: true,
            include_toc: true,
            include_installation: true,
            include_usage: true,
            include_api_docs: true,
            include_contributing: true,
            include_license: true,
            request_timeout: 30,
            max_retries: 3,
            retry_delay: 1.0,
            max_tokens: 2000,
        }
    }
}

impl Config {
    /// The shared retry policy both API clients derive from this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs_f64(self.retry_delay))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn trace_loaded(&self) {
        info!(
            model_name = %self.model_name,
            api_base_url = %self.api_base_url,
            api_key_set = !self.api_key.is_empty(),
            max_files = self.max_files,
            max_depth = self.max_depth,
            max_file_size = self.max_file_size,
            max_retries = self.max_retries,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
