//! Loads the static YAML config file (no secrets) and merges environment
//! variables on top. Secrets (the completion API key) come from the
//! environment only.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::Config;

/// Optional overrides as they appear in the YAML file. Every field is
/// optional; missing fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverrides {
    model_name: Option<String>,
    api_base_url: Option<String>,
    max_file_size: Option<u64>,
    max_files: Option<usize>,
    max_depth: Option<u32>,
    supported_extensions: Option<Vec<String>>,
    special_file_names: Option<Vec<String>>,
    include_badges: Option<bool>,
    include_toc: Option<bool>,
    include_installation: Option<bool>,
    include_usage: Option<bool>,
    include_api_docs: Option<bool>,
    include_contributing: Option<bool>,
    include_license: Option<bool>,
    request_timeout: Option<u64>,
    max_retries: Option<u32>,
    retry_delay: Option<f64>,
    max_tokens: Option<u32>,
}

/// Build the effective [`Config`]: defaults, then environment, then the
/// optional YAML file, then the `MAX_TOKENS` env override, mirroring the
/// precedence users rely on.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    dotenvy::dotenv().ok();

    let mut config = Config::default();

    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        config.api_key = key;
    }
    if let Ok(model) = std::env::var("MODEL_NAME") {
        config.model_name = model;
    }
    if let Ok(url) = std::env::var("API_BASE_URL") {
        config.api_base_url = url;
    }

    if let Some(path) = path {
        info!(config_path = ?path, "Loading configuration from file");
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(error = ?e, config_path = ?path, "Failed to read config file");
                return Err(anyhow::anyhow!(
                    "Failed to read config file {:?}: {}",
                    path,
                    e
                ));
            }
        };
        let overrides: ConfigOverrides = match serde_yaml::from_str(&content) {
            Ok(overrides) => {
                info!(config_path = ?path, "Parsed config YAML successfully");
                overrides
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        };
        apply_overrides(&mut config, overrides);
    }

    if let Ok(raw) = std::env::var("MAX_TOKENS") {
        match raw.parse::<u32>() {
            Ok(tokens) => config.max_tokens = tokens,
            Err(_) => warn!(raw = %raw, "Invalid MAX_TOKENS value; using default"),
        }
    }

    if config.api_key.is_empty() {
        warn!("OpenRouter API key not set");
    }

    config.trace_loaded();
    Ok(config)
}

fn apply_overrides(config: &mut Config, overrides: ConfigOverrides) {
    let ConfigOverrides {
        model_name,
        api_base_url,
        max_file_size,
        max_files,
        max_depth,
        supported_extensions,
        special_file_names,
        include_badges,
        include_toc,
        include_installation,
        include_usage,
        include_api_docs,
        include_contributing,
        include_license,
        request_timeout,
        max_retries,
        retry_delay,
        max_tokens,
    } = overrides;

    if let Some(v) = model_name {
        config.model_name = v;
    }
    if let Some(v) = api_base_url {
        config.api_base_url = v;
    }
    if let Some(v) = max_file_size {
        config.max_file_size = v;
    }
    if let Some(v) = max_files {
        config.max_files = v;
    }
    if let Some(v) = max_depth {
        config.max_depth = v;
    }
    if let Some(v) = supported_extensions {
        config.supported_extensions = v;
    }
    if let Some(v) = special_file_names {
        config.special_file_names = v;
    }
    if let Some(v) = include_badges {
        config.include_badges = v;
    }
    if let Some(v) = include_toc {
        config.include_toc = v;
    }
    if let Some(v) = include_installation {
        config.include_installation = v;
    }
    if let Some(v) = include_usage {
        config.include_usage = v;
    }
    if let Some(v) = include_api_docs {
        config.include_api_docs = v;
    }
    if let Some(v) = include_contributing {
        config.include_contributing = v;
    }
    if let Some(v) = include_license {
        config.include_license = v;
    }
    if let Some(v) = request_timeout {
        config.request_timeout = v;
    }
    if let Some(v) = max_retries {
        config.max_retries = v;
    }
    if let Some(v) = retry_delay {
        config.retry_delay = v;
    }
    if let Some(v) = max_tokens {
        config.max_tokens = v;
    }
}
