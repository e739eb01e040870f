//! High-level pipeline: orchestrates analyse → prompt → complete →
//! post-process for a single repository URL.
//!
//! # Responsibilities
//! - Fail-fast orchestration: each failed step returns immediately with a
//!   formatted error; no step failure escapes as a panic.
//! - Invokes logging throughout for traceability.
//! - Does not perform I/O of its own beyond the injected clients: callers
//!   decide where the resulting document goes.
//!
//! # Callable From
//! - The CLI entrypoint and integration tests, with real or mock
//!   [`RepositoryHost`]/[`CompletionBackend`] implementations.

use tracing::{debug, error, info};

use crate::analyze::Analyzer;
use crate::config::Config;
use crate::contract::{CompletionBackend, RepositoryHost};
use crate::postprocess;
use crate::prompt;
use crate::stats::LanguageStats;

/// Outcome of a successful generation run, for downstream reporting.
#[derive(Debug, Clone)]
pub struct GeneratedReadme {
    pub repo_name: String,
    pub full_name: String,
    pub project_type: String,
    pub languages: LanguageStats,
    /// The final post-processed Markdown document.
    pub markdown: String,
}

/// Run the full generation pipeline for `repo_url`.
pub async fn generate<H, C>(
    config: &Config,
    host: &H,
    backend: &C,
    repo_url: &str,
) -> Result<GeneratedReadme, String>
where
    H: RepositoryHost,
    C: CompletionBackend,
{
    info!(repo_url, "[GEN] Starting README generation pipeline");

    // --- Step 1: Analyse ---
    let analyzer = Analyzer::new(host, config);
    let snapshot = match analyzer.analyze(repo_url).await {
        Ok(snapshot) => {
            info!(
                files = snapshot.files.len(),
                project_type = %snapshot.project_type,
                "[GEN] Repository analysis succeeded"
            );
            snapshot
        }
        Err(e) => {
            error!(error = %e, "[GEN][ERROR] Repository analysis failed");
            return Err(format!("Repository analysis failed: {e}"));
        }
    };

    // --- Step 2: Assemble prompt ---
    let user_prompt = prompt::build_prompt(&snapshot, config);
    debug!(prompt_chars = user_prompt.len(), "[GEN] Analysis prompt assembled");

    // --- Step 3: Complete ---
    let completion = match backend.complete(prompt::SYSTEM_PROMPT, &user_prompt).await {
        Ok(text) if !text.is_empty() => {
            info!(chars = text.len(), "[GEN] Completion received");
            text
        }
        Ok(_) => {
            error!("[GEN][ERROR] Completion API returned empty content");
            return Err("Completion API returned empty content".to_string());
        }
        Err(e) => {
            error!(error = %e, "[GEN][ERROR] README generation failed");
            return Err(format!("README generation failed: {e}"));
        }
    };

    // --- Step 4: Post-process ---
    let markdown = postprocess::post_process(&completion, &snapshot, config);
    info!(chars = markdown.len(), "[GEN] README document ready");

    Ok(GeneratedReadme {
        repo_name: snapshot.name.clone(),
        full_name: snapshot.full_name.clone(),
        project_type: snapshot.project_type.clone(),
        languages: snapshot.languages.clone(),
        markdown,
    })
}
