#![doc = "readme-forge: generate README.md documents by analysing GitHub repositories with an LLM."]

//! This crate implements a sequential analysis-and-generation pipeline:
//! a bounded walk of a remote repository tree through the GitHub REST API,
//! derived statistics (language mix, project type), prompt assembly, a
//! chat-completion request with bounded retries, and Markdown
//! post-processing of the result.
//!
//! # Usage
//! The library surface is [`generate::generate`] over the
//! [`contract::RepositoryHost`] and [`contract::CompletionBackend`] seams;
//! the CLI in [`run`] wires in the shipped GitHub and OpenRouter clients.

pub mod analyze;
pub mod completion;
pub mod config;
pub mod contract;
pub mod generate;
pub mod github;
pub mod load_config;
pub mod postprocess;
pub mod prompt;
pub mod retry;
pub mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(
    name = "readme-forge",
    version,
    about = "Generate comprehensive README.md files by analysing GitHub repositories"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a GitHub repository and generate a README.md for it
    Generate {
        /// GitHub repository URL (e.g. https://github.com/user/repo)
        repo_url: String,

        /// Output file path (default: readmes/readme-<repo>.md)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            repo_url,
            output,
            config,
        } => {
            if analyze::parse_repo_url(&repo_url).is_none() {
                anyhow::bail!("Invalid GitHub URL format: {repo_url}");
            }

            let config = load_config::load_config(config.as_deref())?;
            if config.api_key.is_empty() {
                anyhow::bail!(
                    "OpenRouter API key not found. Set the OPENROUTER_API_KEY environment variable"
                );
            }

            let host = github::GithubClient::new(&config)?;
            let backend = completion::CompletionClient::new(&config)?;

            println!("Generating README for {repo_url}...");
            match generate::generate(&config, &host, &backend, &repo_url).await {
                Ok(report) => {
                    let path = output.unwrap_or_else(|| default_output_path(&report.repo_name));
                    if let Some(parent) = path.parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent)?;
                        }
                    }
                    std::fs::write(&path, &report.markdown)?;
                    println!(
                        "README generated: {} ({})",
                        path.display(),
                        postprocess::format_file_size(report.markdown.len() as u64)
                    );
                    println!("  project type: {}", report.project_type);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] README generation failed: {e}");
                    Err(anyhow::Error::msg(e))
                }
            }
        }
    }
}

/// Default output location: `readmes/readme-<sanitized repo name>.md`.
pub fn default_output_path(repo_name: &str) -> PathBuf {
    PathBuf::from("readmes").join(format!(
        "readme-{}.md",
        postprocess::sanitize_file_name(repo_name)
    ))
}
