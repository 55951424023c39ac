///
/// This module implements the CLI interface for repodoc: command parsing, argument
/// validation, and the async [`run`] entrypoint used by `main` and by integration tests.
///
/// All business logic (acquisition, scanning, analysis, profiling) lives in the
/// [`repodoc-core`] crate. This module is strictly glue: it loads config, builds the
/// generation client, calls the pipeline and prints JSON.
///
/// ## Commands
/// - `analyze`: acquire a GitHub repository, analyse it and (unless `--no-docs`) document every file
/// - `scan`: analyse and profile a local directory, offline
/// - `validate`: check a repository URL and print `owner/repo`
///
/// [`repodoc-core`]: ../../repodoc-core/
use crate::generator::GeminiClient;
use crate::load_config::load_optional_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repodoc_core::analyze::FileRecord;
use repodoc_core::context::RepositoryContext;
use repodoc_core::contract::DocGenerator;
use repodoc_core::download::Acquirer;
use repodoc_core::pipeline::{inspect, run_pipeline};
use repodoc_core::profile::ProjectProfile;
use repodoc_core::tables::LanguageTables;
use repodoc_core::validate::{parse_repo_url, validate_repo_url};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI for repodoc: classify a repository's files and document them.
#[derive(Parser)]
#[clap(
    name = "repodoc",
    version,
    about = "Ingest a GitHub repository, classify its files and generate per-file documentation"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Acquire, analyse and document a remote repository
    Analyze {
        /// GitHub repository URL (https or ssh form)
        #[clap(long)]
        repo: String,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
        /// Skip the generation service entirely
        #[clap(long)]
        no_docs: bool,
    },
    /// Analyse and profile a local directory without network access
    Scan {
        /// Directory to scan
        dir: PathBuf,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Check a repository URL and print owner/repo
    Validate {
        #[clap(long)]
        repo: String,
    },
}

#[derive(Serialize)]
struct ScanReport {
    root: PathBuf,
    context: RepositoryContext,
    profile: ProjectProfile,
    files: Vec<FileRecord>,
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Validate { repo } => {
            let info = parse_repo_url(&repo)
                .with_context(|| format!("Invalid GitHub repository URL: {repo}"))?;
            tracing::info!(command = "validate", owner = %info.owner, repo = %info.repo, "Repository URL is valid");
            println!("{}", info.full_name);
            Ok(())
        }
        Commands::Scan { dir, config } => {
            let config = load_optional_config(config.as_deref())?;
            tracing::info!(command = "scan", dir = %dir.display(), "Starting local scan");
            let (context, files, profile) = inspect(
                &dir,
                Arc::new(config.analysis),
                Arc::new(LanguageTables::default()),
            )
            .await
            .with_context(|| format!("Scan of {} failed", dir.display()))?;
            emit_json(
                &ScanReport {
                    root: dir,
                    context,
                    profile,
                    files,
                },
                None,
            )
        }
        Commands::Analyze {
            repo,
            config,
            output,
            no_docs,
        } => {
            if !validate_repo_url(&repo) {
                anyhow::bail!("Invalid GitHub repository URL: {repo}");
            }
            let config = load_optional_config(config.as_deref())?;
            let output = output.or(config.output.path.clone());

            let generator = if no_docs {
                None
            } else {
                Some(GeminiClient::new_from_env(config.generator.clone())?)
            };
            let analysis = Arc::new(config.analysis);
            let acquirer = Acquirer::with_defaults(&analysis);

            tracing::info!(command = "analyze", repo = %repo, docs = !no_docs, "Starting analysis");
            let report = run_pipeline(
                &repo,
                analysis,
                Arc::new(LanguageTables::default()),
                &acquirer,
                generator.as_ref().map(|g| g as &dyn DocGenerator),
            )
            .await;

            match report {
                Ok(report) => {
                    tracing::info!(
                        command = "analyze",
                        files = report.files.len(),
                        archetype = %report.profile.project_archetype,
                        "Analysis complete"
                    );
                    emit_json(&report, output.as_deref())
                }
                Err(e) => {
                    tracing::error!(command = "analyze", error = %e, "Analysis failed");
                    Err(anyhow::Error::new(e).context(format!("Analysis of {repo} failed")))
                }
            }
        }
    }
}
