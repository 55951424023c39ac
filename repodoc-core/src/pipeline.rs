//! High-level pipeline: acquire → scan → context → analyze → profile → document.
//!
//! Every run owns a fresh scratch directory (a [`tempfile::TempDir`]) that is removed when
//! [`run_pipeline`] returns, fails, panics or is cancelled. Only acquisition failure and an
//! empty result after scanning or analysis end a run; everything else is contained per file.
//!
//! # Navigation
//! - Main entrypoint: [`run_pipeline`]
//! - Offline entrypoint over an existing directory: [`inspect`]
//! - Output: [`PipelineReport`], [`FileDocument`]

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use crate::analyze::{analyze_all, FileRecord};
use crate::config::AnalysisConfig;
use crate::context::{build_context, RepositoryContext};
use crate::contract::{DocGenerator, PipelineError};
use crate::download::Acquirer;
use crate::fallback::fallback_documentation;
use crate::profile::{profile, ProjectProfile};
use crate::scan::scan;
use crate::tables::LanguageTables;
use crate::validate::repo_name;

/// Generated documents shorter than this (non-whitespace chars) count as failures.
pub const MIN_DOCUMENT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDocument {
    pub relative_path: String,
    pub markdown: String,
    /// `false` when the fallback documentation was used.
    pub generated: bool,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub repo_name: String,
    pub context: RepositoryContext,
    pub profile: ProjectProfile,
    pub files: Vec<FileRecord>,
    pub documents: Vec<FileDocument>,
}

/// Scan, analyse and profile an existing directory.
///
/// Returns [`PipelineError::NoFilesDiscovered`] / [`PipelineError::NoFilesAnalyzed`] on the
/// same conditions as a full run.
pub async fn inspect(
    root: &Path,
    config: Arc<AnalysisConfig>,
    tables: Arc<LanguageTables>,
) -> Result<(RepositoryContext, Vec<FileRecord>, ProjectProfile), PipelineError> {
    let files = scan(root, config.scan_max_bytes, &tables);
    if files.is_empty() {
        error!(root = %root.display(), "[PIPELINE] No supported files discovered");
        return Err(PipelineError::NoFilesDiscovered);
    }
    let discovered = files.len();
    let context = build_context(root, &files, &tables);

    let records = analyze_all(files, root, config, tables).await;
    if records.is_empty() {
        error!(discovered, "[PIPELINE] No file could be analysed");
        return Err(PipelineError::NoFilesAnalyzed { discovered });
    }

    let profile = profile(&records);
    info!(
        archetype = %profile.project_archetype,
        main_language = ?profile.main_language,
        total_files = profile.total_files,
        "[PIPELINE] Project profiled"
    );
    Ok((context, records, profile))
}

/// Run the whole pipeline for `repo_url`. `generator = None` skips documentation.
pub async fn run_pipeline(
    repo_url: &str,
    config: Arc<AnalysisConfig>,
    tables: Arc<LanguageTables>,
    acquirer: &Acquirer,
    generator: Option<&dyn DocGenerator>,
) -> Result<PipelineReport, PipelineError> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("pipeline", %run_id, repo_url = %repo_url);
    async move {
        info!("[PIPELINE] Starting run");
        let scratch = tempfile::Builder::new()
            .prefix("repodoc-")
            .tempdir()
            .map_err(PipelineError::Scratch)?;

        let root = acquirer.acquire(repo_url, scratch.path()).await?;
        let (context, files, profile) = inspect(&root, Arc::clone(&config), tables).await?;

        let documents = match generator {
            Some(generator) => document_all(generator, &files, &context, &config).await,
            None => Vec::new(),
        };

        info!(
            files = files.len(),
            documents = documents.len(),
            "[PIPELINE] Run complete"
        );
        // `scratch` is dropped here; nothing in the report borrows from it.
        Ok(PipelineReport {
            repo_name: repo_name(repo_url),
            context,
            profile,
            files,
            documents,
        })
    }
    .instrument(span)
    .await
}

/// One generator call per record, in order, pausing between calls.
pub async fn document_all(
    generator: &dyn DocGenerator,
    records: &[FileRecord],
    context: &RepositoryContext,
    config: &AnalysisConfig,
) -> Vec<FileDocument> {
    let mut documents = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if index > 0 && !config.generation_delay().is_zero() {
            tokio::time::sleep(config.generation_delay()).await;
        }
        let document = match generator.generate(record, context).await {
            Ok(markdown) if is_substantial(&markdown) => FileDocument {
                relative_path: record.relative_path.clone(),
                markdown,
                generated: true,
            },
            Ok(_) => {
                warn!(path = %record.relative_path, "Generator returned an empty document; using fallback");
                fallback(record)
            }
            Err(e) => {
                warn!(path = %record.relative_path, error = %e, "Generation failed; using fallback");
                fallback(record)
            }
        };
        documents.push(document);
    }
    documents
}

fn is_substantial(markdown: &str) -> bool {
    markdown.chars().filter(|c| !c.is_whitespace()).count() >= MIN_DOCUMENT_CHARS
}

fn fallback(record: &FileRecord) -> FileDocument {
    FileDocument {
        relative_path: record.relative_path.clone(),
        markdown: fallback_documentation(record),
        generated: false,
    }
}
