//! # analyze: per-file analysis into [`FileRecord`]s
//!
//! [`analyze`] orchestrates size check → decode → classify → metadata for one file and
//! never fails: every problem (I/O, oversize, undecodable, even a panic) turns into `None`
//! plus a log event. [`analyze_all`] fans a batch out over blocking worker tasks and
//! returns the surviving records sorted by relative path.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classify::{classify, extension_of, FileType, Language};
use crate::config::AnalysisConfig;
use crate::contract::AnalysisError;
use crate::decode::{decode, TextEncoding};
use crate::metadata::{extract_lines, split_lines, FileMetadata};
use crate::tables::LanguageTables;

/// Immutable result of analysing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// `/`-separated path relative to the repository root.
    pub relative_path: String,
    #[serde(skip_serializing)]
    pub content: String,
    pub encoding: TextEncoding,
    pub extension: String,
    pub file_type: FileType,
    pub language: Language,
    pub size_bytes: u64,
    pub line_count: usize,
    pub metadata: FileMetadata,
}

impl FileRecord {
    /// Final path component, used for display.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Analyse one file. Returns `None` for anything that should be skipped.
pub fn analyze(
    path: &Path,
    root: &Path,
    config: &AnalysisConfig,
    tables: &LanguageTables,
) -> Option<FileRecord> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| try_analyze(path, root, config, tables)))
        .unwrap_or_else(|payload| Err(AnalysisError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(record) => Some(record),
        Err(AnalysisError::Decode(reason)) => {
            debug!(path = %path.display(), reason = %reason, "Skipping file without usable text");
            None
        }
        Err(AnalysisError::TooLarge { size, limit }) => {
            debug!(path = %path.display(), size, limit, "Skipping file above analysis ceiling");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "File analysis failed; skipping");
            None
        }
    }
}

fn try_analyze(
    path: &Path,
    root: &Path,
    config: &AnalysisConfig,
    tables: &LanguageTables,
) -> Result<FileRecord, AnalysisError> {
    let limit = config.analyze_max_bytes;
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(AnalysisError::TooLarge { size, limit });
    }

    let bytes = std::fs::read(path)?;
    // The file may have grown between stat and read.
    let size_bytes = bytes.len() as u64;
    if size_bytes > limit {
        return Err(AnalysisError::TooLarge {
            size: size_bytes,
            limit,
        });
    }

    let decoded = decode(&bytes)?;
    let relative_path = relative_path(path, root);
    let (file_type, language) = classify(&relative_path, tables);
    let extension = extension_of(path);

    let lines = split_lines(&decoded.text);
    let line_count = lines.len();
    let metadata = extract_lines(&lines, &extension, tables);

    Ok(FileRecord {
        absolute_path: path.to_path_buf(),
        relative_path,
        encoding: decoded.encoding,
        extension,
        file_type,
        language,
        size_bytes,
        line_count,
        metadata,
        content: decoded.text,
    })
}

/// `path` relative to `root`, joined with `/` on every platform.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Analyse `paths` with at most `config.effective_workers()` files in flight.
///
/// The result is sorted by `relative_path`, independent of completion order.
pub async fn analyze_all(
    paths: Vec<PathBuf>,
    root: &Path,
    config: Arc<AnalysisConfig>,
    tables: Arc<LanguageTables>,
) -> Vec<FileRecord> {
    let workers = config.effective_workers();
    let discovered = paths.len();
    let root = Arc::new(root.to_path_buf());
    info!(files = discovered, workers, "Analysing files");

    let mut records: Vec<FileRecord> = stream::iter(paths)
        .map(|path| {
            let root = Arc::clone(&root);
            let config = Arc::clone(&config);
            let tables = Arc::clone(&tables);
            tokio::task::spawn_blocking(move || analyze(&path, &root, &config, &tables))
        })
        .buffer_unordered(workers)
        .filter_map(|joined| async move {
            match joined {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Analysis task did not complete");
                    None
                }
            }
        })
        .collect()
        .await;

    records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(
        analysed = records.len(),
        skipped = discovered - records.len(),
        "Analysis finished"
    );
    records
}
