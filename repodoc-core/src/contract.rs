//! # contract: collaborator interfaces and error taxonomy
//!
//! This module defines the seams of the pipeline and the errors that cross them.
//!
//! ## Interfaces
//! - [`Transport`]: one way of obtaining a local copy of a repository (git clone, archive download).
//!   The [`crate::download::Acquirer`] tries an ordered list of them.
//! - [`ArchiveHost`]: the network side of the archive transport (existence probe + download).
//! - [`DocGenerator`]: the external text-generation service that describes one file.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; mocks are exported behind the `test-export-mocks`
//!   feature so integration tests and the CLI crate can drive the pipeline offline.
//!
//! ## Error containment
//! Only [`AcquisitionError`] and the "nothing to analyse" cases of [`PipelineError`] end a run.
//! Decode and analysis failures stay at file granularity, and generation failures are
//! replaced by fallback documentation.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::analyze::FileRecord;
use crate::context::RepositoryContext;

/// Obtains a repository at `repo_url` into `target`, which must not exist yet.
///
/// Implementations leave nothing presentable at `target` when they fail.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs and in [`AcquisitionError::Exhausted`].
    fn name(&self) -> &'static str;

    async fn fetch(&self, repo_url: &str, target: &Path) -> Result<(), AcquisitionError>;
}

/// Remote host serving branch archives.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArchiveHost: Send + Sync {
    /// Lightweight existence check (HEAD request). Any failure reads as `false`.
    async fn exists(&self, url: &str) -> bool;

    /// Download the full archive body.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AcquisitionError>;
}

/// External generation service: describes one file given repository-wide context.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn generate(
        &self,
        record: &FileRecord,
        context: &RepositoryContext,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("invalid repository url: {0}")]
    InvalidUrl(String),

    #[error("git clone failed: {0}")]
    Clone(String),

    #[error("archive download failed: {0}")]
    Download(String),

    #[error("archive host answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("archive extraction failed: {0}")]
    Extract(String),

    #[error("filesystem error during acquisition: {0}")]
    Io(#[from] std::io::Error),

    #[error("no transport could fetch the repository: {}", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

/// Why a file yielded no text. Both variants mean "skip this file".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("file is empty or whitespace only")]
    NoContent,

    #[error("no supported encoding could decode the file")]
    Undecodable,
}

/// Per-file analysis failure. Logged and contained by the analyzer, never returned by it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file exceeds analysis ceiling: {size} > {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Decode(#[from] DecodeFailure),

    #[error("analysis panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
#[error("generation failed: {0}")]
pub struct GenerationError(pub String);

/// Run-fatal outcomes of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("could not create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("no supported files found in the repository")]
    NoFilesDiscovered,

    #[error("none of the {discovered} discovered files could be analysed")]
    NoFilesAnalyzed { discovered: usize },
}
