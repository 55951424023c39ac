//! # download: Repository Acquirer
//!
//! Obtains a local copy of a remote repository inside a run-owned scratch directory.
//!
//! ## Transports
//! - [`GitCloneTransport`]: `git clone --depth 1` with a hard timeout. The child process is
//!   killed when the timeout fires.
//! - [`ArchiveTransport`]: probes candidate default branches on an [`ArchiveHost`], downloads
//!   the branch zip, extracts it into a private staging directory and moves the repository
//!   root into place.
//!
//! ## Fallback chain
//! [`Acquirer`] tries its transports in order and stops at the first success. Before each
//! attempt, and after the last failure, the target path is cleared so a half-written tree
//! is never presented as a result. When every transport fails the caller gets
//! [`AcquisitionError::Exhausted`] listing each cause.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::AnalysisConfig;
use crate::contract::{AcquisitionError, ArchiveHost, Transport};
use crate::validate::repo_name;

/// Strip a trailing `/` and a `.git` suffix.
pub fn normalize_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim().trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

pub fn archive_url(base_url: &str, branch: &str) -> String {
    format!("{base_url}/archive/refs/heads/{branch}.zip")
}

/// First candidate whose archive exists; the first candidate when none answer.
pub async fn select_branch(host: &dyn ArchiveHost, base_url: &str, candidates: &[String]) -> String {
    for branch in candidates {
        let url = archive_url(base_url, branch);
        if host.exists(&url).await {
            info!(branch = %branch, url = %url, "Selected archive branch");
            return branch.clone();
        }
        debug!(branch = %branch, url = %url, "Branch archive not found");
    }
    let fallback = candidates
        .first()
        .cloned()
        .unwrap_or_else(|| "main".to_string());
    warn!(branch = %fallback, "No candidate branch answered; using default");
    fallback
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Ordered fallback chain of transports.
pub struct Acquirer {
    transports: Vec<Box<dyn Transport>>,
}

impl Acquirer {
    pub fn new(transports: Vec<Box<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// git clone first, then the archive download against the live host.
    pub fn with_defaults(config: &AnalysisConfig) -> Self {
        Self::new(vec![
            Box::new(GitCloneTransport::new(config.clone_timeout())),
            Box::new(ArchiveTransport::new(
                HttpArchiveHost::new(config.probe_timeout(), config.download_timeout()),
                config.branch_candidates.clone(),
            )),
        ])
    }

    /// Fetch `repo_url` into `scratch/<repo name>` and return that path.
    pub async fn acquire(&self, repo_url: &str, scratch: &Path) -> Result<PathBuf, AcquisitionError> {
        if repo_url.trim().is_empty() {
            return Err(AcquisitionError::InvalidUrl(repo_url.to_string()));
        }
        let target = scratch.join(repo_name(repo_url));
        // Everything below removes `target`; it must be a direct child of `scratch`.
        let confined = matches!(
            target.components().next_back(),
            Some(Component::Normal(_))
        ) && target.parent() == Some(scratch);
        if !confined {
            error!(repo_url = %repo_url, target = %target.display(), "Checkout path escapes scratch directory");
            return Err(AcquisitionError::InvalidUrl(repo_url.to_string()));
        }
        let mut attempts = Vec::new();

        for transport in &self.transports {
            remove_if_exists(&target)?;
            info!(
                transport = transport.name(),
                repo_url = %repo_url,
                target = %target.display(),
                "Attempting acquisition"
            );
            match transport.fetch(repo_url, &target).await {
                Ok(()) if target.is_dir() => {
                    info!(transport = transport.name(), path = %target.display(), "Repository acquired");
                    return Ok(target);
                }
                Ok(()) => {
                    warn!(transport = transport.name(), "Transport reported success but produced no directory");
                    attempts.push(format!("{}: no repository directory produced", transport.name()));
                }
                Err(e) => {
                    warn!(transport = transport.name(), error = %e, "Transport failed; trying next");
                    attempts.push(format!("{}: {e}", transport.name()));
                }
            }
        }

        if let Err(e) = remove_if_exists(&target) {
            warn!(path = %target.display(), error = ?e, "Failed to clear partial repository");
        }
        error!(repo_url = %repo_url, attempts = ?attempts, "All transports failed");
        Err(AcquisitionError::Exhausted { attempts })
    }
}

/// Shallow `git clone`.
pub struct GitCloneTransport {
    program: String,
    timeout: Duration,
}

impl GitCloneTransport {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("git", timeout)
    }

    /// Use a different executable in place of `git`.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transport for GitCloneTransport {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn fetch(&self, repo_url: &str, target: &Path) -> Result<(), AcquisitionError> {
        let mut command = Command::new(&self.program);
        command
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(repo_url)
            .arg(target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(AcquisitionError::Clone(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) => {
                return Err(AcquisitionError::Clone(format!(
                    "failed to launch {}: {e}",
                    self.program
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or("").trim().to_string();
            return Err(AcquisitionError::Clone(format!(
                "{} exited with {}: {}",
                self.program, output.status, reason
            )));
        }
        debug!(repo_url = %repo_url, path = %target.display(), "git clone finished");
        Ok(())
    }
}

/// Archive host reached over HTTP(S).
pub struct HttpArchiveHost {
    client: reqwest::Client,
    probe_timeout: Duration,
    download_timeout: Duration,
}

impl HttpArchiveHost {
    pub fn new(probe_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            probe_timeout,
            download_timeout,
        }
    }
}

#[async_trait]
impl ArchiveHost for HttpArchiveHost {
    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.probe_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Archive probe failed");
                false
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AcquisitionError> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| AcquisitionError::Download(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| AcquisitionError::Download(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Branch archive download with extraction.
pub struct ArchiveTransport<H> {
    host: H,
    branches: Vec<String>,
}

impl<H: ArchiveHost> ArchiveTransport<H> {
    pub fn new(host: H, branches: Vec<String>) -> Self {
        Self { host, branches }
    }
}

/// Removes the wrapped path (file or directory) when dropped.
struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        let result = if self.0.is_dir() {
            fs::remove_dir_all(&self.0)
        } else {
            fs::remove_file(&self.0)
        };
        if let Err(e) = result {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.0.display(), error = ?e, "Failed to clean up");
            }
        }
    }
}

#[async_trait]
impl<H: ArchiveHost + 'static> Transport for ArchiveTransport<H> {
    fn name(&self) -> &'static str {
        "archive"
    }

    async fn fetch(&self, repo_url: &str, target: &Path) -> Result<(), AcquisitionError> {
        let base_url = normalize_url(repo_url);
        let branch = select_branch(&self.host, &base_url, &self.branches).await;
        let url = archive_url(&base_url, &branch);

        info!(url = %url, "Downloading repository archive");
        let bytes = self.host.download(&url).await?;

        let parent = target
            .parent()
            .ok_or_else(|| AcquisitionError::Extract(format!("{} has no parent", target.display())))?;
        let name = repo_name(repo_url);
        // Branch names may contain `/`; both the archive file and the root are flat names.
        let flat_branch = branch.replace('/', "-");
        let archive_path = parent.join(format!("{name}-{flat_branch}.zip"));
        let _archive_guard = RemoveOnDrop(archive_path.clone());
        tokio::fs::write(&archive_path, &bytes).await?;
        debug!(path = %archive_path.display(), bytes = bytes.len(), "Archive saved");

        let expected_root = format!("{name}-{flat_branch}");
        let target = target.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_archive(&archive_path, &target, &expected_root))
            .await
            .map_err(|e| AcquisitionError::Extract(format!("extraction task failed: {e}")))?
    }
}

/// Extract `archive` and move the repository root to `target`.
///
/// Extraction happens in a fresh staging directory next to `target`, so every top-level
/// entry in it is new. The root is the directory named `expected_root` when present,
/// otherwise the only directory, otherwise (flat archive) the staging directory itself;
/// several unmatched directories resolve to the first in sorted order.
pub fn unpack_archive(archive: &Path, target: &Path, expected_root: &str) -> Result<(), AcquisitionError> {
    let parent = target
        .parent()
        .ok_or_else(|| AcquisitionError::Extract(format!("{} has no parent", target.display())))?;
    let staging = parent.join(format!(".extract-{}", uuid::Uuid::new_v4()));
    let _staging_guard = RemoveOnDrop(staging.clone());
    fs::create_dir_all(&staging)?;

    extract_zip(archive, &staging)?;
    let root = locate_root(&staging, expected_root)?;
    fs::rename(&root, target)?;
    info!(from = %root.display(), to = %target.display(), "Archive extracted");
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), AcquisitionError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| AcquisitionError::Extract(e.to_string()))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| AcquisitionError::Extract(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = %entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let out_path = dest.join(relative);
        if entry.name().ends_with('/') {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(dir) = out_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

fn locate_root(staging: &Path, expected_root: &str) -> Result<PathBuf, AcquisitionError> {
    let mut dirs = Vec::new();
    let mut has_files = false;
    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        } else {
            has_files = true;
        }
    }
    dirs.sort();

    if let Some(dir) = dirs
        .iter()
        .find(|d| d.file_name() == Some(OsStr::new(expected_root)))
    {
        return Ok(dir.clone());
    }
    match (dirs.as_slice(), has_files) {
        ([], false) => Err(AcquisitionError::Extract("archive is empty".to_string())),
        ([only], false) => Ok(only.clone()),
        ([first, ..], false) => {
            warn!(
                chosen = %first.display(),
                candidates = dirs.len(),
                "Several top-level directories in archive; picking the first"
            );
            Ok(first.clone())
        }
        (_, true) => Ok(staging.to_path_buf()),
    }
}
