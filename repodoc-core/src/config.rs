use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Files larger than this are never returned by the scanner (5 MiB).
pub const DEFAULT_SCAN_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Files larger than this are skipped by the analyzer (500 KiB).
pub const DEFAULT_ANALYZE_MAX_BYTES: u64 = 500 * 1024;

/// Limits, timeouts and fan-out for one documentation run.
///
/// Every field has a default, so an empty YAML section yields a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub scan_max_bytes: u64,
    pub analyze_max_bytes: u64,
    pub clone_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Default-branch names probed by the archive transport, in priority order.
    pub branch_candidates: Vec<String>,
    /// Analysis worker count; 0 picks the available parallelism.
    pub workers: usize,
    /// Pause between consecutive generator calls.
    pub generation_delay_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scan_max_bytes: DEFAULT_SCAN_MAX_BYTES,
            analyze_max_bytes: DEFAULT_ANALYZE_MAX_BYTES,
            clone_timeout_secs: 300,
            probe_timeout_secs: 10,
            download_timeout_secs: 300,
            branch_candidates: ["main", "master", "dev", "develop"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
            workers: 0,
            generation_delay_ms: 500,
        }
    }
}

impl AnalysisConfig {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }

    /// Resolved worker count, never zero.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    pub fn trace_loaded(&self) {
        info!(
            scan_max_bytes = self.scan_max_bytes,
            analyze_max_bytes = self.analyze_max_bytes,
            workers = self.effective_workers(),
            branches = ?self.branch_candidates,
            "Loaded AnalysisConfig"
        );
        debug!(?self, "AnalysisConfig loaded (full debug)");
    }
}
