/// `load_config` module: loads the static YAML config file into typed sections.
///
/// This module is the only place where untrusted YAML is parsed.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`CliConfig`]
/// - Fill every missing section and key with its default, so an empty file is valid
/// - Reject unknown keys, so typos surface instead of silently falling back to defaults
/// - Produce clear diagnostics: any failure names the file and the underlying cause
///
/// Secrets never live in this file: the generation service key is read from the
/// `GEMINI_API_KEY` environment variable (see [`crate::generator`]).
///
/// # Accepted schema
/// ```yaml
/// analysis:
///   analyze_max_bytes: 512000
///   workers: 4
/// generator:
///   model: gemini-2.5-flash
///   temperature: 0.3
/// output:
///   path: ./report.json
/// ```
use anyhow::Result;
use repodoc_core::config::AnalysisConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub analysis: AnalysisConfig,
    pub generator: GeneratorSection,
    pub output: OutputSection,
}

/// Settings for the hosted generation service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Where to write the JSON report; stdout when absent.
    pub path: Option<PathBuf>,
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty document parses as null; treat it as "all defaults".
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty; using defaults");
        return Ok(CliConfig::default());
    }

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.analysis.trace_loaded();
    Ok(config)
}

/// [`load_config`] when a path is given, defaults otherwise.
pub fn load_optional_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given; using defaults");
            Ok(CliConfig::default())
        }
    }
}
