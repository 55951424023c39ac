#![doc = "Generation client for the CLI: implements the core `DocGenerator` trait against the Gemini `generateContent` REST endpoint."]
//
//! # Generator Integration (CLI <-> Core)
//!
//! The core pipeline only knows the [`DocGenerator`] trait. This module provides the concrete
//! [`GeminiClient`] the CLI hands to it.
//!
//! - Construct it with [`GeminiClient::new_from_env`] (reads `GEMINI_API_KEY`) or
//!   [`GeminiClient::new`] with an explicit key.
//! - One request per file; the prompt is built by [`build_prompt`] from the file record and
//!   the repository context.
//! - Any transport, status or payload problem becomes a [`GenerationError`]; the pipeline then
//!   falls back to deterministic documentation.

use async_trait::async_trait;
use repodoc_core::analyze::FileRecord;
use repodoc_core::context::RepositoryContext;
use repodoc_core::contract::{DocGenerator, GenerationError};
use repodoc_core::validate::validate_api_key;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::load_config::GeneratorSection;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Prompts carry at most this many characters of file content.
pub const MAX_PROMPT_CONTENT_CHARS: usize = 8000;
const HEAD_LINES: usize = 50;
const MAX_BODY_LINES: usize = 100;
const STRUCTURE_KEYWORDS: &[&str] = &["class ", "def ", "function ", "export ", "const ", "let ", "var "];

pub struct GeminiClient {
    client: reqwest::Client,
    settings: GeneratorSection,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: GeneratorSection, api_key: String) -> anyhow::Result<Self> {
        if !validate_api_key(&api_key) {
            anyhow::bail!("{API_KEY_ENV} does not look like a valid API key");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        tracing::info!(
            model = %settings.model,
            endpoint = %settings.endpoint,
            "Initialized GeminiClient"
        );
        Ok(Self {
            client,
            settings,
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn new_from_env(settings: GeneratorSection) -> anyhow::Result<Self> {
        match env::var(API_KEY_ENV) {
            Ok(key) => Self::new(settings, key),
            Err(e) => {
                tracing::error!(error = ?e, "{API_KEY_ENV} missing in environment");
                anyhow::bail!("{API_KEY_ENV} is not set; pass --no-docs to skip documentation")
            }
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl DocGenerator for GeminiClient {
    async fn generate(
        &self,
        record: &FileRecord,
        context: &RepositoryContext,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(record, context);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };

        tracing::debug!(path = %record.relative_path, prompt_chars = prompt.len(), "Requesting documentation");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, path = %record.relative_path, "Generation API returned error");
            return Err(GenerationError(format!("status {status}: {text}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError(format!("invalid response body: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError("response contained no text".to_string()));
        }
        Ok(text)
    }
}

/// Keep the head of long files plus lines that look like structure, capped at
/// [`MAX_PROMPT_CONTENT_CHARS`].
pub fn condense_content(content: &str) -> String {
    if content.chars().count() <= MAX_PROMPT_CONTENT_CHARS {
        return content.to_string();
    }
    let mut head = Vec::new();
    let mut body = Vec::new();
    for (i, line) in content.split('\n').enumerate() {
        if i < HEAD_LINES {
            head.push(line);
        } else if STRUCTURE_KEYWORDS
            .iter()
            .any(|k| line.to_lowercase().contains(k))
        {
            body.push(line);
            if body.len() > MAX_BODY_LINES {
                break;
            }
        }
    }
    let mut condensed = head.join("\n");
    condensed.push_str("\n... [imports and setup code] ...\n");
    condensed.push_str(&body.join("\n"));
    if condensed.chars().count() > MAX_PROMPT_CONTENT_CHARS {
        condensed = condensed.chars().take(MAX_PROMPT_CONTENT_CHARS).collect();
        condensed.push_str("\n... [truncated for analysis]");
    }
    condensed
}

pub fn build_prompt(record: &FileRecord, context: &RepositoryContext) -> String {
    let meta = &record.metadata;
    let languages: Vec<&str> = context.languages.iter().map(String::as_str).collect();
    let dependencies: Vec<&str> = context
        .dependencies
        .iter()
        .take(10)
        .map(String::as_str)
        .collect();

    format!(
        "Write concise markdown documentation for one file of a software repository.\n\
         Describe its purpose, its main functions or classes, how it fits the project, and notable dependencies.\n\n\
         **Repository Context:**\n\
         - **Total Files:** {file_count}\n\
         - **Languages:** {languages}\n\
         - **Main Directories:** {directories}\n\
         - **Dependencies:** {dependencies}\n\n\
         **File:** {path}\n\
         - **Language:** {language}\n\
         - **Type:** {file_type}\n\
         - **Size:** {size} bytes, {lines} lines\n\
         - **Imports:** {imports}\n\
         - **Definitions:** {definitions}\n\n\
         ```{language}\n{content}\n```\n",
        file_count = context.file_count,
        languages = languages.join(", "),
        directories = context.directories.join(", "),
        dependencies = dependencies.join(", "),
        path = record.relative_path,
        language = record.language,
        file_type = record.file_type,
        size = record.size_bytes,
        lines = record.line_count,
        imports = meta.imports.join(", "),
        definitions = meta.definitions.join(", "),
        content = condense_content(&record.content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(condense_content("a\nb"), "a\nb");
    }

    #[test]
    fn long_content_keeps_head_and_structure() {
        let mut content = String::new();
        for i in 0..60 {
            content.push_str(&format!("header line {i}\n"));
        }
        for i in 0..2000 {
            content.push_str(&format!("    x = {i} + filler filler filler\n"));
            if i % 100 == 0 {
                content.push_str(&format!("def handler_{i}():\n"));
            }
        }
        let condensed = condense_content(&content);
        assert!(condensed.chars().count() <= MAX_PROMPT_CONTENT_CHARS + 40);
        assert!(condensed.contains("header line 49"));
        assert!(!condensed.contains("header line 50"));
        assert!(condensed.contains("def handler_1900():"));
        assert!(!condensed.contains("filler"));
    }

    #[test]
    fn rejects_malformed_keys() {
        let err = GeminiClient::new(GeneratorSection::default(), "short".into())
            .err()
            .expect("short key rejected");
        assert!(err.to_string().contains(API_KEY_ENV));
    }
}
