//! Project Structure Analyzer: aggregates file records into repository-level signals.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::analyze::FileRecord;
use crate::classify::Language;

const FRONTEND: &[Language] = &[
    Language::Html,
    Language::Css,
    Language::Javascript,
    Language::Typescript,
];

const BACKEND: &[Language] = &[
    Language::Python,
    Language::Java,
    Language::Php,
    Language::Ruby,
    Language::Go,
    Language::Rust,
    Language::CSharp,
];

const DATABASE_MARKERS: &[&str] = &["firebase", "mongodb", "sql"];
const MOBILE_MARKERS: &[&str] = &["react native", "flutter"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Archetype {
    #[serde(rename = "Mobile Application")]
    Mobile,
    #[serde(rename = "Full-Stack Web Application")]
    FullStack,
    #[serde(rename = "Frontend Web Application")]
    Frontend,
    #[serde(rename = "Backend API/Service")]
    Backend,
    #[serde(rename = "Python Application")]
    PythonApp,
    #[serde(rename = "JavaScript Application")]
    JsApp,
    #[serde(rename = "Software Project")]
    Generic,
}

impl Archetype {
    pub fn label(&self) -> &'static str {
        match self {
            Archetype::Mobile => "Mobile Application",
            Archetype::FullStack => "Full-Stack Web Application",
            Archetype::Frontend => "Frontend Web Application",
            Archetype::Backend => "Backend API/Service",
            Archetype::PythonApp => "Python Application",
            Archetype::JsApp => "JavaScript Application",
            Archetype::Generic => "Software Project",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectProfile {
    pub file_type_counts: BTreeMap<Language, usize>,
    pub main_language: Option<Language>,
    pub project_archetype: Archetype,
    pub has_frontend: bool,
    pub has_backend: bool,
    pub has_database: bool,
    pub has_mobile: bool,
    pub total_files: usize,
}

/// Single pass over `records`. Ties for the main language go to whichever of the tied
/// languages appears first in record order.
pub fn profile(records: &[FileRecord]) -> ProjectProfile {
    let mut counts: BTreeMap<Language, usize> = BTreeMap::new();
    let mut first_seen: Vec<Language> = Vec::new();
    let mut has_frontend = false;
    let mut has_backend = false;
    let mut has_database = false;
    let mut has_mobile = false;

    for record in records {
        let language = record.language;
        let count = counts.entry(language).or_insert(0);
        if *count == 0 {
            first_seen.push(language);
        }
        *count += 1;

        has_frontend |= FRONTEND.contains(&language);
        has_backend |= BACKEND.contains(&language);

        if !has_database || !has_mobile {
            let lowered = record.content.to_lowercase();
            has_database |= DATABASE_MARKERS.iter().any(|m| lowered.contains(m));
            has_mobile |= MOBILE_MARKERS.iter().any(|m| lowered.contains(m));
        }
        has_mobile |= language == Language::Swift;
    }

    let mut main_language: Option<(Language, usize)> = None;
    for language in first_seen {
        let count = counts.get(&language).copied().unwrap_or(0);
        if main_language.map_or(true, |(_, best)| count > best) {
            main_language = Some((language, count));
        }
    }
    let main_language = main_language.map(|(language, _)| language);
    let project_archetype = if has_mobile {
        Archetype::Mobile
    } else if has_frontend && has_backend {
        Archetype::FullStack
    } else if has_frontend {
        Archetype::Frontend
    } else if has_backend {
        Archetype::Backend
    } else if main_language == Some(Language::Python) {
        Archetype::PythonApp
    } else if main_language == Some(Language::Javascript) {
        Archetype::JsApp
    } else {
        Archetype::Generic
    };

    ProjectProfile {
        file_type_counts: counts,
        main_language,
        project_archetype,
        has_frontend,
        has_backend,
        has_database,
        has_mobile,
        total_files: records.len(),
    }
}
