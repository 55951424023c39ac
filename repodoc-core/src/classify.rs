//! Filename-only classification into a coarse file type and a language.
//!
//! No content is inspected: a `.h` file is always C, whatever it really contains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::tables::LanguageTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Web,
    Stylesheet,
    Script,
    Source,
    Header,
    Data,
    Documentation,
    Text,
    Database,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Web => "web",
            FileType::Stylesheet => "stylesheet",
            FileType::Script => "script",
            FileType::Source => "source",
            FileType::Header => "header",
            FileType::Data => "data",
            FileType::Documentation => "documentation",
            FileType::Text => "text",
            FileType::Database => "database",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Html,
    Css,
    Scss,
    Sass,
    Less,
    Java,
    Cpp,
    C,
    CSharp,
    Php,
    Ruby,
    Go,
    Rust,
    Swift,
    Kotlin,
    Scala,
    Bash,
    PowerShell,
    Sql,
    Json,
    Xml,
    Yaml,
    Markdown,
    RestructuredText,
    R,
    Matlab,
    Dockerfile,
    Makefile,
    Text,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Scss => "scss",
            Language::Sass => "sass",
            Language::Less => "less",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Bash => "bash",
            Language::PowerShell => "powershell",
            Language::Sql => "sql",
            Language::Json => "json",
            Language::Xml => "xml",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::RestructuredText => "restructuredtext",
            Language::R => "r",
            Language::Matlab => "matlab",
            Language::Dockerfile => "dockerfile",
            Language::Makefile => "makefile",
            Language::Text => "text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase extension of `path` without the dot, or `""` when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Classify a file by name. Total: unknown names yield `(Unknown, Text)`.
pub fn classify(file_name: &str, tables: &LanguageTables) -> (FileType, Language) {
    let path = Path::new(file_name);
    let extension = extension_of(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let file_type = tables.file_type(&extension).unwrap_or(FileType::Unknown);
    let language = tables
        .language(&extension)
        .or_else(|| tables.name_languages.get(name.as_str()).copied())
        .unwrap_or(Language::Text);
    (file_type, language)
}
