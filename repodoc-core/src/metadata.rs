//! Lightweight structural signals derived from decoded text.

use serde::{Deserialize, Serialize};

use crate::tables::LanguageTables;

pub const MAX_FIRST_LINES: usize = 5;
pub const MAX_IMPORTS: usize = 10;
pub const MAX_DEFINITIONS: usize = 20;
/// Only this many leading lines are searched for imports.
pub const IMPORT_SCAN_LINES: usize = 50;
/// Truncated definitions longer than this (in chars) are dropped.
pub const MAX_DEFINITION_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub first_lines: Vec<String>,
    pub blank_line_count: usize,
    pub comment_line_count: usize,
    pub imports: Vec<String>,
    pub definitions: Vec<String>,
}

/// Split on every Unicode line boundary: `\n`, `\r\n`, lone `\r`, vertical tab, form feed,
/// the file/group/record separators, NEL and the line/paragraph separators.
/// A trailing line break does not open a new line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut start = 0;
    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                end = j + 1;
            }
        }
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Never fails: unknown extensions simply produce empty comment/import/definition results.
pub fn extract(text: &str, extension: &str, tables: &LanguageTables) -> FileMetadata {
    extract_lines(&split_lines(text), extension, tables)
}

pub(crate) fn extract_lines(lines: &[&str], extension: &str, tables: &LanguageTables) -> FileMetadata {
    let comment_markers = tables.comment_markers(extension);
    let import_keywords = tables.import_keywords(extension);
    let definition_keywords = tables.definition_keywords(extension);

    let first_lines = lines
        .iter()
        .take(MAX_FIRST_LINES)
        .map(|l| l.to_string())
        .collect();

    let mut blank_line_count = 0;
    let mut comment_line_count = 0;
    for line in lines {
        let stripped = line.trim();
        if stripped.is_empty() {
            blank_line_count += 1;
        } else if comment_markers.iter().any(|m| stripped.starts_with(m)) {
            comment_line_count += 1;
        }
    }

    let imports = lines
        .iter()
        .take(IMPORT_SCAN_LINES)
        .map(|l| l.trim())
        .filter(|l| import_keywords.iter().any(|k| l.starts_with(k)))
        .take(MAX_IMPORTS)
        .map(str::to_owned)
        .collect();

    let definitions = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| definition_keywords.iter().any(|k| l.contains(k)))
        .map(truncate_definition)
        .filter(|d| d.chars().count() <= MAX_DEFINITION_CHARS)
        .take(MAX_DEFINITIONS)
        .map(str::to_owned)
        .collect();

    FileMetadata {
        first_lines,
        blank_line_count,
        comment_line_count,
        imports,
        definitions,
    }
}

// Cut at the first `{`, then at the first `(` of what remains.
fn truncate_definition(line: &str) -> &str {
    let line = line.split('{').next().unwrap_or(line).trim();
    line.split('(').next().unwrap_or(line).trim()
}
