//! Deterministic per-file documentation used when the generator fails.

use std::fmt::Write;

use crate::analyze::FileRecord;

const MAX_IMPORTS: usize = 10;
const MAX_DEFINITIONS: usize = 15;
const PREVIEW_LINES: usize = 10;

pub fn fallback_documentation(record: &FileRecord) -> String {
    let meta = &record.metadata;
    let mut doc = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(doc, "## {}\n", record.relative_path);
    let _ = writeln!(doc, "### File Overview");
    let _ = writeln!(doc, "- **Language:** {}", record.language);
    let _ = writeln!(doc, "- **Type:** {}", record.file_type);
    let _ = writeln!(doc, "- **Size:** {} bytes", record.size_bytes);
    let _ = writeln!(doc, "- **Lines:** {}\n", record.line_count);

    let _ = writeln!(doc, "### File Statistics");
    let _ = writeln!(doc, "- **Comment Lines:** {}", meta.comment_line_count);
    let _ = writeln!(doc, "- **Blank Lines:** {}\n", meta.blank_line_count);

    let _ = writeln!(doc, "### Dependencies");
    if meta.imports.is_empty() {
        let _ = writeln!(doc, "- No imports detected");
    } else {
        let _ = writeln!(doc, "**Import Statements:**");
        for import in meta.imports.iter().take(MAX_IMPORTS) {
            let _ = writeln!(doc, "- `{import}`");
        }
    }

    let _ = writeln!(doc, "\n### Code Structure");
    if meta.definitions.is_empty() {
        let _ = writeln!(doc, "- No function or class definitions detected");
    } else {
        let _ = writeln!(doc, "**Functions/Classes:**");
        for definition in meta.definitions.iter().take(MAX_DEFINITIONS) {
            let _ = writeln!(doc, "- `{definition}`");
        }
    }

    let preview: Vec<&str> = record.content.lines().take(PREVIEW_LINES).collect();
    let _ = writeln!(doc, "\n### Code Preview");
    let _ = writeln!(doc, "```{}", record.language);
    let _ = writeln!(doc, "{}", preview.join("\n"));
    let _ = writeln!(doc, "```");
    if record.line_count > PREVIEW_LINES {
        let _ = writeln!(doc, "\n*... and {} more lines*", record.line_count - PREVIEW_LINES);
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FileType, Language};
    use crate::decode::TextEncoding;
    use crate::metadata::FileMetadata;

    fn record(content: &str, line_count: usize, metadata: FileMetadata) -> FileRecord {
        FileRecord {
            absolute_path: "/tmp/x/app.py".into(),
            relative_path: "app.py".into(),
            content: content.into(),
            encoding: TextEncoding::Utf8,
            extension: "py".into(),
            file_type: FileType::Source,
            language: Language::Python,
            size_bytes: content.len() as u64,
            line_count,
            metadata,
        }
    }

    #[test]
    fn lists_imports_and_definitions() {
        let meta = FileMetadata {
            imports: vec!["import os".into()],
            definitions: vec!["def main".into()],
            ..FileMetadata::default()
        };
        let doc = fallback_documentation(&record("import os\ndef main():\n    pass\n", 3, meta));
        assert!(doc.starts_with("## app.py\n"));
        assert!(doc.contains("- **Language:** python"));
        assert!(doc.contains("- `import os`"));
        assert!(doc.contains("- `def main`"));
        assert!(doc.contains("```python\nimport os\ndef main():\n    pass\n```"));
        assert!(!doc.contains("more lines"));
    }

    #[test]
    fn notes_missing_structure_and_truncated_preview() {
        let content: String = (0..25).map(|i| format!("line {i}\n")).collect();
        let doc = fallback_documentation(&record(&content, 25, FileMetadata::default()));
        assert!(doc.contains("- No imports detected"));
        assert!(doc.contains("- No function or class definitions detected"));
        assert!(doc.contains("line 9\n```"));
        assert!(doc.contains("*... and 15 more lines*"));
    }
}
