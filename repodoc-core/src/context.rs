//! Repository-wide context handed to the documentation generator.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyze::relative_path;
use crate::classify::extension_of;
use crate::tables::LanguageTables;

pub const MAX_DIRECTORIES: usize = 20;
const DEPENDENCY_HEAD_BYTES: u64 = 2048;
const DEPENDENCY_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryContext {
    pub file_count: usize,
    /// Lowercase extensions present in the scan, without the dot.
    pub languages: BTreeSet<String>,
    pub directories: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Build the context from raw scan results (`files` are absolute paths under `root`).
pub fn build_context(root: &Path, files: &[PathBuf], tables: &LanguageTables) -> RepositoryContext {
    let mut languages = BTreeSet::new();
    let mut directories = BTreeSet::new();
    let mut dependencies = Vec::new();

    for path in files {
        let extension = extension_of(path);
        if !extension.is_empty() {
            languages.insert(extension);
        }

        let rel = relative_path(path, root);
        if let Some((dir, _)) = rel.rsplit_once('/') {
            directories.insert(dir.to_string());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if tables.dependency_manifests.iter().any(|m| *m == name) {
            dependencies.push(dependency_excerpt(path, &name));
        }
    }

    debug!(
        manifests = dependencies.len(),
        directories = directories.len(),
        "Built repository context"
    );

    RepositoryContext {
        file_count: files.len(),
        languages,
        directories: directories.into_iter().take(MAX_DIRECTORIES).collect(),
        dependencies,
    }
}

fn dependency_excerpt(path: &Path, name: &str) -> String {
    let mut head = Vec::new();
    let read = File::open(path).and_then(|f| f.take(DEPENDENCY_HEAD_BYTES).read_to_end(&mut head));
    match read {
        Ok(_) => {
            let text = String::from_utf8_lossy(&head);
            let excerpt: String = text.chars().take(DEPENDENCY_EXCERPT_CHARS).collect();
            format!("{name}: {excerpt}...")
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not read dependency manifest");
            name.to_string()
        }
    }
}
