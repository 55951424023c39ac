//! Repository Scanner: recursive enumeration with denylist, size and extension rules.
//!
//! Never fails. Unreadable entries, broken links and oversized files are skipped with a
//! debug event; the result is sorted so repeated scans of the same tree agree. Symlinked
//! directories are never followed; a symlinked file is kept only when it resolves to a
//! regular file inside the root.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::classify::extension_of;
use crate::tables::LanguageTables;

/// Return every accepted file under `root`, sorted lexicographically.
pub fn scan(root: &Path, max_bytes: u64, tables: &LanguageTables) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_denied(entry, tables));

    let canonical_root = root.canonicalize().ok();
    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            if !links_to_file_inside(path, canonical_root.as_deref()) {
                debug!(path = %path.display(), "Skipping symlink that does not resolve to a file inside the root");
                continue;
            }
        } else if !file_type.is_file() {
            continue;
        }
        if denied_below_root(path, root, tables) || !is_supported(path, tables) {
            continue;
        }
        // Follows symlinks, so a link is measured by its target.
        match fs::metadata(path) {
            Ok(meta) if meta.len() > max_bytes => {
                debug!(path = %path.display(), size = meta.len(), "Skipping file above scan ceiling");
            }
            Ok(_) => files.push(path.to_path_buf()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping file with unreadable metadata");
            }
        }
    }

    files.sort();
    info!(root = %root.display(), files = files.len(), "Scan complete");
    files
}

/// Symlinked files are kept only when their target is a regular file under the root.
fn links_to_file_inside(link: &Path, canonical_root: Option<&Path>) -> bool {
    let Some(root) = canonical_root else {
        return false;
    };
    match link.canonicalize() {
        Ok(target) => target.starts_with(root) && target.is_file(),
        Err(e) => {
            debug!(path = %link.display(), error = %e, "Broken symlink");
            false
        }
    }
}

fn is_denied(entry: &DirEntry, tables: &LanguageTables) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| tables.is_denied(name))
}

// filter_entry already prunes denied directories; this also covers segments that
// only appear in the path relative to the root.
fn denied_below_root(path: &Path, root: &Path, tables: &LanguageTables) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| c.as_os_str().to_str().is_some_and(|s| tables.is_denied(s)))
}

/// Supported extension, or no extension and a conventional name.
pub fn is_supported(path: &Path, tables: &LanguageTables) -> bool {
    let extension = extension_of(path);
    if !extension.is_empty() {
        return tables.supported_extensions.contains(extension.as_str());
    }
    if path.extension().is_some() {
        // Trailing dot, e.g. "notes."
        return false;
    }
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .is_some_and(|name| tables.extensionless_names.contains(name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, body: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn accepts_supported_and_conventional_names_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/b.rs", b"fn b() {}");
        touch(root, "src/a.py", b"x = 1");
        touch(root, "README", b"hello");
        touch(root, "Makefile", b"all:");
        touch(root, "image.png", b"\x89PNG");
        touch(root, "NOTES", b"not conventional");

        let files = scan(root, u64::MAX, &LanguageTables::default());
        assert_eq!(
            relative(root, &files),
            vec!["Makefile", "README", "src/a.py", "src/b.rs"]
        );
    }

    #[test]
    fn denylisted_segments_are_excluded_at_any_depth() {
        let tables = LanguageTables::default();
        for denied in ["node_modules", ".git", "build", "venv", ".tox", ".DS_Store"] {
            let dir = tempdir().unwrap();
            let root = dir.path();
            touch(root, &format!("{denied}/top.js"), b"x");
            touch(root, &format!("a/{denied}/mid.js"), b"x");
            touch(root, &format!("a/b/c/{denied}/deep.js"), b"x");
            touch(root, "a/b/c/kept.js", b"x");

            let files = scan(root, u64::MAX, &tables);
            assert_eq!(relative(root, &files), vec!["a/b/c/kept.js"], "{denied}");
        }
    }

    #[test]
    fn only_dependency_and_vcs_dirs_yields_nothing() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "node_modules/lib.js", b"module.exports = 1;");
        touch(dir.path(), ".git/HEAD", b"ref: refs/heads/main");
        assert!(scan(dir.path(), u64::MAX, &LanguageTables::default()).is_empty());
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "ok.txt", &[b'a'; 16]);
        touch(dir.path(), "big.txt", &[b'a'; 17]);
        let files = scan(dir.path(), 16, &LanguageTables::default());
        assert_eq!(relative(dir.path(), &files), vec!["ok.txt"]);
    }

    #[test]
    fn missing_root_is_empty_not_an_error() {
        let dir = tempdir().unwrap();
        let files = scan(&dir.path().join("absent"), u64::MAX, &LanguageTables::default());
        assert!(files.is_empty());
    }

    #[test]
    fn trailing_dot_is_not_conventional() {
        let tables = LanguageTables::default();
        assert!(!is_supported(Path::new("readme."), &tables));
        assert!(is_supported(Path::new("LICENSE"), &tables));
        assert!(is_supported(Path::new("App.TSX"), &tables));
    }
}
