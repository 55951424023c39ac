//! Boundary checks on user-supplied repository URLs, credentials and file names.
//!
//! These are shape checks only: a valid URL may still point at a repository that does
//! not exist, and a valid key may be revoked.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const SEGMENT: &str = r"[A-Za-z0-9._-]+";
const MAX_FILENAME_BYTES: usize = 255;

fn url_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            format!(r"^https?://github\.com/(?P<owner>{SEGMENT})/(?P<repo>{SEGMENT})/?$"),
            format!(r"^git@github\.com:(?P<owner>{SEGMENT})/(?P<repo>{SEGMENT})\.git$"),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
}

/// Accepts GitHub https/http URLs (optionally with `.git` and a trailing slash) and the
/// ssh form `git@github.com:owner/repo.git`.
pub fn validate_repo_url(url: &str) -> bool {
    parse_repo_url(url).is_some()
}

/// Owner and repository name of a valid URL, with any `.git` suffix removed.
pub fn parse_repo_url(url: &str) -> Option<RepoInfo> {
    let url = url.trim();
    let caps = url_patterns().iter().find_map(|re| re.captures(url))?;
    let owner = caps.name("owner")?.as_str().to_string();
    let raw_repo = caps.name("repo")?.as_str();
    let repo = raw_repo.strip_suffix(".git").unwrap_or(raw_repo).to_string();
    // "." and ".." would resolve outside the checkout directory.
    if is_dots_only(&owner) || repo.is_empty() || is_dots_only(&repo) {
        return None;
    }
    Some(RepoInfo {
        full_name: format!("{owner}/{repo}"),
        owner,
        repo,
    })
}

fn is_dots_only(segment: &str) -> bool {
    segment.chars().all(|c| c == '.')
}

/// Directory name for the local checkout. Works for any URL, not only valid ones.
pub fn repo_name(url: &str) -> String {
    if let Some(info) = parse_repo_url(url) {
        return info.repo;
    }
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if is_dots_only(name) {
        "repository".to_string()
    } else {
        sanitize_filename(name)
    }
}

/// Shape check for the generation service credential.
pub fn validate_api_key(key: &str) -> bool {
    let key = key.trim();
    if !(20..=200).contains(&key.len()) {
        return false;
    }
    (key.starts_with("AI") && key.len() >= 39)
        || key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Make `name` safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        return "unnamed_file".to_string();
    }
    if trimmed.len() <= MAX_FILENAME_BYTES {
        return trimmed.to_string();
    }

    let (stem, ext) = match trimmed.rfind('.') {
        Some(idx) if idx > 0 => (&trimmed[..idx], &trimmed[idx..]),
        _ => (trimmed, ""),
    };
    let budget = MAX_FILENAME_BYTES.saturating_sub(ext.len());
    let mut cut = budget.min(stem.len());
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &stem[..cut], ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_url_forms() {
        struct Case {
            url: &'static str,
            valid: bool,
        }
        let cases = [
            Case { url: "https://github.com/owner/repo", valid: true },
            Case { url: "https://github.com/owner/repo/", valid: true },
            Case { url: "https://github.com/owner/repo.git", valid: true },
            Case { url: "http://github.com/my.org/my-repo_1", valid: true },
            Case { url: "  https://github.com/owner/repo  ", valid: true },
            Case { url: "git@github.com:owner/repo.git", valid: true },
            Case { url: "git@github.com:owner/repo", valid: false },
            Case { url: "https://gitlab.com/owner/repo", valid: false },
            Case { url: "https://github.com/owner", valid: false },
            Case { url: "https://github.com/owner/repo/tree/main", valid: false },
            Case { url: "ftp://github.com/owner/repo", valid: false },
            Case { url: "", valid: false },
            Case { url: "https://github.com/owner/..", valid: false },
            Case { url: "https://github.com/owner/.", valid: false },
            Case { url: "https://github.com/owner/...git", valid: false },
            Case { url: "https://github.com/../repo", valid: false },
            Case { url: "git@github.com:owner/...git", valid: false },
            Case { url: "https://github.com/owner/.github", valid: true },
        ];
        for case in cases {
            assert_eq!(validate_repo_url(case.url), case.valid, "{:?}", case.url);
        }
    }

    #[test]
    fn parses_owner_and_repo() {
        let info = parse_repo_url("git@github.com:rust-lang/cargo.git").unwrap();
        assert_eq!(info.owner, "rust-lang");
        assert_eq!(info.repo, "cargo");
        assert_eq!(info.full_name, "rust-lang/cargo");

        let info = parse_repo_url("https://github.com/a/b.git/").unwrap();
        assert_eq!(info.repo, "b");
    }

    #[test]
    fn repo_name_falls_back_to_last_segment() {
        assert_eq!(repo_name("https://github.com/a/widgets.git"), "widgets");
        assert_eq!(repo_name("https://example.org/x/y/tool.git/"), "tool");
        assert_eq!(repo_name(""), "repository");
    }

    #[test]
    fn repo_name_never_names_a_parent_or_current_dir() {
        for url in [
            "https://github.com/owner/..",
            "https://github.com/owner/.",
            "https://github.com/owner/../",
            "..",
            "git@github.com:owner/...git",
        ] {
            let name = repo_name(url);
            assert!(!name.is_empty() && !is_dots_only(&name), "{url:?} -> {name:?}");
        }
    }

    #[test]
    fn api_key_shapes() {
        assert!(validate_api_key(&format!("AI{}", "z".repeat(37))));
        assert!(validate_api_key("abcdefghij_klmnop-qrstu.v"));
        assert!(!validate_api_key("short"));
        assert!(!validate_api_key(&"a".repeat(201)));
        assert!(!validate_api_key("has spaces in the middle of it"));
    }

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_filename("a<b>c:d.md"), "a_b_c_d.md");
        assert_eq!(sanitize_filename(" ..hidden.. "), "hidden");
        assert_eq!(sanitize_filename("..."), "unnamed_file");

        let long = format!("{}.md", "x".repeat(300));
        let out = sanitize_filename(&long);
        assert_eq!(out.len(), 255);
        assert!(out.ends_with(".md"));
    }
}
