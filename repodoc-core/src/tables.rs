//! Static lookup tables shared by the scanner, classifier and metadata extractor.
//!
//! All tables are keyed by lowercase extension without the leading dot (`"py"`, `"tsx"`),
//! or by lowercase file name for extensionless files. [`LanguageTables::default`] builds
//! them once; callers hold the result and pass it by reference (or behind an `Arc` when
//! it crosses into worker tasks). Tests can construct a trimmed or altered copy.

use std::collections::{HashMap, HashSet};

use crate::classify::{FileType, Language};

#[derive(Debug, Clone)]
pub struct LanguageTables {
    pub file_types: HashMap<&'static str, FileType>,
    pub languages: HashMap<&'static str, Language>,
    /// Exact lowercase file name -> language, for conventional extensionless files.
    pub name_languages: HashMap<&'static str, Language>,
    pub comment_markers: HashMap<&'static str, Vec<&'static str>>,
    pub import_keywords: HashMap<&'static str, Vec<&'static str>>,
    pub definition_keywords: HashMap<&'static str, Vec<&'static str>>,
    /// Extensions the scanner accepts.
    pub supported_extensions: HashSet<&'static str>,
    /// Extensionless names the scanner accepts (matched lowercase).
    pub extensionless_names: HashSet<&'static str>,
    /// Path segments that exclude an entry at any depth.
    pub denylist: HashSet<&'static str>,
    /// File names (lowercase) whose head is quoted in the repository context.
    pub dependency_manifests: Vec<&'static str>,
}

impl LanguageTables {
    pub fn file_type(&self, extension: &str) -> Option<FileType> {
        self.file_types.get(extension).copied()
    }

    pub fn language(&self, extension: &str) -> Option<Language> {
        self.languages.get(extension).copied()
    }

    pub fn comment_markers(&self, extension: &str) -> &[&'static str] {
        self.comment_markers
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn import_keywords(&self, extension: &str) -> &[&'static str] {
        self.import_keywords
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn definition_keywords(&self, extension: &str) -> &[&'static str] {
        self.definition_keywords
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_denied(&self, segment: &str) -> bool {
        self.denylist.contains(segment)
    }
}

fn keyed<V: Clone>(keys: &[&'static str], value: V) -> Vec<(&'static str, V)> {
    keys.iter().map(|k| (*k, value.clone())).collect()
}

impl Default for LanguageTables {
    fn default() -> Self {
        use FileType::*;

        let file_types: HashMap<_, _> = [
            ("html", Web),
            ("css", Stylesheet),
            ("scss", Stylesheet),
            ("sass", Stylesheet),
            ("less", Stylesheet),
            ("js", Script),
            ("jsx", Script),
            ("ts", Script),
            ("tsx", Script),
            ("py", Source),
            ("java", Source),
            ("cpp", Source),
            ("c", Source),
            ("h", Header),
            ("hpp", Header),
            ("cs", Source),
            ("php", Source),
            ("rb", Source),
            ("go", Source),
            ("rs", Source),
            ("swift", Source),
            ("kt", Source),
            ("scala", Source),
            ("r", Source),
            ("m", Source),
            ("sh", Script),
            ("bash", Script),
            ("ps1", Script),
            ("json", Data),
            ("xml", Data),
            ("yaml", Data),
            ("yml", Data),
            ("sql", Database),
            ("md", Documentation),
            ("rst", Documentation),
            ("txt", Text),
        ]
        .into_iter()
        .collect();

        let languages: HashMap<_, _> = [
            ("py", Language::Python),
            ("js", Language::Javascript),
            ("jsx", Language::Javascript),
            ("ts", Language::Typescript),
            ("tsx", Language::Typescript),
            ("html", Language::Html),
            ("css", Language::Css),
            ("scss", Language::Scss),
            ("sass", Language::Sass),
            ("less", Language::Less),
            ("java", Language::Java),
            ("cpp", Language::Cpp),
            ("c", Language::C),
            ("h", Language::C),
            ("hpp", Language::Cpp),
            ("cs", Language::CSharp),
            ("php", Language::Php),
            ("rb", Language::Ruby),
            ("go", Language::Go),
            ("rs", Language::Rust),
            ("swift", Language::Swift),
            ("kt", Language::Kotlin),
            ("scala", Language::Scala),
            ("sh", Language::Bash),
            ("bash", Language::Bash),
            ("ps1", Language::PowerShell),
            ("sql", Language::Sql),
            ("json", Language::Json),
            ("xml", Language::Xml),
            ("yaml", Language::Yaml),
            ("yml", Language::Yaml),
            ("md", Language::Markdown),
            ("rst", Language::RestructuredText),
            ("r", Language::R),
            ("m", Language::Matlab),
        ]
        .into_iter()
        .collect();

        let name_languages: HashMap<_, _> = [
            ("dockerfile", Language::Dockerfile),
            ("makefile", Language::Makefile),
        ]
        .into_iter()
        .collect();

        let c_family = vec!["//", "/*"];
        let mut comment_markers: HashMap<_, _> = HashMap::new();
        comment_markers.extend(keyed(&["py", "rb", "sh", "bash"], vec!["#"]));
        comment_markers.extend(keyed(
            &["js", "jsx", "ts", "tsx", "java", "cpp", "c", "cs"],
            c_family,
        ));
        comment_markers.extend([
            ("php", vec!["//", "/*", "#"]),
            ("go", vec!["//"]),
            ("rs", vec!["//"]),
            ("sql", vec!["--"]),
            ("html", vec!["<!--"]),
            ("css", vec!["/*"]),
        ]);

        let mut import_keywords: HashMap<_, _> = HashMap::new();
        import_keywords.extend(keyed(&["js", "jsx", "ts", "tsx"], vec!["import ", "require("]));
        import_keywords.extend(keyed(&["cpp", "c"], vec!["#include"]));
        import_keywords.extend([
            ("py", vec!["import ", "from "]),
            ("java", vec!["import "]),
            ("cs", vec!["using "]),
            ("go", vec!["import "]),
            ("rs", vec!["use "]),
        ]);

        let mut definition_keywords: HashMap<_, _> = HashMap::new();
        definition_keywords.extend(keyed(
            &["js", "jsx"],
            vec!["function ", "class ", "const ", "let ", "var "],
        ));
        definition_keywords.extend(keyed(
            &["ts", "tsx"],
            vec!["function ", "class ", "interface ", "type "],
        ));
        definition_keywords.extend([
            ("php", vec!["function ", "class "]),
            ("py", vec!["def ", "class ", "async def "]),
            (
                "java",
                vec![
                    "public class",
                    "private class",
                    "public interface",
                    "public void",
                    "private void",
                ],
            ),
            ("cpp", vec!["class ", "struct ", "void ", "int ", "double "]),
            ("c", vec!["void ", "int ", "double ", "struct "]),
            (
                "cs",
                vec!["public class", "private class", "public void", "private void"],
            ),
            ("rb", vec!["def ", "class "]),
            ("go", vec!["func ", "type "]),
            ("rs", vec!["fn ", "struct ", "impl "]),
        ]);

        let supported_extensions: HashSet<_> = [
            "py", "js", "jsx", "ts", "tsx", "html", "css", "scss", "sass", "less", "java", "cpp",
            "c", "h", "hpp", "cs", "php", "rb", "go", "rs", "swift", "kt", "scala", "sh", "bash",
            "ps1", "sql", "xml", "json", "yaml", "yml", "md", "rst", "txt", "dockerfile",
            "makefile", "r", "m",
        ]
        .into_iter()
        .collect();

        let extensionless_names: HashSet<_> = [
            "dockerfile",
            "makefile",
            "readme",
            "license",
            "changelog",
            "contributing",
            "authors",
            "install",
            "news",
        ]
        .into_iter()
        .collect();

        let denylist: HashSet<_> = [
            ".git",
            ".svn",
            ".hg",
            "__pycache__",
            ".pytest_cache",
            "node_modules",
            ".next",
            ".nuxt",
            "build",
            "dist",
            ".vscode",
            ".idea",
            ".DS_Store",
            "venv",
            ".env",
            ".venv",
            "env",
            "virtualenv",
            ".tox",
        ]
        .into_iter()
        .collect();

        Self {
            file_types,
            languages,
            name_languages,
            comment_markers,
            import_keywords,
            definition_keywords,
            supported_extensions,
            extensionless_names,
            denylist,
            dependency_manifests: vec![
                "package.json",
                "requirements.txt",
                "composer.json",
                "pom.xml",
                "cargo.toml",
                "go.mod",
            ],
        }
    }
}
