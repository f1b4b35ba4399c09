use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coarse classification of an indexable file, derived purely from its
/// extension. Drives splitter selection and query-time filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileCategory {
    Code,
    Document,
    Config,
    Other,
}

impl FileCategory {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "java" | "kt" | "kts" | "scala" | "groovy" | "py" | "rs" | "go" | "c" | "cc"
            | "cpp" | "h" | "hpp" | "cs" | "js" | "jsx" | "ts" | "tsx" | "rb" | "php"
            | "swift" | "sql" | "sh" | "bat" => FileCategory::Code,
            "md" | "markdown" | "txt" | "doc" | "docx" | "pdf" | "adoc" | "rst" => {
                FileCategory::Document
            }
            "yml" | "yaml" | "properties" | "xml" | "json" | "toml" | "ini" | "conf" | "env"
            | "gradle" | "cfg" => FileCategory::Config,
            _ => FileCategory::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileCategory::Other)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CODE" => Some(FileCategory::Code),
            "DOCUMENT" => Some(FileCategory::Document),
            "CONFIG" => Some(FileCategory::Config),
            "OTHER" => Some(FileCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Code => "CODE",
            FileCategory::Document => "DOCUMENT",
            FileCategory::Config => "CONFIG",
            FileCategory::Other => "OTHER",
        }
    }

    /// Human-readable Chinese label used by the enrichment header.
    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Code => "代码",
            FileCategory::Document => "文档",
            FileCategory::Config => "配置",
            FileCategory::Other => "其他",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable language tag for a file path, e.g. `"Java"`, `"markdown"`.
/// Unrecognised extensions map to `"Unknown"`.
pub fn language_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "java" => "Java",
        "kt" | "kts" => "Kotlin",
        "scala" => "Scala",
        "groovy" => "Groovy",
        "py" => "Python",
        "rs" => "Rust",
        "go" => "Go",
        "c" | "h" => "C",
        "cc" | "cpp" | "hpp" => "C++",
        "cs" => "C#",
        "js" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "rb" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "sql" => "SQL",
        "sh" => "Shell",
        "md" | "markdown" => "markdown",
        "txt" => "text",
        "yml" | "yaml" => "YAML",
        "properties" => "Properties",
        "xml" => "XML",
        "json" => "JSON",
        "toml" => "TOML",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_extension() {
        assert_eq!(FileCategory::from_extension("java"), FileCategory::Code);
        assert_eq!(FileCategory::from_extension("md"), FileCategory::Document);
        assert_eq!(FileCategory::from_extension("yml"), FileCategory::Config);
        assert_eq!(FileCategory::from_extension("bin"), FileCategory::Other);
    }

    #[test]
    fn test_category_from_path_without_extension() {
        assert_eq!(
            FileCategory::from_path(Path::new("Dockerfile")),
            FileCategory::Other
        );
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(FileCategory::parse("code"), Some(FileCategory::Code));
        assert_eq!(FileCategory::parse("DOCUMENT"), Some(FileCategory::Document));
        assert_eq!(FileCategory::parse("weird"), None);
    }

    #[test]
    fn test_language_tags() {
        assert_eq!(language_for_path(Path::new("Foo.java")), "Java");
        assert_eq!(language_for_path(Path::new("README.md")), "markdown");
        assert_eq!(language_for_path(Path::new("data.bin")), "Unknown");
    }
}
