use crate::domain::SearchHit;

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Renders a result list as a single prompt-ready string. Each hit becomes a
/// `文件/内容` block; hits with an empty file path render as "unknown".
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            let path = if hit.chunk().file_path().is_empty() {
                "unknown"
            } else {
                hit.chunk().file_path()
            };
            format!("文件: {}\n内容:\n{}", path, hit.chunk().content())
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chunk, FileCategory, RetrievalSource, SearchHit};

    fn hit(path: &str, content: &str) -> SearchHit {
        let chunk = Chunk::new(
            "u1".to_string(),
            path.to_string(),
            FileCategory::Code,
            "Java".to_string(),
            content.to_string(),
            1,
            1,
            "h".to_string(),
            0,
        );
        SearchHit::new(chunk, 0.5, RetrievalSource::Vector)
    }

    #[test]
    fn test_blocks_are_separated() {
        let rendered = format_context(&[hit("/a/Foo.java", "class Foo {}"), hit("/b/Bar.java", "class Bar {}")]);
        assert_eq!(
            rendered,
            "文件: /a/Foo.java\n内容:\nclass Foo {}\n\n---\n\n文件: /b/Bar.java\n内容:\nclass Bar {}"
        );
    }

    #[test]
    fn test_missing_path_renders_unknown() {
        let rendered = format_context(&[hit("", "content")]);
        assert!(rendered.starts_with("文件: unknown\n"));
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
