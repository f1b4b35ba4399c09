use crate::domain::Chunk;

/// Projection handed to the embedding model and persisted in the vector
/// store: a natural-language header derived from the chunk metadata, then
/// the raw content. The header bridges the gap between natural-language
/// queries and source-language content and is not stripped at retrieval
/// time.
///
/// Example: `文件: Foo.java | 类型: 类 | 符号: Foo | 所属: com.acme\n<raw>`.
pub fn vector_content(chunk: &Chunk) -> String {
    let mut header = format!("文件: {}", chunk.file_name());

    match chunk.symbol() {
        Some(symbol) => {
            header.push_str(&format!(" | 类型: {}", symbol.kind().label()));
            header.push_str(&format!(" | 符号: {}", symbol.name()));
            if let Some(parent) = symbol.parent() {
                header.push_str(&format!(" | 所属: {}", parent));
            }
        }
        None => {
            header.push_str(&format!(" | 类型: {}", chunk.category().label()));
        }
    }

    format!("{}\n{}", header, chunk.content())
}

/// Projection persisted in the full-text index: file basename first (term
/// frequency weights it up), then the symbol line, then the raw content.
pub fn lexical_content(chunk: &Chunk) -> String {
    match chunk.symbol() {
        Some(symbol) => {
            let mut symbol_line = format!("{} {}", symbol.name(), symbol.kind().as_str());
            if let Some(parent) = symbol.parent() {
                symbol_line.push(' ');
                symbol_line.push_str(parent);
            }
            format!("{}\n{}\n{}", chunk.file_name(), symbol_line, chunk.content())
        }
        None => format!("{}\n{}", chunk.file_name(), chunk.content()),
    }
}
