use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use super::{ChunkDraft, TokenSplitter};
use crate::domain::{Symbol, SymbolKind};

/// Symbol-granular capture patterns: top-level type declarations plus every
/// method and constructor.
const SYMBOL_QUERY: &str = r#"
(class_declaration name: (identifier) @name) @class
(interface_declaration name: (identifier) @name) @interface
(enum_declaration name: (identifier) @name) @enum
(annotation_type_declaration name: (identifier) @name) @annotation
(method_declaration name: (identifier) @name) @method
(constructor_declaration name: (identifier) @name) @method
"#;

/// AST-driven splitter for Java sources.
///
/// Emits, in file order, one chunk per top-level `class`/`interface` carrying
/// the type signature only (method and constructor bodies erased) and one
/// chunk per method carrying the full method text. A file that fails to
/// parse transparently delegates to the token splitter so no file is dropped.
pub struct JavaAstSplitter {
    fallback: TokenSplitter,
}

impl JavaAstSplitter {
    pub fn new() -> Self {
        Self {
            fallback: TokenSplitter::new(),
        }
    }

    pub fn split(&self, content: &str) -> Vec<ChunkDraft> {
        match Self::split_ast(content) {
            Some(drafts) if !drafts.is_empty() => drafts,
            _ => {
                debug!("Java AST unavailable, delegating to token splitter");
                self.fallback.split(content)
            }
        }
    }

    fn split_ast(source: &str) -> Option<Vec<ChunkDraft>> {
        let language = tree_sitter::Language::from(tree_sitter_java::LANGUAGE);
        let mut parser = Parser::new();
        parser.set_language(&language).ok()?;

        let tree = parser.parse(source, None)?;
        let root = tree.root_node();
        if root.has_error() {
            return None;
        }

        let query = Query::new(&language, SYMBOL_QUERY).ok()?;
        let capture_names: Vec<&str> = query.capture_names().to_vec();
        let package = Self::package_name(root, source);

        let mut entries: Vec<(usize, ChunkDraft)> = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches_iter = cursor.matches(&query, root, source.as_bytes());

        while let Some(query_match) = matches_iter.next() {
            let mut symbol_name: Option<String> = None;
            let mut main_node: Option<Node> = None;
            let mut capture_kind = "";

            for capture in query_match.captures {
                let capture_name = capture_names
                    .get(capture.index as usize)
                    .copied()
                    .unwrap_or("");
                if capture_name == "name" {
                    symbol_name = Some(source[capture.node.byte_range()].to_string());
                } else {
                    main_node = Some(capture.node);
                    capture_kind = capture_name;
                }
            }

            let (node, name) = match (main_node, symbol_name) {
                (Some(node), Some(name)) => (node, name),
                _ => continue,
            };

            let draft = if capture_kind == "method" {
                Some(Self::method_draft(node, &name, source, package.as_deref()))
            } else {
                // Type chunks are emitted for top-level declarations only.
                if node.parent().map(|p| p.kind()) != Some("program") {
                    None
                } else {
                    let kind = match capture_kind {
                        "class" => SymbolKind::Class,
                        "interface" => SymbolKind::Interface,
                        "enum" => SymbolKind::Enum,
                        "annotation" => SymbolKind::Annotation,
                        _ => continue,
                    };
                    Some(Self::type_draft(node, &name, kind, source, package.as_deref()))
                }
            };

            if let Some(draft) = draft {
                entries.push((node.start_byte(), draft));
            }
        }

        entries.sort_by_key(|(start_byte, _)| *start_byte);
        Some(entries.into_iter().map(|(_, draft)| draft).collect())
    }

    /// Signature-only chunk for a type declaration.
    fn type_draft(
        node: Node,
        name: &str,
        kind: SymbolKind,
        source: &str,
        package: Option<&str>,
    ) -> ChunkDraft {
        let mut symbol = Symbol::new(name, kind);
        if let Some(package) = package {
            symbol = symbol.with_parent(package);
        }
        ChunkDraft {
            content: Self::erase_bodies(node, source),
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
            symbol: Some(symbol),
        }
    }

    /// Full-text chunk for a method or constructor.
    fn method_draft(node: Node, name: &str, source: &str, package: Option<&str>) -> ChunkDraft {
        let parent = Self::enclosing_type_name(node, source)
            .map(|type_name| format!("class {}", type_name))
            .or_else(|| package.map(str::to_string));

        let mut symbol = Symbol::new(name, SymbolKind::Method);
        if let Some(parent) = parent {
            symbol = symbol.with_parent(parent);
        }
        ChunkDraft {
            content: source[node.byte_range()].to_string(),
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
            symbol: Some(symbol),
        }
    }

    fn package_name(root: Node, source: &str) -> Option<String> {
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() != "package_declaration" {
                continue;
            }
            let mut inner = child.walk();
            for part in child.named_children(&mut inner) {
                if matches!(part.kind(), "scoped_identifier" | "identifier") {
                    return Some(source[part.byte_range()].to_string());
                }
            }
        }
        None
    }

    /// Rebuild a type declaration's text with every method and constructor
    /// body replaced by `;`, keeping fields, signatures and nested type
    /// structure intact.
    fn erase_bodies(node: Node, source: &str) -> String {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        Self::collect_body_ranges(node, &mut ranges);
        ranges.sort_unstable();

        let mut signature = String::new();
        let mut position = node.start_byte();
        for (start, end) in ranges {
            if start < position {
                continue;
            }
            signature.push_str(&source[position..start]);
            signature.push(';');
            position = end;
        }
        signature.push_str(&source[position..node.end_byte()]);
        signature
    }

    fn collect_body_ranges(node: Node, ranges: &mut Vec<(usize, usize)>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "method_declaration" | "constructor_declaration") {
                if let Some(body) = child.child_by_field_name("body") {
                    ranges.push((body.start_byte(), body.end_byte()));
                    continue;
                }
            }
            Self::collect_body_ranges(child, ranges);
        }
    }

    fn enclosing_type_name(node: Node, source: &str) -> Option<String> {
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if matches!(
                ancestor.kind(),
                "class_declaration"
                    | "interface_declaration"
                    | "enum_declaration"
                    | "annotation_type_declaration"
            ) {
                if let Some(name) = ancestor.child_by_field_name("name") {
                    return Some(source[name.byte_range()].to_string());
                }
            }
            current = ancestor.parent();
        }
        None
    }
}

impl Default for JavaAstSplitter {
    fn default() -> Self {
        Self::new()
    }
}
