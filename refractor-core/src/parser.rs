//! PHP parsing front end.
//!
//! Wraps tree-sitter-php and converts its concrete tree into the [`Node`]
//! model. Nothing above this module sees tree-sitter types. Parsing is pure
//! text-in, tree-out; file handling lives with the engine.

use thiserror::Error;
use tree_sitter::{Node as TsNode, Parser};

use crate::php;
use crate::tree::{Node, NodeKind, Span, SyntaxTree, TypeHint};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to load PHP grammar: {0}")]
    Language(String),

    #[error("parser produced no tree")]
    Empty,

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

/// Parses PHP source into a syntax tree.
///
/// The grammar is error-tolerant, so a tree always comes back; any error or
/// missing node in it means the input is not valid PHP and the whole file is
/// rejected with the first such position.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser::new();
    let language = tree_sitter_php::LANGUAGE_PHP.into();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Language(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ParseError::Empty)?;
    let ts_root = tree.root_node();

    if ts_root.has_error() {
        let position = find_error(ts_root)
            .unwrap_or(ts_root)
            .start_position();
        return Err(ParseError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
        });
    }

    Ok(SyntaxTree {
        root: build_node(ts_root, source, None),
    })
}

/// First error or missing node in document order.
fn find_error(node: TsNode) -> Option<TsNode> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_error(child) {
            return Some(found);
        }
    }
    None
}

fn build_node(ts: TsNode, source: &str, field: Option<&'static str>) -> Node {
    let start = ts.start_position();
    let span = Span {
        start: ts.start_byte(),
        end: ts.end_byte(),
        line: start.row + 1,
        column: start.column + 1,
    };
    let kind = if ts.is_named() {
        php::classify(ts.kind())
    } else {
        NodeKind::Token
    };

    let mut children = Vec::with_capacity(ts.child_count());
    let mut cursor = ts.walk();
    if cursor.goto_first_child() {
        loop {
            let child_field = cursor.field_name();
            children.push(build_node(cursor.node(), source, child_field));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    let text = if children.is_empty() {
        Some(source[span.start..span.end].to_string())
    } else {
        None
    };
    let hint = compute_hint(kind, &children, source);

    Node {
        kind,
        grammar: ts.kind(),
        field,
        children,
        span: Some(span),
        text,
        hint,
    }
}

fn compute_hint(kind: NodeKind, children: &[Node], source: &str) -> Option<TypeHint> {
    if let Some(hint) = php::literal_hint(kind) {
        return Some(hint);
    }
    if matches!(
        kind,
        NodeKind::Parameter | NodeKind::PropertyPromotionParameter | NodeKind::PropertyDeclaration
    ) {
        let declared = children.iter().find(|c| c.kind == NodeKind::TypeNode)?;
        return Some(php::declared_hint(declared.original_text(source)?));
    }
    None
}
