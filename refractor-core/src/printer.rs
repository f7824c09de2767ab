//! Rendering of replacement subtrees.
//!
//! A replacement built by a rule mixes original nodes (span intact) with
//! synthesized ones. Rendering walks the children: where two neighbours both
//! carry spans in ascending order, the original bytes between them (spaces,
//! newlines, comments) are copied through; around synthesized nodes the
//! chain breaks and canonical single-space rules apply. Leaves prefer their
//! `text` over their span bytes, which is what makes span-anchored
//! substitution tokens work.

use crate::tree::{Node, NodeKind};

pub fn render(node: &Node, source: &str) -> String {
    let mut out = String::new();
    render_into(node, source, &mut out);
    out
}

fn render_into(node: &Node, source: &str, out: &mut String) {
    if node.children.is_empty() {
        if let Some(text) = &node.text {
            out.push_str(text);
        } else if let Some(span) = node.span {
            out.push_str(&source[span.start..span.end]);
        }
        return;
    }

    let mut prev_end: Option<usize> = None;
    let mut first = true;
    for child in &node.children {
        match (prev_end, child.span) {
            (Some(pe), Some(cs)) if cs.start >= pe => {
                out.push_str(&source[pe..cs.start]);
            }
            _ if first => {}
            _ => {
                if let (Some(prev), Some(next)) =
                    (out.chars().last(), leading_char(child, source))
                {
                    if wants_space(prev, next) {
                        out.push(' ');
                    }
                }
            }
        }
        render_into(child, source, out);
        prev_end = child.span.map(|s| s.end);
        first = false;
    }
}

/// First character the node will emit, without rendering it.
fn leading_char(node: &Node, source: &str) -> Option<char> {
    if node.children.is_empty() {
        if let Some(text) = &node.text {
            return text.chars().next();
        }
        if let Some(span) = node.span {
            return source[span.start..span.end].chars().next();
        }
        return None;
    }
    node.children
        .iter()
        .find_map(|c| leading_char(c, source))
}

fn wants_space(prev: char, next: char) -> bool {
    const TIGHT_AFTER: &str = "([{\\!@~$";
    const TIGHT_BEFORE: &str = ")]},;:([";
    const OPERATOR_TAIL: &str = "*+-/%<>=&|^.?:";
    if TIGHT_AFTER.contains(prev) {
        return false;
    }
    // An operator never glues to its right operand, not even a parenthesized
    // one.
    if OPERATOR_TAIL.contains(prev) {
        return true;
    }
    !TIGHT_BEFORE.contains(next)
}

/// Expressions that can stand as an operand without parentheses.
pub fn is_atom(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Variable
            | NodeKind::Name
            | NodeKind::QualifiedName
            | NodeKind::IntLit
            | NodeKind::FloatLit
            | NodeKind::StringLit
            | NodeKind::BoolLit
            | NodeKind::NullLit
            | NodeKind::Call
            | NodeKind::MemberCall
            | NodeKind::ScopedCall
            | NodeKind::Subscript
            | NodeKind::MemberAccess
            | NodeKind::ScopedPropertyAccess
            | NodeKind::Parenthesized
            | NodeKind::ArrayLiteral
    )
}

/// Clones the node, wrapped in parentheses unless it is already atomic.
pub fn atom_or_parenthesized(node: &Node) -> Node {
    if is_atom(node) {
        return node.clone();
    }
    Node::synthetic(
        NodeKind::Parenthesized,
        vec![Node::token("("), node.clone(), Node::token(")")],
    )
}
