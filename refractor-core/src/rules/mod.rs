//! The built-in rule catalogue, grouped the way the shipped rule sets are.

use std::ptr;
use std::sync::Arc;

use crate::matcher;
use crate::rule::Rule;
use crate::tree::{Node, NodeKind};
use crate::version::PhpVersion;

pub mod arrays;
pub mod calls;
pub mod dead_code;
pub mod functions;
pub mod imports;
pub mod strings;
pub mod ternary;

/// Rules introduced by a language version, in the order they run.
pub fn version_rules(version: PhpVersion) -> Vec<Arc<dyn Rule>> {
    match version {
        PhpVersion::Php54 => vec![Arc::new(arrays::ShortArraySyntax)],
        PhpVersion::Php56 => vec![
            Arc::new(calls::PowToExponentiation),
            Arc::new(functions::VariadicParameters),
        ],
        PhpVersion::Php70 => vec![
            Arc::new(ternary::TernaryToNullCoalescing),
            Arc::new(calls::RandToRandomInt),
        ],
        PhpVersion::Php71 => vec![Arc::new(arrays::ShortListSyntax)],
        PhpVersion::Php74 => vec![Arc::new(functions::ClosureToArrowFunction)],
        PhpVersion::Php80 => vec![
            Arc::new(strings::StrContains),
            Arc::new(strings::StrStartsWith),
        ],
        _ => Vec::new(),
    }
}

pub fn quality_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(calls::IsNullToIdentical),
        Arc::new(ternary::TernaryToElvis),
        Arc::new(arrays::ArrayPushToAppend),
        Arc::new(calls::SizeofToCount),
        Arc::new(calls::JoinToImplode),
    ]
}

pub fn dead_code_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(dead_code::RemoveUnreachableStatement),
        Arc::new(dead_code::RemoveUnusedPrivateMethod),
    ]
}

pub fn type_declaration_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(functions::AddVoidReturnType),
        Arc::new(functions::TypedPropertyFromLiteral),
    ]
}

/// Clones a call with its callee renamed. The new name is anchored at the old
/// callee span so the gap between name and argument list survives.
pub(crate) fn rename_call(call: &Node, name: &str) -> Option<Node> {
    let callee = matcher::callee(call)?;
    let span = callee.span?;
    let children = call
        .children
        .iter()
        .map(|child| {
            if ptr::eq(child, callee) {
                Node::leaf_at(NodeKind::Name, name, span)
            } else {
                child.clone()
            }
        })
        .collect();
    Some(Node::synthetic(NodeKind::Call, children))
}

pub(crate) fn parenthesized(node: Node) -> Node {
    Node::synthetic(
        NodeKind::Parenthesized,
        vec![Node::token("("), node, Node::token(")")],
    )
}
