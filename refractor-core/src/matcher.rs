//! Structural matching over syntax tree nodes.
//!
//! All matchers are side-effect-free reads of the tree. Functions returning
//! `Option` double as capture bindings: `Some` carries the sub-nodes the
//! rewrite step needs, `None` means no match. Comment and token trivia never
//! counts toward structural shape.

use crate::tree::{Node, NodeKind};

/// The callee of a call expression.
pub fn callee<'t>(call: &'t Node) -> Option<&'t Node> {
    call.child_by_field("function")
        .or_else(|| call.significant_children().next())
}

/// The unqualified name a plain function call refers to. Covers `foo(...)`
/// and the global form `\foo(...)`; namespaced callees, variables, and
/// dynamic callees yield `None`.
pub fn call_name<'t>(call: &'t Node) -> Option<&'t str> {
    if call.kind != NodeKind::Call {
        return None;
    }
    let callee = callee(call)?;
    match callee.kind {
        NodeKind::Name => callee.text.as_deref(),
        NodeKind::QualifiedName => {
            let mut names = callee
                .significant_children()
                .filter(|c| c.kind == NodeKind::Name);
            let first = names.next()?;
            if names.next().is_some() {
                return None;
            }
            first.text.as_deref()
        }
        _ => None,
    }
}

/// PHP function names compare case-insensitively.
pub fn is_call_named(call: &Node, name: &str) -> bool {
    call_name(call).is_some_and(|n| n.eq_ignore_ascii_case(name))
}

/// Positional argument expressions of a call. `None` when any argument is
/// named, spread, or by-reference; rules stay away from those shapes.
pub fn plain_arguments<'t>(call: &'t Node) -> Option<Vec<&'t Node>> {
    let args = call.child_by_field("arguments")?;
    let mut out = Vec::new();
    for arg in args.significant_children() {
        if arg.kind != NodeKind::Argument {
            return None;
        }
        if arg.children.iter().any(|c| {
            c.kind == NodeKind::Token && matches!(c.text.as_deref(), Some("...") | Some("&"))
        }) {
            return None;
        }
        let inner: Vec<&Node> = arg.significant_children().collect();
        if inner.len() != 1 {
            return None;
        }
        out.push(inner[0]);
    }
    Some(out)
}

/// Operator token of a binary, unary, or assignment node.
pub fn operator<'t>(node: &'t Node) -> Option<&'t str> {
    if let Some(op) = node.child_by_field("operator") {
        return op.text.as_deref();
    }
    node.children
        .iter()
        .find(|c| c.kind == NodeKind::Token)
        .and_then(|t| t.text.as_deref())
}

/// Condition, then-branch, and else-branch of a full ternary. The elvis form
/// (`a ?: b`) has no then-branch and yields `None`.
pub fn ternary_parts<'t>(node: &'t Node) -> Option<(&'t Node, &'t Node, &'t Node)> {
    if node.kind != NodeKind::Conditional {
        return None;
    }
    if let (Some(c), Some(t), Some(e)) = (
        node.child_by_field("condition"),
        node.child_by_field("body"),
        node.child_by_field("alternative"),
    ) {
        return Some((c, t, e));
    }
    let parts: Vec<&Node> = node.significant_children().collect();
    match parts.as_slice() {
        [c, t, e] => Some((c, t, e)),
        _ => None,
    }
}

/// The single argument of an `isset(X)` check, whichever node shape the
/// grammar gives the construct.
pub fn isset_argument<'t>(node: &'t Node) -> Option<&'t Node> {
    if is_call_named(node, "isset") {
        let args = plain_arguments(node)?;
        if args.len() == 1 {
            return Some(args[0]);
        }
        return None;
    }
    if node.grammar.starts_with("isset") {
        let inner: Vec<&Node> = node.significant_children().collect();
        if inner.len() == 1 {
            return Some(inner[0]);
        }
    }
    None
}

/// True when both subtrees spell the same code, ignoring whitespace and
/// comments.
pub fn same_code(a: &Node, b: &Node) -> bool {
    a.leaf_stream() == b.leaf_stream()
}

/// Name of a function, method, or class declaration.
pub fn declared_name<'t>(node: &'t Node) -> Option<&'t str> {
    node.child_by_field("name")
        .or_else(|| node.child_of_kind(NodeKind::Name))
        .and_then(|n| n.text.as_deref())
}

/// True when the node under the given ancestor chain is a whole expression
/// statement, i.e. its value is discarded.
pub fn in_statement_position(ancestors: &[&Node]) -> bool {
    matches!(ancestors.last(), Some(parent) if parent.kind == NodeKind::ExpressionStatement)
}

pub fn any_descendant(node: &Node, pred: impl Fn(&Node) -> bool) -> bool {
    node.descendants().any(|n| pred(n))
}

pub fn find_descendant<'t>(
    node: &'t Node,
    pred: impl Fn(&Node) -> bool,
) -> Option<&'t Node> {
    node.descendants().find(|n| pred(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tree::SyntaxTree;

    fn first_call(tree: &SyntaxTree) -> &Node {
        tree.root
            .descendants()
            .find(|n| n.kind == NodeKind::Call)
            .expect("no call in fixture")
    }

    #[test]
    fn call_names_are_case_insensitive() {
        let tree = parse("<?php IS_NULL($x);\n").unwrap();
        let call = first_call(&tree);
        assert!(is_call_named(call, "is_null"));
        assert!(!is_call_named(call, "isset"));
    }

    #[test]
    fn global_fallback_calls_match() {
        let tree = parse("<?php \\strlen($x);\n").unwrap();
        let call = first_call(&tree);
        assert!(is_call_named(call, "strlen"));
    }

    #[test]
    fn plain_arguments_capture_expressions() {
        let tree = parse("<?php strpos($haystack, $needle);\n").unwrap();
        let args = plain_arguments(first_call(&tree)).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].leaf_stream(), "$ haystack");
    }

    #[test]
    fn spread_arguments_do_not_capture() {
        let tree = parse("<?php max(...$values);\n").unwrap();
        assert!(plain_arguments(first_call(&tree)).is_none());
    }

    #[test]
    fn ternary_parts_split_full_form_only() {
        let tree = parse("<?php $x = $a ? $b : $c;\n").unwrap();
        let cond = tree
            .root
            .descendants()
            .find(|n| n.kind == NodeKind::Conditional)
            .unwrap();
        let (c, t, e) = ternary_parts(cond).unwrap();
        assert_eq!(c.leaf_stream(), "$ a");
        assert_eq!(t.leaf_stream(), "$ b");
        assert_eq!(e.leaf_stream(), "$ c");

        let elvis = parse("<?php $x = $a ?: $c;\n").unwrap();
        let cond = elvis
            .root
            .descendants()
            .find(|n| n.kind == NodeKind::Conditional)
            .unwrap();
        assert!(ternary_parts(cond).is_none());
    }

    #[test]
    fn isset_argument_is_captured() {
        let tree = parse("<?php $y = isset($data['k']) ? 1 : 0;\n").unwrap();
        let isset = tree
            .root
            .descendants()
            .find(|n| isset_argument(n).is_some())
            .expect("isset shape not found");
        let arg = isset_argument(isset).unwrap();
        assert_eq!(arg.leaf_stream(), "$ data [ 'k' ]");
    }

    #[test]
    fn binary_operator_is_read() {
        let tree = parse("<?php $r = $a !== false;\n").unwrap();
        let binary = tree
            .root
            .descendants()
            .find(|n| n.kind == NodeKind::Binary)
            .unwrap();
        assert_eq!(operator(binary), Some("!=="));
    }

    #[test]
    fn same_code_ignores_spacing() {
        let a = parse("<?php $q = $row ['id'];\n").unwrap();
        let b = parse("<?php $q = $row['id'];\n").unwrap();
        let pick = |t: &SyntaxTree| -> Node {
            t.root
                .descendants()
                .find(|n| n.kind == NodeKind::Subscript)
                .unwrap()
                .clone()
        };
        assert!(same_code(&pick(&a), &pick(&b)));
    }
}
