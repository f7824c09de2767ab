//! Array and list syntax rules.

use crate::matcher;
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::tree::{Node, NodeKind};
use crate::version::PhpVersion;

/// Rewrites the keyword bracket pair while keeping every element, comma, and
/// comment between them exactly where it was.
fn bracketize(node: &Node, keyword: &str) -> Node {
    let mut children = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if child.kind == NodeKind::Token {
            match (child.text.as_deref(), child.span) {
                (Some(t), _) if t.eq_ignore_ascii_case(keyword) => continue,
                (Some("("), Some(span)) => {
                    children.push(Node::token_at("[", span));
                    continue;
                }
                (Some(")"), Some(span)) => {
                    children.push(Node::token_at("]", span));
                    continue;
                }
                _ => {}
            }
        }
        children.push(child.clone());
    }
    Node::synthetic(node.kind, children)
}

fn leads_with_keyword(node: &Node, keyword: &str) -> bool {
    node.children
        .iter()
        .find(|c| c.kind == NodeKind::Token)
        .and_then(|t| t.text.as_deref())
        .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
}

/// `array(...)` to `[...]`.
pub struct ShortArraySyntax;

impl Rule for ShortArraySyntax {
    fn id(&self) -> &'static str {
        "short-array-syntax"
    }

    fn description(&self) -> &'static str {
        "Replace long array() literals with short [] syntax"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php54)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        node.kind == NodeKind::ArrayLiteral && leads_with_keyword(node, "array")
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        Rewrite::Replace(bracketize(node, "array"))
    }
}

/// `list($a, $b) = ...` to `[$a, $b] = ...`.
pub struct ShortListSyntax;

impl Rule for ShortListSyntax {
    fn id(&self) -> &'static str {
        "short-list-syntax"
    }

    fn description(&self) -> &'static str {
        "Replace list() destructuring with short [] syntax"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php71)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        node.kind == NodeKind::ListLiteral && leads_with_keyword(node, "list")
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        Rewrite::Replace(bracketize(node, "list"))
    }
}

/// Statement-level `array_push($a, $v)` with a single value to `$a[] = $v`.
/// Multi-value pushes and value-position calls (which use the return value)
/// are left alone.
pub struct ArrayPushToAppend;

impl Rule for ArrayPushToAppend {
    fn id(&self) -> &'static str {
        "array-push-to-append"
    }

    fn description(&self) -> &'static str {
        "Replace single-value array_push() statements with [] append"
    }

    fn applies(&self, node: &Node, ctx: &RuleContext<'_>) -> bool {
        matcher::is_call_named(node, "array_push")
            && matcher::in_statement_position(ctx.ancestors)
            && matcher::plain_arguments(node).is_some_and(|args| args.len() == 2)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some(args) = matcher::plain_arguments(node) else {
            return Rewrite::Unchanged;
        };
        let [target, value] = args.as_slice() else {
            return Rewrite::Unchanged;
        };

        let append = Node::synthetic(
            NodeKind::Subscript,
            vec![(*target).clone(), Node::token("["), Node::token("]")],
        );
        Rewrite::Replace(Node::synthetic(
            NodeKind::Assignment,
            vec![append, Node::token("="), (*value).clone()],
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::rules::testing::run_rules;

    #[test]
    fn long_array_becomes_short() {
        let (out, changes, _) = run_rules(
            "<?php\n$a = array( 1,\n    2 => 'x' );\n",
            vec![Arc::new(super::ShortArraySyntax)],
        );
        assert_eq!(out, "<?php\n$a = [ 1,\n    2 => 'x' ];\n");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "short-array-syntax");
    }

    #[test]
    fn nested_arrays_converge_over_passes() {
        let (out, changes, _) = run_rules(
            "<?php\n$a = array(array(1), 2);\n",
            vec![Arc::new(super::ShortArraySyntax)],
        );
        assert_eq!(out, "<?php\n$a = [[1], 2];\n");
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn short_arrays_are_untouched() {
        let source = "<?php\n$a = [1, 2];\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::ShortArraySyntax)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn uppercase_array_keyword_matches() {
        let (out, _, _) = run_rules(
            "<?php\n$a = Array(1);\n",
            vec![Arc::new(super::ShortArraySyntax)],
        );
        assert_eq!(out, "<?php\n$a = [1];\n");
    }

    #[test]
    fn list_destructuring_shortens() {
        let (out, changes, _) = run_rules(
            "<?php\nlist($a, $b) = $pair;\n",
            vec![Arc::new(super::ShortListSyntax)],
        );
        assert_eq!(out, "<?php\n[$a, $b] = $pair;\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn array_push_statement_becomes_append() {
        let (out, changes, _) = run_rules(
            "<?php\narray_push($this->rows, $row);\n",
            vec![Arc::new(super::ArrayPushToAppend)],
        );
        assert_eq!(out, "<?php\n$this->rows[] = $row;\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn array_push_with_many_values_is_kept() {
        let source = "<?php\narray_push($rows, $a, $b);\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::ArrayPushToAppend)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn array_push_in_value_position_is_kept() {
        let source = "<?php\n$n = array_push($rows, $row);\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::ArrayPushToAppend)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }
}
