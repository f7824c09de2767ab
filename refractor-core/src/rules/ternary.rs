//! Conditional expression rules.

use crate::matcher;
use crate::printer;
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::tree::{Node, NodeKind};
use crate::version::PhpVersion;

/// Expressions that can be evaluated twice without observable effect. The
/// elvis rewrite drops one evaluation of the condition, so anything that
/// could have side effects disqualifies it.
fn is_pure_fetch(node: &Node) -> bool {
    match node.kind {
        NodeKind::Variable
        | NodeKind::Name
        | NodeKind::QualifiedName
        | NodeKind::IntLit
        | NodeKind::FloatLit
        | NodeKind::StringLit
        | NodeKind::BoolLit
        | NodeKind::NullLit => true,
        NodeKind::Subscript | NodeKind::MemberAccess | NodeKind::ScopedPropertyAccess => {
            node.significant_children().all(is_pure_fetch)
        }
        _ => false,
    }
}

/// `isset($x) ? $x : $fallback` to `$x ?? $fallback` when the checked
/// expression and the true branch spell the same code.
pub struct TernaryToNullCoalescing;

impl TernaryToNullCoalescing {
    fn matches(node: &Node) -> bool {
        let Some((cond, then, _)) = matcher::ternary_parts(node) else {
            return false;
        };
        matcher::isset_argument(cond).is_some_and(|subject| matcher::same_code(subject, then))
    }
}

impl Rule for TernaryToNullCoalescing {
    fn id(&self) -> &'static str {
        "ternary-to-null-coalescing"
    }

    fn description(&self) -> &'static str {
        "Replace isset() ternaries with the null coalescing operator"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php70)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        Self::matches(node)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some((_, then, other)) = matcher::ternary_parts(node) else {
            return Rewrite::Unchanged;
        };
        Rewrite::Replace(Node::synthetic(
            NodeKind::Binary,
            vec![
                printer::atom_or_parenthesized(then),
                Node::token("??"),
                printer::atom_or_parenthesized(other),
            ],
        ))
    }
}

/// `$x ? $x : $fallback` to `$x ?: $fallback`, only for conditions that are
/// plain fetches.
pub struct TernaryToElvis;

impl Rule for TernaryToElvis {
    fn id(&self) -> &'static str {
        "ternary-to-elvis"
    }

    fn description(&self) -> &'static str {
        "Collapse self-repeating ternaries into the elvis operator"
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        let Some((cond, then, _)) = matcher::ternary_parts(node) else {
            return false;
        };
        is_pure_fetch(cond) && matcher::same_code(cond, then)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some((cond, _, other)) = matcher::ternary_parts(node) else {
            return Rewrite::Unchanged;
        };
        Rewrite::Replace(Node::synthetic(
            NodeKind::Conditional,
            vec![
                cond.clone(),
                Node::token("?:"),
                printer::atom_or_parenthesized(other),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::rules::testing::run_rules;

    #[test]
    fn isset_ternary_collapses() {
        let (out, changes, _) = run_rules(
            "<?php\n$name = isset($input['name']) ? $input['name'] : 'anonymous';\n",
            vec![Arc::new(super::TernaryToNullCoalescing)],
        );
        assert_eq!(out, "<?php\n$name = $input['name'] ?? 'anonymous';\n");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "ternary-to-null-coalescing");
    }

    #[test]
    fn mismatched_branch_is_kept() {
        let source = "<?php\n$name = isset($input['name']) ? $input['id'] : 'anonymous';\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::TernaryToNullCoalescing)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn multi_argument_isset_is_kept() {
        let source = "<?php\n$v = isset($a, $b) ? $a : null;\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::TernaryToNullCoalescing)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn concat_fallback_is_parenthesized() {
        let (out, _, _) = run_rules(
            "<?php\n$v = isset($a) ? $a : $prefix . $suffix;\n",
            vec![Arc::new(super::TernaryToNullCoalescing)],
        );
        assert_eq!(out, "<?php\n$v = $a ?? ($prefix . $suffix);\n");
    }

    #[test]
    fn self_ternary_becomes_elvis() {
        let (out, changes, _) = run_rules(
            "<?php\n$title = $row['title'] ? $row['title'] : 'untitled';\n",
            vec![Arc::new(super::TernaryToElvis)],
        );
        assert_eq!(out, "<?php\n$title = $row['title'] ?: 'untitled';\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn call_condition_is_not_collapsed() {
        let source = "<?php\n$v = load() ? load() : $default;\n";
        let (out, changes, _) = run_rules(source, vec![Arc::new(super::TernaryToElvis)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn existing_elvis_is_untouched() {
        let source = "<?php\n$v = $a ?: $b;\n";
        let (out, changes, _) = run_rules(source, vec![Arc::new(super::TernaryToElvis)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }
}
