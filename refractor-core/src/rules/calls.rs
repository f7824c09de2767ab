//! Rules that rewrite well-known function calls.

use std::ptr;

use crate::matcher;
use crate::printer;
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::rules::{parenthesized, rename_call};
use crate::tree::{Node, NodeKind};
use crate::version::PhpVersion;

/// Binary operators that bind looser than a comparison, so a comparison can
/// be inserted under them without parentheses.
const LOOSER_THAN_COMPARISON: &[&str] = &["&&", "||", "and", "or", "xor", "??"];

/// Whether replacing `node` with a bare binary comparison would change how the
/// surrounding expression groups.
fn comparison_needs_parens(ctx: &RuleContext<'_>) -> bool {
    match ctx.parent() {
        Some(parent) if parent.kind == NodeKind::Unary => true,
        Some(parent) if parent.kind == NodeKind::Binary => {
            let op = matcher::operator(parent);
            !op.is_some_and(|op| LOOSER_THAN_COMPARISON.contains(&op))
        }
        _ => false,
    }
}

/// `is_null($x)` to `$x === null`, parenthesized where the caller binds
/// tighter than the comparison.
pub struct IsNullToIdentical;

impl Rule for IsNullToIdentical {
    fn id(&self) -> &'static str {
        "is-null-to-identical"
    }

    fn description(&self) -> &'static str {
        "Replace is_null() calls with strict null comparison"
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        matcher::is_call_named(node, "is_null")
            && matcher::plain_arguments(node).is_some_and(|args| args.len() == 1)
    }

    fn rewrite(&self, node: &Node, ctx: &RuleContext<'_>) -> Rewrite {
        let Some(args) = matcher::plain_arguments(node) else {
            return Rewrite::Unchanged;
        };
        let [subject] = args.as_slice() else {
            return Rewrite::Unchanged;
        };
        let comparison = Node::synthetic(
            NodeKind::Binary,
            vec![
                printer::atom_or_parenthesized(subject),
                Node::token("==="),
                Node::leaf(NodeKind::NullLit, "null"),
            ],
        );
        if comparison_needs_parens(ctx) {
            Rewrite::Replace(parenthesized(comparison))
        } else {
            Rewrite::Replace(comparison)
        }
    }
}

/// `sizeof()` is an alias of `count()`; prefer the canonical name.
pub struct SizeofToCount;

impl Rule for SizeofToCount {
    fn id(&self) -> &'static str {
        "sizeof-to-count"
    }

    fn description(&self) -> &'static str {
        "Replace the sizeof() alias with count()"
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        matcher::is_call_named(node, "sizeof")
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        match rename_call(node, "count") {
            Some(replacement) => Rewrite::Replace(replacement),
            None => Rewrite::Unchanged,
        }
    }
}

/// `join()` is an alias of `implode()`; prefer the canonical name.
pub struct JoinToImplode;

impl Rule for JoinToImplode {
    fn id(&self) -> &'static str {
        "join-to-implode"
    }

    fn description(&self) -> &'static str {
        "Replace the join() alias with implode()"
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        matcher::is_call_named(node, "join")
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        match rename_call(node, "implode") {
            Some(replacement) => Rewrite::Replace(replacement),
            None => Rewrite::Unchanged,
        }
    }
}

/// Bounded `rand($min, $max)` and `mt_rand($min, $max)` to the CSPRNG-backed
/// `random_int($min, $max)`. The zero-argument forms have no direct
/// equivalent and are kept.
pub struct RandToRandomInt;

impl Rule for RandToRandomInt {
    fn id(&self) -> &'static str {
        "rand-to-random-int"
    }

    fn description(&self) -> &'static str {
        "Replace bounded rand()/mt_rand() with random_int()"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php70)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        (matcher::is_call_named(node, "rand") || matcher::is_call_named(node, "mt_rand"))
            && matcher::plain_arguments(node).is_some_and(|args| args.len() == 2)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        match rename_call(node, "random_int") {
            Some(replacement) => Rewrite::Replace(replacement),
            None => Rewrite::Unchanged,
        }
    }
}

/// `pow($a, $b)` to `$a ** $b`. Because `**` is right-associative, a call in
/// the left operand of an outer `**` keeps explicit parentheses.
pub struct PowToExponentiation;

impl PowToExponentiation {
    fn needs_parens(node: &Node, ctx: &RuleContext<'_>) -> bool {
        let Some(parent) = ctx.parent() else {
            return false;
        };
        if parent.kind != NodeKind::Binary {
            return false;
        }
        let is_pow = matcher::operator(parent).is_some_and(|op| op == "**");
        is_pow
            && parent
                .significant_children()
                .next()
                .is_some_and(|first| ptr::eq(first, node))
    }
}

impl Rule for PowToExponentiation {
    fn id(&self) -> &'static str {
        "pow-to-exponentiation"
    }

    fn description(&self) -> &'static str {
        "Replace pow() calls with the ** operator"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php56)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        matcher::is_call_named(node, "pow")
            && matcher::plain_arguments(node).is_some_and(|args| args.len() == 2)
    }

    fn rewrite(&self, node: &Node, ctx: &RuleContext<'_>) -> Rewrite {
        let Some(args) = matcher::plain_arguments(node) else {
            return Rewrite::Unchanged;
        };
        let [base, exponent] = args.as_slice() else {
            return Rewrite::Unchanged;
        };
        let power = Node::synthetic(
            NodeKind::Binary,
            vec![
                printer::atom_or_parenthesized(base),
                Node::token("**"),
                printer::atom_or_parenthesized(exponent),
            ],
        );
        if Self::needs_parens(node, ctx) {
            Rewrite::Replace(parenthesized(power))
        } else {
            Rewrite::Replace(power)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::rules::testing::run_rules;

    #[test]
    fn is_null_in_condition() {
        let (out, changes, _) = run_rules(
            "<?php\nif (is_null($user)) {\n    return;\n}\n",
            vec![Arc::new(super::IsNullToIdentical)],
        );
        assert_eq!(out, "<?php\nif ($user === null) {\n    return;\n}\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn negated_is_null_gains_parens() {
        let (out, _, _) = run_rules(
            "<?php\nif (!is_null($user)) {\n    work();\n}\n",
            vec![Arc::new(super::IsNullToIdentical)],
        );
        assert_eq!(out, "<?php\nif (!($user === null)) {\n    work();\n}\n");
    }

    #[test]
    fn is_null_under_boolean_and_stays_bare() {
        let (out, _, _) = run_rules(
            "<?php\n$ok = $ready && is_null($err);\n",
            vec![Arc::new(super::IsNullToIdentical)],
        );
        assert_eq!(out, "<?php\n$ok = $ready && $err === null;\n");
    }

    #[test]
    fn is_null_of_coalesce_parenthesizes_operand() {
        let (out, _, _) = run_rules(
            "<?php\n$f = is_null($a ?? $b);\n",
            vec![Arc::new(super::IsNullToIdentical)],
        );
        assert_eq!(out, "<?php\n$f = ($a ?? $b) === null;\n");
    }

    #[test]
    fn sizeof_renamed_with_gap_kept() {
        let (out, changes, _) = run_rules(
            "<?php\n$n = sizeof ($rows);\n",
            vec![Arc::new(super::SizeofToCount)],
        );
        assert_eq!(out, "<?php\n$n = count ($rows);\n");
        assert_eq!(changes[0].before, "sizeof ($rows)");
        assert_eq!(changes[0].after, "count ($rows)");
    }

    #[test]
    fn join_renamed() {
        let (out, _, _) = run_rules(
            "<?php\n$s = join(', ', $parts);\n",
            vec![Arc::new(super::JoinToImplode)],
        );
        assert_eq!(out, "<?php\n$s = implode(', ', $parts);\n");
    }

    #[test]
    fn bounded_rand_becomes_random_int() {
        let (out, _, _) = run_rules(
            "<?php\n$d = mt_rand(1, 6);\n",
            vec![Arc::new(super::RandToRandomInt)],
        );
        assert_eq!(out, "<?php\n$d = random_int(1, 6);\n");
    }

    #[test]
    fn unbounded_rand_is_kept() {
        let source = "<?php\n$d = rand();\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RandToRandomInt)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn pow_becomes_operator() {
        let (out, _, _) = run_rules(
            "<?php\n$v = pow($base, $exp + 1);\n",
            vec![Arc::new(super::PowToExponentiation)],
        );
        assert_eq!(out, "<?php\n$v = $base ** ($exp + 1);\n");
    }

    #[test]
    fn pow_in_left_operand_of_power_keeps_parens() {
        let (out, _, _) = run_rules(
            "<?php\n$v = pow(2, 3) ** $n;\n",
            vec![Arc::new(super::PowToExponentiation)],
        );
        assert_eq!(out, "<?php\n$v = (2 ** 3) ** $n;\n");
    }
}
