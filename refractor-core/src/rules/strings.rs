//! String helper rules that replace strpos() comparison idioms.

use crate::matcher;
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::rules::rename_call;
use crate::tree::{Node, NodeKind};
use crate::version::PhpVersion;

fn is_two_arg_strpos(node: &Node) -> bool {
    matcher::is_call_named(node, "strpos")
        && matcher::plain_arguments(node).is_some_and(|args| args.len() == 2)
}

/// Matches `strpos(...) === sentinel` and its mirrored and negated forms.
/// Returns the call and whether the comparison was `===`.
fn strpos_compared<'t>(
    node: &'t Node,
    sentinel: impl Fn(&Node) -> bool,
) -> Option<(&'t Node, bool)> {
    if node.kind != NodeKind::Binary {
        return None;
    }
    let identical = match matcher::operator(node)? {
        "===" => true,
        "!==" => false,
        _ => return None,
    };
    let operands: Vec<&Node> = node.significant_children().collect();
    let [left, right] = operands.as_slice() else {
        return None;
    };
    let (call, literal) = if is_two_arg_strpos(left) {
        (*left, *right)
    } else if is_two_arg_strpos(right) {
        (*right, *left)
    } else {
        return None;
    };
    if sentinel(literal) {
        Some((call, identical))
    } else {
        None
    }
}

fn is_false_literal(node: &Node) -> bool {
    node.kind == NodeKind::BoolLit
        && node
            .text
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("false"))
}

fn is_zero_literal(node: &Node) -> bool {
    node.kind == NodeKind::IntLit && node.text.as_deref() == Some("0")
}

fn negate(call: Node) -> Node {
    Node::synthetic(NodeKind::Unary, vec![Node::token("!"), call])
}

/// `strpos($h, $n) !== false` to `str_contains($h, $n)`, and the `===`
/// variant to its negation. The three-argument offset form is left alone.
pub struct StrContains;

impl Rule for StrContains {
    fn id(&self) -> &'static str {
        "str-contains"
    }

    fn description(&self) -> &'static str {
        "Replace strpos() false-comparisons with str_contains()"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php80)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        strpos_compared(node, is_false_literal).is_some()
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some((call, identical)) = strpos_compared(node, is_false_literal) else {
            return Rewrite::Unchanged;
        };
        let Some(contains) = rename_call(call, "str_contains") else {
            return Rewrite::Unchanged;
        };
        if identical {
            Rewrite::Replace(negate(contains))
        } else {
            Rewrite::Replace(contains)
        }
    }
}

/// `strpos($h, $n) === 0` to `str_starts_with($h, $n)`. The comparison
/// already treats a not-found `false` as a mismatch, so the forms are
/// equivalent.
pub struct StrStartsWith;

impl Rule for StrStartsWith {
    fn id(&self) -> &'static str {
        "str-starts-with"
    }

    fn description(&self) -> &'static str {
        "Replace strpos() zero-comparisons with str_starts_with()"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php80)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        strpos_compared(node, is_zero_literal).is_some()
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some((call, identical)) = strpos_compared(node, is_zero_literal) else {
            return Rewrite::Unchanged;
        };
        let Some(starts) = rename_call(call, "str_starts_with") else {
            return Rewrite::Unchanged;
        };
        if identical {
            Rewrite::Replace(starts)
        } else {
            Rewrite::Replace(negate(starts))
        }
    }
}
