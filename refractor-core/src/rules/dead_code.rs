//! Dead code removal rules.

use crate::matcher::{self, declared_name};
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::tree::{Node, NodeKind};

/// Statements after which control never continues in the same block.
fn is_terminator(node: &Node) -> bool {
    match node.grammar {
        // The grammar spells throw as a statement or an expression depending
        // on the release; accept both.
        "return_statement" | "break_statement" | "continue_statement"
        | "throw_statement" => true,
        "expression_statement" => node
            .significant_children()
            .next()
            .is_some_and(|e| e.grammar == "throw_expression"),
        _ => false,
    }
}

/// Statement shapes that are safe to drop. Function and class declarations
/// are reachable by name regardless of control flow and stay out.
fn is_removable_statement(node: &Node) -> bool {
    matches!(
        node.grammar,
        "expression_statement"
            | "echo_statement"
            | "return_statement"
            | "if_statement"
            | "for_statement"
            | "foreach_statement"
            | "while_statement"
            | "do_statement"
            | "switch_statement"
            | "try_statement"
            | "empty_statement"
            | "unset_statement"
            | "compound_statement"
            | "break_statement"
            | "continue_statement"
            | "throw_statement"
            | "global_declaration"
            | "function_static_declaration"
    )
}

/// Removes statements that directly follow a `return`, `throw`, `break`, or
/// `continue` in the same block. Each pass peels one statement; repeated
/// passes drain the rest. Blocks that play goto games are left alone.
pub struct RemoveUnreachableStatement;

impl Rule for RemoveUnreachableStatement {
    fn id(&self) -> &'static str {
        "remove-unreachable-statement"
    }

    fn description(&self) -> &'static str {
        "Drop statements that can never execute"
    }

    fn applies(&self, node: &Node, ctx: &RuleContext<'_>) -> bool {
        let Some(parent) = ctx.parent() else {
            return false;
        };
        parent.kind == NodeKind::CompoundStatement
            && is_removable_statement(node)
            && ctx
                .prev_significant_sibling(node)
                .is_some_and(is_terminator)
            && !matcher::any_descendant(parent, |n| {
                matches!(n.grammar, "named_label_statement" | "goto_statement")
            })
    }

    fn rewrite(&self, _node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        Rewrite::Remove
    }
}

/// Removes private methods nothing in the class calls. Any hint of dynamic
/// dispatch in the class disables the rule for all of it.
pub struct RemoveUnusedPrivateMethod;

impl RemoveUnusedPrivateMethod {
    fn member_callee<'t>(node: &'t Node) -> Option<&'t Node> {
        if !matches!(node.kind, NodeKind::MemberCall | NodeKind::ScopedCall) {
            return None;
        }
        node.child_by_field("name")
            .or_else(|| node.significant_children().nth(1))
    }

    fn has_dynamic_dispatch(class: &Node, method_name: &str) -> bool {
        matcher::any_descendant(class, |n| {
            if let Some(callee) = Self::member_callee(n) {
                if callee.kind != NodeKind::Name {
                    return true;
                }
            }
            if matcher::is_call_named(n, "call_user_func")
                || matcher::is_call_named(n, "call_user_func_array")
                || matcher::is_call_named(n, "method_exists")
                || matcher::is_call_named(n, "is_callable")
            {
                return true;
            }
            // A string literal spelling the method name may be a callable.
            n.kind == NodeKind::StringLit
                && n.text
                    .as_deref()
                    .map(|t| t.trim_matches(|c| c == '\'' || c == '"'))
                    .is_some_and(|inner| inner == method_name)
        })
    }

    fn is_called(class: &Node, method_name: &str) -> bool {
        matcher::any_descendant(class, |n| {
            Self::member_callee(n).is_some_and(|callee| {
                callee.kind == NodeKind::Name
                    && callee
                        .text
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case(method_name))
            })
        })
    }

    fn is_private(node: &Node) -> bool {
        node.children.iter().any(|c| {
            c.kind == NodeKind::Modifier && c.text.as_deref() == Some("private")
        })
    }
}

impl Rule for RemoveUnusedPrivateMethod {
    fn id(&self) -> &'static str {
        "remove-unused-private-method"
    }

    fn description(&self) -> &'static str {
        "Drop private methods without a single caller"
    }

    fn applies(&self, node: &Node, ctx: &RuleContext<'_>) -> bool {
        if node.kind != NodeKind::MethodDeclaration || !Self::is_private(node) {
            return false;
        }
        let Some(name) = declared_name(node) else {
            return false;
        };
        if crate::php::is_magic_method(name) {
            return false;
        }
        let Some(class) = ctx
            .ancestors
            .iter()
            .rev()
            .find(|a| a.kind == NodeKind::ClassDeclaration)
        else {
            return false;
        };
        !Self::has_dynamic_dispatch(class, name) && !Self::is_called(class, name)
    }

    fn rewrite(&self, _node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        Rewrite::Remove
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::rules::testing::run_rules;

    #[test]
    fn statements_after_return_drain_over_passes() {
        let (out, changes, _) = run_rules(
            "<?php\nfunction f() {\n    return 1;\n    work();\n    cleanup();\n}\n",
            vec![Arc::new(super::RemoveUnreachableStatement)],
        );
        assert_eq!(out, "<?php\nfunction f() {\n    return 1;\n}\n");
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.rule_id == "remove-unreachable-statement"));
    }

    #[test]
    fn code_after_continue_is_removed() {
        let (out, _, _) = run_rules(
            "<?php\nwhile ($row = next_row()) {\n    if ($row) {\n        continue;\n        $skipped++;\n    }\n}\n",
            vec![Arc::new(super::RemoveUnreachableStatement)],
        );
        assert_eq!(
            out,
            "<?php\nwhile ($row = next_row()) {\n    if ($row) {\n        continue;\n    }\n}\n"
        );
    }

    #[test]
    fn code_after_throw_is_removed() {
        let (out, _, _) = run_rules(
            "<?php\nfunction f() {\n    throw new RuntimeException('no');\n    cleanup();\n}\n",
            vec![Arc::new(super::RemoveUnreachableStatement)],
        );
        assert_eq!(
            out,
            "<?php\nfunction f() {\n    throw new RuntimeException('no');\n}\n"
        );
    }

    #[test]
    fn goto_targets_disable_removal() {
        let source =
            "<?php\nfunction f() {\n    goto end;\n    return 1;\n    end:\n    return 2;\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnreachableStatement)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn switch_fallthrough_is_untouched() {
        let source =
            "<?php\nswitch ($n) {\n    case 1:\n        break;\n        echo 'dead';\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnreachableStatement)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn function_declaration_survives_unreachable_zone() {
        let source = "<?php\nfunction f() {\n    return 1;\n    function g() {\n        return 2;\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnreachableStatement)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn unused_private_method_is_removed() {
        let (out, changes, _) = run_rules(
            "<?php\nclass Job\n{\n    public function run()\n    {\n        $this->prepare();\n    }\n\n    private function prepare()\n    {\n        init();\n    }\n\n    private function legacy()\n    {\n        old();\n    }\n}\n",
            vec![Arc::new(super::RemoveUnusedPrivateMethod)],
        );
        assert!(!out.contains("legacy"));
        assert!(out.contains("private function prepare()"));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "remove-unused-private-method");
    }

    #[test]
    fn called_private_method_is_kept() {
        let source = "<?php\nclass Job\n{\n    public function run()\n    {\n        $this->step();\n    }\n\n    private function step()\n    {\n        work();\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnusedPrivateMethod)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn dynamic_dispatch_disables_removal() {
        let source = "<?php\nclass Job\n{\n    public function run($m)\n    {\n        $this->$m();\n    }\n\n    private function maybe()\n    {\n        work();\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnusedPrivateMethod)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn string_reference_disables_removal() {
        let source = "<?php\nclass Job\n{\n    public function run()\n    {\n        dispatch([$this, 'later']);\n    }\n\n    private function later()\n    {\n        work();\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnusedPrivateMethod)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn public_methods_are_never_removed() {
        let source = "<?php\nclass Job\n{\n    public function orphan()\n    {\n        work();\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::RemoveUnusedPrivateMethod)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }
}
