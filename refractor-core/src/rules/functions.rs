//! Function and method declaration rules.

use std::ptr;

use crate::matcher::{self, declared_name};
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::tree::{Node, NodeKind, TypeHint};
use crate::version::PhpVersion;

/// Nodes that open their own function scope. Scans for returns, argument
/// helpers, and variables stop here.
fn own_scope(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::FunctionDefinition
            | NodeKind::MethodDeclaration
            | NodeKind::Closure
            | NodeKind::ArrowFunction
    )
}

/// True when `pred` holds for a node in the same function scope as `body`.
fn scope_has(body: &Node, pred: &impl Fn(&Node) -> bool) -> bool {
    for child in &body.children {
        if pred(child) {
            return true;
        }
        if own_scope(child.kind) {
            continue;
        }
        if scope_has(child, pred) {
            return true;
        }
    }
    false
}

fn is_variable_named(node: &Node, name: &str) -> bool {
    if node.kind != NodeKind::Variable {
        return false;
    }
    if let Some(text) = &node.text {
        return text.strip_prefix('$') == Some(name);
    }
    node.children
        .iter()
        .any(|c| c.kind == NodeKind::Name && c.text.as_deref() == Some(name))
}

fn parameters_of(node: &Node) -> Option<&Node> {
    node.child_by_field("parameters")
        .or_else(|| node.child_of_kind(NodeKind::FormalParameters))
}

fn body_of(node: &Node) -> Option<&Node> {
    node.child_by_field("body")
        .or_else(|| node.child_of_kind(NodeKind::CompoundStatement))
}

/// Parameterless functions that read their inputs through `func_get_args()`
/// become `...$args` variadics. Declared in the signature, the arguments
/// regain a name and a spread form callers can see.
pub struct VariadicParameters;

impl VariadicParameters {
    fn is_get_args(node: &Node) -> bool {
        matcher::is_call_named(node, "func_get_args")
    }

    fn blocks_rewrite(node: &Node) -> bool {
        matcher::is_call_named(node, "func_num_args")
            || matcher::is_call_named(node, "func_get_arg")
            || is_variable_named(node, "args")
    }

    fn substitute(node: &Node) -> Node {
        if Self::is_get_args(node) {
            return Node::leaf(NodeKind::Variable, "$args");
        }
        if own_scope(node.kind) {
            return node.clone();
        }
        Node {
            kind: node.kind,
            grammar: node.grammar,
            field: node.field,
            span: node.span,
            text: node.text.clone(),
            hint: node.hint,
            children: node.children.iter().map(Self::substitute).collect(),
        }
    }
}

impl Rule for VariadicParameters {
    fn id(&self) -> &'static str {
        "variadic-parameters"
    }

    fn description(&self) -> &'static str {
        "Declare ...$args for functions built on func_get_args()"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php56)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        if !matches!(
            node.kind,
            NodeKind::FunctionDefinition | NodeKind::MethodDeclaration
        ) {
            return false;
        }
        let Some(params) = parameters_of(node) else {
            return false;
        };
        let Some(body) = body_of(node) else {
            return false;
        };
        params.significant_children().count() == 0
            && scope_has(body, &Self::is_get_args)
            && !scope_has(body, &Self::blocks_rewrite)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some(params) = parameters_of(node) else {
            return Rewrite::Unchanged;
        };
        let Some(body) = body_of(node) else {
            return Rewrite::Unchanged;
        };
        let new_params = Node::synthetic(
            NodeKind::FormalParameters,
            vec![
                Node::token("("),
                Node::leaf(NodeKind::VariadicParameter, "...$args"),
                Node::token(")"),
            ],
        );
        let children = node
            .children
            .iter()
            .map(|child| {
                if ptr::eq(child, params) {
                    new_params.clone()
                } else if ptr::eq(child, body) {
                    Self::substitute(body)
                } else {
                    child.clone()
                }
            })
            .collect();
        Rewrite::Replace(Node::synthetic(node.kind, children))
    }
}

/// Single-expression closures become arrow functions. The `use` clause goes
/// away; arrow functions capture by value on their own. By-reference
/// captures and bodies carrying comments are left alone.
pub struct ClosureToArrowFunction;

impl ClosureToArrowFunction {
    fn return_expression(body: &Node) -> Option<&Node> {
        let mut statements = body.significant_children();
        let only = statements.next()?;
        if statements.next().is_some() || only.kind != NodeKind::Return {
            return None;
        }
        if body.children.iter().any(|c| c.kind == NodeKind::Comment)
            || only.children.iter().any(|c| c.kind == NodeKind::Comment)
        {
            return None;
        }
        let mut parts = only.significant_children();
        let expr = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if matcher::any_descendant(expr, |n| n.grammar.starts_with("yield")) {
            return None;
        }
        Some(expr)
    }

    fn captures_by_reference(node: &Node) -> bool {
        let direct_amp = node
            .children
            .iter()
            .any(|c| c.kind == NodeKind::Token && c.text.as_deref() == Some("&"));
        let use_amp = node.child_of_kind(NodeKind::UseClause).is_some_and(|uses| {
            matcher::any_descendant(uses, |n| {
                n.kind == NodeKind::Token && n.text.as_deref() == Some("&")
            })
        });
        direct_amp || use_amp
    }
}

impl Rule for ClosureToArrowFunction {
    fn id(&self) -> &'static str {
        "closure-to-arrow-function"
    }

    fn description(&self) -> &'static str {
        "Rewrite single-return closures as arrow functions"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php74)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        if node.kind != NodeKind::Closure || Self::captures_by_reference(node) {
            return false;
        }
        body_of(node).is_some_and(|body| Self::return_expression(body).is_some())
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some(body) = body_of(node) else {
            return Rewrite::Unchanged;
        };
        let Some(expr) = Self::return_expression(body) else {
            return Rewrite::Unchanged;
        };
        let mut children = Vec::with_capacity(node.children.len() + 1);
        for child in &node.children {
            if child.kind == NodeKind::Token && child.text.as_deref() == Some("function") {
                match child.span {
                    Some(span) => children.push(Node::token_at("fn", span)),
                    None => children.push(Node::token("fn")),
                }
            } else if child.kind == NodeKind::UseClause {
                continue;
            } else if ptr::eq(child, body) {
                children.push(Node::token("=>"));
                children.push(expr.clone());
            } else {
                children.push(child.clone());
            }
        }
        Rewrite::Replace(Node::synthetic(NodeKind::ArrowFunction, children))
    }
}

/// Adds `: void` to functions and methods that never return a value. Magic
/// methods and anything containing `yield` keep their signatures.
pub struct AddVoidReturnType;

impl AddVoidReturnType {
    fn has_value_return(body: &Node) -> bool {
        scope_has(body, &|n: &Node| {
            n.kind == NodeKind::Return && n.significant_children().next().is_some()
        })
    }

    fn has_yield(body: &Node) -> bool {
        scope_has(body, &|n: &Node| n.grammar.starts_with("yield"))
    }
}

impl Rule for AddVoidReturnType {
    fn id(&self) -> &'static str {
        "add-void-return-type"
    }

    fn description(&self) -> &'static str {
        "Declare : void on functions that never return a value"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php71)
    }

    fn applies(&self, node: &Node, _ctx: &RuleContext<'_>) -> bool {
        if !matches!(
            node.kind,
            NodeKind::FunctionDefinition | NodeKind::MethodDeclaration
        ) {
            return false;
        }
        let already_typed = node.children.iter().any(|c| {
            c.kind == NodeKind::TypeNode
                || (c.kind == NodeKind::Token && c.text.as_deref() == Some(":"))
        });
        if already_typed {
            return false;
        }
        if declared_name(node).is_some_and(crate::php::is_magic_method) {
            return false;
        }
        let Some(body) = body_of(node) else {
            return false;
        };
        !Self::has_value_return(body) && !Self::has_yield(body)
    }

    fn rewrite(&self, node: &Node, _ctx: &RuleContext<'_>) -> Rewrite {
        let Some(params) = parameters_of(node) else {
            return Rewrite::Unchanged;
        };
        let mut children = Vec::with_capacity(node.children.len() + 1);
        for child in &node.children {
            children.push(child.clone());
            if ptr::eq(child, params) {
                children.push(Node::token(": void"));
            }
        }
        Rewrite::Replace(Node::synthetic(node.kind, children))
    }
}

/// Gives an untyped property a native type when every write agrees on one:
/// the default value, constructor assignments from typed parameters, and any
/// other `$this->prop = ...` in the class.
pub struct TypedPropertyFromLiteral;

impl TypedPropertyFromLiteral {
    fn property_elements<'t>(node: &'t Node) -> Vec<&'t Node> {
        node.children
            .iter()
            .filter(|c| c.grammar == "property_element")
            .collect()
    }

    fn property_name<'t>(element: &'t Node) -> Option<&'t str> {
        let variable = element.child_of_kind(NodeKind::Variable)?;
        if let Some(text) = &variable.text {
            return text.strip_prefix('$');
        }
        variable
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Name)
            .and_then(|c| c.text.as_deref())
    }

    fn constructor_parameter_hints<'t>(class: &'t Node) -> Vec<(&'t str, TypeHint)> {
        let Some(ctor) = matcher::find_descendant(class, |n| {
            n.kind == NodeKind::MethodDeclaration
                && declared_name(n).is_some_and(|name| name.eq_ignore_ascii_case("__construct"))
        }) else {
            return Vec::new();
        };
        let Some(params) = parameters_of(ctor) else {
            return Vec::new();
        };
        params
            .significant_children()
            .filter(|p| p.kind == NodeKind::Parameter)
            .filter_map(|p| {
                let hint = p.hint?;
                let name = p
                    .child_of_kind(NodeKind::Variable)
                    .and_then(Self::variable_basename)?;
                Some((name, hint))
            })
            .collect()
    }

    fn variable_basename<'t>(variable: &'t Node) -> Option<&'t str> {
        if let Some(text) = &variable.text {
            return text.strip_prefix('$');
        }
        variable
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Name)
            .and_then(|c| c.text.as_deref())
    }

    /// The member name written by `$this->name = ...`, if `target` has that
    /// shape. A dynamic member write returns the marker `Err(())`.
    fn this_member_write(target: &Node) -> Result<Option<&str>, ()> {
        if target.kind != NodeKind::MemberAccess {
            return Ok(None);
        }
        let mut parts = target.significant_children();
        let (Some(object), Some(member)) = (parts.next(), parts.next()) else {
            return Ok(None);
        };
        if !is_variable_named(object, "this") {
            return Ok(None);
        }
        match member.kind {
            NodeKind::Name => Ok(member.text.as_deref()),
            _ => Err(()),
        }
    }

    fn expression_hint(expr: &Node, params: &[(&str, TypeHint)]) -> Option<TypeHint> {
        if let Some(hint) = expr.hint {
            return Some(hint);
        }
        if expr.kind == NodeKind::Variable {
            let name = Self::variable_basename(expr)?;
            return params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, hint)| *hint);
        }
        None
    }

    /// Every hint the class provides for the property. `None` means some
    /// write could not be typed and the property must stay as it is.
    fn gather_hints(
        element: &Node,
        name: &str,
        class: &Node,
    ) -> Option<Vec<TypeHint>> {
        let mut hints = Vec::new();

        let element_parts: Vec<&Node> = element.significant_children().collect();
        match element_parts.as_slice() {
            [_variable] => {}
            [_variable, default] => hints.push(Self::expression_hint(default, &[])?),
            _ => return None,
        }

        let params = Self::constructor_parameter_hints(class);
        for method in class
            .descendants()
            .filter(|n| n.kind == NodeKind::MethodDeclaration)
        {
            // Parameter hints only hold inside the constructor; elsewhere a
            // same-named variable is unrelated.
            let in_ctor = declared_name(method)
                .is_some_and(|n| n.eq_ignore_ascii_case("__construct"));
            let scope: &[(&str, TypeHint)] = if in_ctor { &params } else { &[] };

            for node in method.descendants() {
                let target = match node.kind {
                    NodeKind::Assignment => node.significant_children().next(),
                    NodeKind::AugmentedAssignment => {
                        let target = node.significant_children().next();
                        match target.map(Self::this_member_write) {
                            Some(Ok(Some(member))) if member == name => return None,
                            Some(Err(())) => return None,
                            _ => continue,
                        }
                    }
                    _ => continue,
                };
                let Some(target) = target else {
                    continue;
                };
                match Self::this_member_write(target) {
                    Ok(Some(member)) if member == name => {
                        let rhs = node.significant_children().nth(1)?;
                        hints.push(Self::expression_hint(rhs, scope)?);
                    }
                    Ok(_) => {}
                    Err(()) => return None,
                }
            }
        }
        Some(hints)
    }

    fn resolved_declaration(node: &Node, ctx: &RuleContext<'_>) -> Option<&'static str> {
        if node.kind != NodeKind::PropertyDeclaration {
            return None;
        }
        if node.children.iter().any(|c| c.kind == NodeKind::TypeNode) {
            return None;
        }
        let skip_modifier = node.children.iter().any(|c| {
            c.kind == NodeKind::Modifier
                && matches!(c.text.as_deref(), Some("static") | Some("var"))
        });
        if skip_modifier {
            return None;
        }
        let elements = Self::property_elements(node);
        let [element] = elements.as_slice() else {
            return None;
        };
        let name = Self::property_name(element)?;
        let class = ctx
            .ancestors
            .iter()
            .rev()
            .find(|a| a.kind == NodeKind::ClassDeclaration)?;
        let hints = Self::gather_hints(element, name, class)?;
        let first = *hints.first()?;
        if hints.iter().any(|h| *h != first) {
            return None;
        }
        if matches!(first, TypeHint::Null | TypeHint::Mixed) {
            return None;
        }
        first.declaration()
    }
}

impl Rule for TypedPropertyFromLiteral {
    fn id(&self) -> &'static str {
        "typed-property-from-assignments"
    }

    fn description(&self) -> &'static str {
        "Type untyped properties whose writes agree on a native type"
    }

    fn min_version(&self) -> Option<PhpVersion> {
        Some(PhpVersion::Php74)
    }

    fn applies(&self, node: &Node, ctx: &RuleContext<'_>) -> bool {
        Self::resolved_declaration(node, ctx).is_some()
    }

    fn rewrite(&self, node: &Node, ctx: &RuleContext<'_>) -> Rewrite {
        let Some(declaration) = Self::resolved_declaration(node, ctx) else {
            return Rewrite::Unchanged;
        };
        let elements = Self::property_elements(node);
        let [element] = elements.as_slice() else {
            return Rewrite::Unchanged;
        };
        let element = *element;
        let mut children = Vec::with_capacity(node.children.len() + 1);
        for child in &node.children {
            if ptr::eq(child, element) {
                children.push(Node::token(declaration));
            }
            children.push(child.clone());
        }
        Rewrite::Replace(Node::synthetic(NodeKind::PropertyDeclaration, children))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::rules::testing::run_rules;

    #[test]
    fn func_get_args_becomes_variadic() {
        let (out, changes, _) = run_rules(
            "<?php\nfunction sum() {\n    return array_sum(func_get_args());\n}\n",
            vec![Arc::new(super::VariadicParameters)],
        );
        assert_eq!(
            out,
            "<?php\nfunction sum(...$args) {\n    return array_sum($args);\n}\n"
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "variadic-parameters");
    }

    #[test]
    fn existing_args_variable_blocks_variadic() {
        let source = "<?php\nfunction f() {\n    $args = func_get_args();\n    return $args;\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::VariadicParameters)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn func_num_args_blocks_variadic() {
        let source =
            "<?php\nfunction f() {\n    if (func_num_args() > 1) {\n        return func_get_args();\n    }\n    return [];\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::VariadicParameters)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn nested_closure_args_stay_put() {
        let source =
            "<?php\nfunction outer() {\n    return function () {\n        return func_get_args();\n    };\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::VariadicParameters)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn declared_parameters_block_variadic() {
        let source = "<?php\nfunction f($first) {\n    return func_get_args();\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::VariadicParameters)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn single_return_closure_becomes_arrow() {
        let (out, changes, _) = run_rules(
            "<?php\n$double = function ($x) {\n    return $x * 2;\n};\n",
            vec![Arc::new(super::ClosureToArrowFunction)],
        );
        assert_eq!(out, "<?php\n$double = fn ($x) => $x * 2;\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn use_clause_is_absorbed() {
        let (out, _, _) = run_rules(
            "<?php\n$scale = function ($x) use ($factor) {\n    return $x * $factor;\n};\n",
            vec![Arc::new(super::ClosureToArrowFunction)],
        );
        assert_eq!(out, "<?php\n$scale = fn ($x) => $x * $factor;\n");
    }

    #[test]
    fn by_reference_capture_is_kept() {
        let source =
            "<?php\n$push = function ($x) use (&$total) {\n    return $total += $x;\n};\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::ClosureToArrowFunction)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn multi_statement_closure_is_kept() {
        let source =
            "<?php\n$f = function ($x) {\n    $y = $x + 1;\n    return $y;\n};\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::ClosureToArrowFunction)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn void_added_to_procedure() {
        let (out, changes, _) = run_rules(
            "<?php\nfunction notify($msg) {\n    echo $msg;\n}\n",
            vec![Arc::new(super::AddVoidReturnType)],
        );
        assert_eq!(out, "<?php\nfunction notify($msg): void {\n    echo $msg;\n}\n");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn value_return_blocks_void() {
        let source = "<?php\nfunction pick() {\n    return 1;\n}\n";
        let (out, changes, _) = run_rules(source, vec![Arc::new(super::AddVoidReturnType)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn bare_return_still_gets_void() {
        let (out, _, _) = run_rules(
            "<?php\nfunction bail($err) {\n    if ($err) {\n        return;\n    }\n    log_it($err);\n}\n",
            vec![Arc::new(super::AddVoidReturnType)],
        );
        assert_eq!(
            out,
            "<?php\nfunction bail($err): void {\n    if ($err) {\n        return;\n    }\n    log_it($err);\n}\n"
        );
    }

    #[test]
    fn value_return_in_nested_closure_is_fine() {
        let (out, _, _) = run_rules(
            "<?php\nfunction wire() {\n    $h = function () {\n        return 1;\n    };\n    on('tick', $h);\n}\n",
            vec![Arc::new(super::AddVoidReturnType)],
        );
        assert!(out.contains("function wire(): void {"));
    }

    #[test]
    fn magic_methods_keep_their_signature() {
        let source =
            "<?php\nclass A\n{\n    public function __construct()\n    {\n        $this->boot();\n    }\n}\n";
        let (out, changes, _) = run_rules(source, vec![Arc::new(super::AddVoidReturnType)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn generators_keep_their_signature() {
        let source = "<?php\nfunction ticks() {\n    yield 1;\n}\n";
        let (out, changes, _) = run_rules(source, vec![Arc::new(super::AddVoidReturnType)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn property_typed_from_default() {
        let (out, changes, _) = run_rules(
            "<?php\nclass Counter\n{\n    private $count = 0;\n}\n",
            vec![Arc::new(super::TypedPropertyFromLiteral)],
        );
        assert_eq!(
            out,
            "<?php\nclass Counter\n{\n    private int $count = 0;\n}\n"
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "typed-property-from-assignments");
    }

    #[test]
    fn property_typed_from_constructor_parameter() {
        let (out, _, _) = run_rules(
            "<?php\nclass User\n{\n    private $name;\n\n    public function __construct(string $name)\n    {\n        $this->name = $name;\n    }\n}\n",
            vec![Arc::new(super::TypedPropertyFromLiteral)],
        );
        assert!(out.contains("private string $name;"));
    }

    #[test]
    fn disagreeing_writes_leave_property_untyped() {
        let source =
            "<?php\nclass Box\n{\n    private $value = 0;\n\n    public function fill()\n    {\n        $this->value = 'full';\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::TypedPropertyFromLiteral)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }

    #[test]
    fn untyped_write_leaves_property_untyped() {
        let source =
            "<?php\nclass Box\n{\n    private $value = 0;\n\n    public function fill($raw)\n    {\n        $this->value = $raw;\n    }\n}\n";
        let (out, changes, _) =
            run_rules(source, vec![Arc::new(super::TypedPropertyFromLiteral)]);
        assert_eq!(out, source);
        assert!(changes.is_empty());
    }
}
