//! PHP grammar mapping.
//!
//! Translates tree-sitter-php node kinds into [`NodeKind`] variants and
//! carries the handful of PHP naming facts the rules need. Grammar kinds
//! without a dedicated variant classify as `Other`; their raw kind string
//! stays available on the node.

use crate::tree::{NodeKind, TypeHint};

pub fn classify(grammar_kind: &str) -> NodeKind {
    match grammar_kind {
        "program" => NodeKind::Program,
        "expression_statement" => NodeKind::ExpressionStatement,
        "compound_statement" => NodeKind::CompoundStatement,
        "if_statement" => NodeKind::If,
        "return_statement" => NodeKind::Return,
        "echo_statement" => NodeKind::Echo,
        "empty_statement" => NodeKind::EmptyStatement,
        "function_definition" => NodeKind::FunctionDefinition,
        "method_declaration" => NodeKind::MethodDeclaration,
        "class_declaration" => NodeKind::ClassDeclaration,
        "property_declaration" => NodeKind::PropertyDeclaration,
        "namespace_definition" => NodeKind::NamespaceDefinition,
        "namespace_use_declaration" => NodeKind::NamespaceUse,
        "function_call_expression" => NodeKind::Call,
        "member_call_expression" | "nullsafe_member_call_expression" => NodeKind::MemberCall,
        "scoped_call_expression" => NodeKind::ScopedCall,
        "object_creation_expression" => NodeKind::New,
        "array_creation_expression" => NodeKind::ArrayLiteral,
        "list_literal" => NodeKind::ListLiteral,
        "conditional_expression" => NodeKind::Conditional,
        "binary_expression" => NodeKind::Binary,
        "unary_op_expression" => NodeKind::Unary,
        "assignment_expression" => NodeKind::Assignment,
        "augmented_assignment_expression" => NodeKind::AugmentedAssignment,
        "parenthesized_expression" => NodeKind::Parenthesized,
        "subscript_expression" => NodeKind::Subscript,
        "member_access_expression" | "nullsafe_member_access_expression" => {
            NodeKind::MemberAccess
        }
        "scoped_property_access_expression" => NodeKind::ScopedPropertyAccess,
        // The grammar renamed this node between releases; accept both.
        "anonymous_function_creation_expression" | "anonymous_function" => NodeKind::Closure,
        "arrow_function" => NodeKind::ArrowFunction,
        "variable_name" => NodeKind::Variable,
        "name" => NodeKind::Name,
        "qualified_name" => NodeKind::QualifiedName,
        "string" | "encapsed_string" | "heredoc" | "nowdoc" => NodeKind::StringLit,
        "integer" => NodeKind::IntLit,
        "float" => NodeKind::FloatLit,
        "boolean" => NodeKind::BoolLit,
        "null" => NodeKind::NullLit,
        "formal_parameters" => NodeKind::FormalParameters,
        "simple_parameter" => NodeKind::Parameter,
        "variadic_parameter" => NodeKind::VariadicParameter,
        "property_promotion_parameter" => NodeKind::PropertyPromotionParameter,
        "arguments" => NodeKind::Arguments,
        "argument" => NodeKind::Argument,
        "anonymous_function_use_clause" => NodeKind::UseClause,
        "visibility_modifier" | "static_modifier" | "abstract_modifier" | "final_modifier"
        | "readonly_modifier" | "var_modifier" => NodeKind::Modifier,
        "primitive_type" | "named_type" | "optional_type" | "union_type"
        | "intersection_type" | "disjunctive_normal_form_type" | "bottom_type" => {
            NodeKind::TypeNode
        }
        "comment" => NodeKind::Comment,
        "ERROR" => NodeKind::Error,
        _ => NodeKind::Other,
    }
}

/// Hint for literal leaves and literal-shaped interior nodes.
pub fn literal_hint(kind: NodeKind) -> Option<TypeHint> {
    match kind {
        NodeKind::IntLit => Some(TypeHint::Int),
        NodeKind::FloatLit => Some(TypeHint::Float),
        NodeKind::StringLit => Some(TypeHint::Str),
        NodeKind::BoolLit => Some(TypeHint::Bool),
        NodeKind::NullLit => Some(TypeHint::Null),
        NodeKind::ArrayLiteral => Some(TypeHint::Array),
        _ => None,
    }
}

/// Hint for a declared parameter or property type, read off its text.
pub fn declared_hint(type_text: &str) -> TypeHint {
    match type_text.trim().to_ascii_lowercase().as_str() {
        "int" => TypeHint::Int,
        "float" => TypeHint::Float,
        "string" => TypeHint::Str,
        "bool" => TypeHint::Bool,
        "array" => TypeHint::Array,
        "null" => TypeHint::Null,
        _ => TypeHint::Mixed,
    }
}

/// Methods whose signatures the language constrains; rules that add return
/// types or drop members must leave these alone.
pub fn is_magic_method(name: &str) -> bool {
    name.starts_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_core_kinds() {
        assert_eq!(classify("function_call_expression"), NodeKind::Call);
        assert_eq!(classify("array_creation_expression"), NodeKind::ArrayLiteral);
        assert_eq!(classify("conditional_expression"), NodeKind::Conditional);
        assert_eq!(classify("no_such_kind"), NodeKind::Other);
    }

    #[test]
    fn both_closure_spellings_classify() {
        assert_eq!(
            classify("anonymous_function_creation_expression"),
            NodeKind::Closure
        );
        assert_eq!(classify("anonymous_function"), NodeKind::Closure);
    }

    #[test]
    fn declared_hints_cover_primitives() {
        assert_eq!(declared_hint("int"), TypeHint::Int);
        assert_eq!(declared_hint("String"), TypeHint::Str);
        assert_eq!(declared_hint("Foo\\Bar"), TypeHint::Mixed);
    }

    #[test]
    fn magic_method_names() {
        assert!(is_magic_method("__construct"));
        assert!(is_magic_method("__invoke"));
        assert!(!is_magic_method("handle"));
    }
}
