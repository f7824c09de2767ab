//! Syntax tree model.
//!
//! Parsed source becomes a tree of [`Node`]s that exclusively own their
//! children. Nodes built by the parser carry the byte span of the text they
//! cover; nodes built by rules as replacements may have no span (they are
//! synthesized) or may borrow the span of the token they stand in for, which
//! lets the printer keep the surrounding whitespace intact.
//!
//! Anonymous grammar tokens (keywords, operators, punctuation) are kept as
//! [`NodeKind::Token`] leaves so that any subtree can be re-rendered from its
//! children alone.

/// Byte span of a node in the original source, with the 1-based line and
/// column of its start for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Classified node kind. The raw grammar kind string is kept alongside on
/// [`Node::grammar`]; `Other` covers named grammar kinds with no dedicated
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    // Statements.
    ExpressionStatement,
    CompoundStatement,
    If,
    Return,
    Echo,
    EmptyStatement,
    FunctionDefinition,
    MethodDeclaration,
    ClassDeclaration,
    PropertyDeclaration,
    NamespaceDefinition,
    NamespaceUse,
    // Expressions.
    Call,
    MemberCall,
    ScopedCall,
    New,
    ArrayLiteral,
    ListLiteral,
    Conditional,
    Binary,
    Unary,
    Assignment,
    AugmentedAssignment,
    Parenthesized,
    Subscript,
    MemberAccess,
    ScopedPropertyAccess,
    Closure,
    ArrowFunction,
    Variable,
    Name,
    QualifiedName,
    StringLit,
    IntLit,
    FloatLit,
    BoolLit,
    NullLit,
    // Structure.
    FormalParameters,
    Parameter,
    VariadicParameter,
    PropertyPromotionParameter,
    Arguments,
    Argument,
    UseClause,
    Modifier,
    TypeNode,
    Comment,
    /// Anonymous grammar token (keyword, operator, punctuation).
    Token,
    Error,
    Other,
}

impl NodeKind {
    /// Trivia nodes are skipped by structural matching.
    pub fn is_trivia(&self) -> bool {
        matches!(self, NodeKind::Token | NodeKind::Comment)
    }
}

/// Shallow type information attached where it can be read directly off the
/// syntax (literals, declared parameter types). Never inferred across
/// statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Int,
    Float,
    Str,
    Bool,
    Null,
    Array,
    Mixed,
}

impl TypeHint {
    /// PHP type declaration text for this hint, where one exists.
    pub fn declaration(&self) -> Option<&'static str> {
        match self {
            TypeHint::Int => Some("int"),
            TypeHint::Float => Some("float"),
            TypeHint::Str => Some("string"),
            TypeHint::Bool => Some("bool"),
            TypeHint::Array => Some("array"),
            TypeHint::Mixed => Some("mixed"),
            TypeHint::Null => None,
        }
    }
}

/// One syntactic construct. Children are exclusively owned, so the tree is
/// acyclic and every node except the root has exactly one parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Raw grammar kind (`"function_call_expression"`), or a canonical name
    /// for synthesized nodes.
    pub grammar: &'static str,
    /// Grammar field name this node fills in its parent, when the grammar
    /// declares one (`"function"`, `"arguments"`, ...).
    pub field: Option<&'static str>,
    pub children: Vec<Node>,
    /// Byte span in the original source; `None` for synthesized nodes.
    pub span: Option<Span>,
    /// Exact token text; always present on leaves.
    pub text: Option<String>,
    pub hint: Option<TypeHint>,
}

impl Node {
    /// Synthesized anonymous token with canonical text.
    pub fn token(text: impl Into<String>) -> Node {
        Node {
            kind: NodeKind::Token,
            grammar: "token",
            field: None,
            children: Vec::new(),
            span: None,
            text: Some(text.into()),
            hint: None,
        }
    }

    /// Synthesized token standing in for an original one. The span is kept
    /// purely as a formatting anchor: the printer emits `text`, but preserves
    /// the original gaps around the replaced token.
    pub fn token_at(text: impl Into<String>, span: Span) -> Node {
        Node {
            span: Some(span),
            ..Node::token(text)
        }
    }

    /// Synthesized named leaf, e.g. a `Name` or `Variable`.
    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Node {
        Node {
            kind,
            grammar: "synthesized",
            field: None,
            children: Vec::new(),
            span: None,
            text: Some(text.into()),
            hint: None,
        }
    }

    /// Synthesized leaf anchored to an original span (see [`Node::token_at`]).
    pub fn leaf_at(kind: NodeKind, text: impl Into<String>, span: Span) -> Node {
        Node {
            span: Some(span),
            ..Node::leaf(kind, text)
        }
    }

    /// Synthesized interior node built from replacement children.
    pub fn synthetic(kind: NodeKind, children: Vec<Node>) -> Node {
        Node {
            kind,
            grammar: "synthesized",
            field: None,
            children,
            span: None,
            text: None,
            hint: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The bytes this node covers in the original source, if it has a span.
    pub fn original_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        self.span.map(|s| &source[s.start..s.end])
    }

    /// Children that take part in structural matching (tokens and comments
    /// excluded).
    pub fn significant_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| !c.kind.is_trivia())
    }

    /// First child filling the given grammar field.
    pub fn child_by_field(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.field == Some(name))
    }

    /// First significant child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.significant_children().find(|c| c.kind == kind)
    }

    /// Pre-order traversal of this node and everything below it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Leaf token texts joined with single spaces, in source order. Two
    /// subtrees with equal streams spell the same code modulo whitespace.
    pub fn leaf_stream(&self) -> String {
        let mut out = String::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves(node: &Node, out: &mut String) {
    if node.kind == NodeKind::Comment {
        return;
    }
    if node.is_leaf() {
        if let Some(text) = &node.text {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
        }
        return;
    }
    for child in &node.children {
        collect_leaves(child, out);
    }
}

/// Iterator over a subtree in pre-order.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed file: the root node plus nothing else. The engine keeps the
/// source text separately because it re-parses between rewrite passes.
#[derive(Debug)]
pub struct SyntaxTree {
    pub root: Node,
}
