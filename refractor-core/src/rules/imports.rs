//! Post-processing pass that imports fully qualified class names.
//!
//! Runs once after the rule fixpoint, on the final tree. Every `\Foo\Bar`
//! used in a class position is shortened to `Bar` and a matching `use`
//! declaration is added, unless the short name is already taken. Function
//! and constant references keep their backslashes; so do names that are
//! relative to the current namespace.

use std::collections::BTreeMap;
use std::ptr;

use crate::edit::Edit;
use crate::matcher::{self, declared_name};
use crate::report::ChangeRecord;
use crate::tree::{Node, NodeKind, SyntaxTree};

pub struct ImportNames {
    /// Whether single-segment names like `\DateTime` are imported too.
    pub short_classes: bool,
}

/// A resolved occurrence: the byte range of `\Fully\Qualified` plus the
/// names involved.
struct Occurrence<'t> {
    node: &'t Node,
    full: String,
    short: String,
}

impl ImportNames {
    pub fn new(short_classes: bool) -> ImportNames {
        ImportNames { short_classes }
    }

    pub fn run(
        &self,
        tree: &SyntaxTree,
        source: &str,
        pass: usize,
    ) -> (Vec<Edit>, Vec<ChangeRecord>) {
        let Some(imports) = existing_imports(&tree.root, source) else {
            // Grouped use declarations take this file out of scope.
            return (Vec::new(), Vec::new());
        };
        let declared = declared_type_names(&tree.root);

        let mut occurrences = Vec::new();
        collect_occurrences(&tree.root, None, false, source, &mut occurrences);

        let mut planned: BTreeMap<String, (String, String)> = BTreeMap::new();
        let mut edits = Vec::new();
        let mut records = Vec::new();

        for occ in occurrences {
            if !occ.full.contains('\\') && !self.short_classes {
                continue;
            }
            let Some(span) = occ.node.span else {
                continue;
            };
            let key = occ.short.to_ascii_lowercase();
            let resolvable = match imports.get(&key) {
                Some(full) => full == &occ.full,
                None => {
                    if declared.iter().any(|d| d.eq_ignore_ascii_case(&occ.short)) {
                        false
                    } else {
                        match planned.get(&key) {
                            Some((_, full)) => full == &occ.full,
                            None => {
                                planned.insert(
                                    key.clone(),
                                    (occ.short.clone(), occ.full.clone()),
                                );
                                true
                            }
                        }
                    }
                }
            };
            if !resolvable {
                continue;
            }
            edits.push(Edit {
                start: span.start,
                end: span.end,
                replacement: occ.short.clone(),
            });
            records.push(ChangeRecord {
                rule_id: "import-names".to_string(),
                line: span.line,
                column: span.column,
                before: format!("\\{}", occ.full),
                after: occ.short,
                pass,
            });
        }

        if !planned.is_empty() {
            let pos = insertion_point(&tree.root, source);
            let block: String = planned
                .values()
                .map(|(_, full)| format!("use {full};\n"))
                .collect();
            records.push(ChangeRecord {
                rule_id: "import-names".to_string(),
                line: 1 + source[..pos].matches('\n').count(),
                column: 1,
                before: String::new(),
                after: block.trim_end().to_string(),
                pass,
            });
            edits.push(Edit {
                start: pos,
                end: pos,
                replacement: block,
            });
        }

        (edits, records)
    }
}

/// Positions where a name can only mean a class-like type.
fn class_position(node: &Node, parent: &Node) -> bool {
    match parent.kind {
        NodeKind::New | NodeKind::TypeNode => true,
        NodeKind::ScopedCall | NodeKind::ScopedPropertyAccess => parent
            .significant_children()
            .next()
            .is_some_and(|first| ptr::eq(first, node)),
        NodeKind::Binary => {
            matcher::operator(parent) == Some("instanceof")
                && parent
                    .significant_children()
                    .nth(1)
                    .is_some_and(|right| ptr::eq(right, node))
        }
        _ => match parent.grammar {
            "class_constant_access_expression" => parent
                .significant_children()
                .next()
                .is_some_and(|first| ptr::eq(first, node)),
            "attribute" | "type_list" | "base_clause" | "class_interface_clause"
            | "use_declaration" => true,
            _ => false,
        },
    }
}

fn collect_occurrences<'t>(
    node: &'t Node,
    parent: Option<&'t Node>,
    in_import: bool,
    source: &str,
    out: &mut Vec<Occurrence<'t>>,
) {
    let in_import = in_import || node.kind == NodeKind::NamespaceUse;
    if node.kind == NodeKind::QualifiedName && !in_import {
        if let (Some(text), Some(parent)) = (node.original_text(source), parent) {
            if let Some(full) = text.strip_prefix('\\') {
                if class_position(node, parent) {
                    let short = full.rsplit('\\').next().unwrap_or(full);
                    out.push(Occurrence {
                        node,
                        full: full.to_string(),
                        short: short.to_string(),
                    });
                }
            }
        }
    }
    for child in &node.children {
        collect_occurrences(child, Some(node), in_import, source, out);
    }
}

/// Map of lowercased short name to imported full name. `None` when the file
/// uses grouped imports, which this pass does not reshape.
fn existing_imports(root: &Node, source: &str) -> Option<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for decl in root.descendants().filter(|n| n.kind == NodeKind::NamespaceUse) {
        let text = decl.original_text(source).unwrap_or("");
        if text.contains('{') {
            return None;
        }
        // `use function` and `use const` live in different symbol spaces.
        let non_class = decl.children.iter().any(|c| {
            c.kind == NodeKind::Token
                && matches!(c.text.as_deref(), Some("function") | Some("const"))
        });
        if non_class {
            continue;
        }
        for clause in decl
            .children
            .iter()
            .filter(|c| c.grammar == "namespace_use_clause")
        {
            let Some(name) = clause
                .child_of_kind(NodeKind::QualifiedName)
                .or_else(|| clause.child_of_kind(NodeKind::Name))
            else {
                continue;
            };
            let full = name
                .original_text(source)
                .unwrap_or("")
                .trim_start_matches('\\')
                .to_string();
            let alias = matcher::find_descendant(clause, |n| {
                n.grammar == "namespace_aliasing_clause"
            })
            .and_then(|a| a.child_of_kind(NodeKind::Name))
            .and_then(|n| n.text.as_deref());
            let short = alias
                .map(str::to_string)
                .unwrap_or_else(|| full.rsplit('\\').next().unwrap_or(&full).to_string());
            map.insert(short.to_ascii_lowercase(), full);
        }
    }
    Some(map)
}

/// Short names the file itself defines; importing over them would clash.
fn declared_type_names(root: &Node) -> Vec<String> {
    root.descendants()
        .filter(|n| {
            n.kind == NodeKind::ClassDeclaration
                || matches!(
                    n.grammar,
                    "interface_declaration" | "trait_declaration" | "enum_declaration"
                )
        })
        .filter_map(|n| declared_name(n).map(str::to_string))
        .collect()
}

/// Byte offset where new `use` lines go: after the last import, else after
/// the namespace line, else after the opening tag.
fn insertion_point(root: &Node, source: &str) -> usize {
    let anchor = root
        .descendants()
        .filter(|n| n.kind == NodeKind::NamespaceUse)
        .last()
        .or_else(|| {
            root.children
                .iter()
                .find(|c| c.kind == NodeKind::NamespaceDefinition)
        })
        .or_else(|| root.children.iter().find(|c| c.grammar == "php_tag"));
    let Some(end) = anchor.and_then(|n| n.span).map(|s| s.end) else {
        return 0;
    };
    source[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(source.len())
}
