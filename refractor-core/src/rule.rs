//! Rule abstraction: an applicability predicate paired with a rewrite.
//!
//! Rules are constructed once when the registry is built, hold no per-file
//! state, and are shared read-only across worker threads. A rule that cannot
//! decide safely returns `Unchanged`; it must never guess.

use crate::tree::Node;
use crate::version::PhpVersion;

/// Outcome of a rewrite attempt.
#[derive(Debug)]
pub enum Rewrite {
    /// The rule chose not to touch the node after all.
    Unchanged,
    /// Replace the node's span with the rendered replacement tree.
    Replace(Node),
    /// Delete the node (statement removals).
    Remove,
}

/// Read-only surroundings of the node a rule is looking at.
pub struct RuleContext<'a> {
    pub source: &'a str,
    pub root: &'a Node,
    pub target: PhpVersion,
    /// Ancestor chain from the root down to the node's parent.
    pub ancestors: &'a [&'a Node],
}

impl<'a> RuleContext<'a> {
    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last().copied()
    }

    /// Original source bytes of a parsed node; empty for synthesized nodes.
    pub fn text(&self, node: &Node) -> &'a str {
        node.original_text(self.source).unwrap_or("")
    }

    /// Nearest non-trivia sibling before `node` in its parent.
    pub fn prev_significant_sibling(&self, node: &Node) -> Option<&'a Node> {
        let parent = self.parent()?;
        let mut prev = None;
        for child in &parent.children {
            if std::ptr::eq(child, node) {
                return prev;
            }
            if !child.kind.is_trivia() {
                prev = Some(child);
            }
        }
        None
    }
}

/// A named, version-bounded transformation unit.
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Lowest target version the rewrite output requires.
    fn min_version(&self) -> Option<PhpVersion> {
        None
    }

    /// Highest target version the rule still makes sense for.
    fn max_version(&self) -> Option<PhpVersion> {
        None
    }

    fn applies(&self, node: &Node, ctx: &RuleContext<'_>) -> bool;

    fn rewrite(&self, node: &Node, ctx: &RuleContext<'_>) -> Rewrite;
}
