//! refractor-core: rule-based PHP source modernization
//!
//! This library provides:
//! - Tree-sitter based PHP parsing into an owned, span-carrying syntax tree
//! - Version-gated rewrite rules grouped into named, ordered rule sets
//! - A fixpoint engine that preserves untouched formatting byte for byte
//! - Caching and parallel processing for whole-project runs

pub mod cache;
pub mod config;
pub mod edit;
pub mod engine;
pub mod files;
pub mod matcher;
pub mod parallel;
pub mod parser;
pub mod php;
pub mod printer;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;
pub mod tree;
pub mod version;

pub use config::{ConfigError, RunConfig, CONFIG_FILE_NAME};
pub use engine::{Engine, EngineError, Outcome, TransformationPlan};
pub use parallel::CancelToken;
pub use parser::{parse, ParseError};
pub use registry::{Registry, RuleSet};
pub use report::{ChangeRecord, EngineState, EngineWarning, FileReport, RunReport};
pub use rule::{Rewrite, Rule, RuleContext};
pub use tree::{Node, NodeKind, Span, SyntaxTree, TypeHint};
pub use version::PhpVersion;
