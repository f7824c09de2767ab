//! Run reporting.
//!
//! Each processed file produces a [`FileReport`]; the run collects them into
//! a [`RunReport`] whose exit code follows the usual convention: 0 when
//! nothing changed, 1 when rewrites were applied or would apply, 2 when any
//! file failed.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::cache::CacheEntry;

/// One applied rewrite, as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub rule_id: String,
    /// 1-based line of the rewritten node in the pass it was rewritten.
    pub line: usize,
    pub column: usize,
    pub before: String,
    pub after: String,
    /// Pass number the rewrite happened in, starting at 1.
    pub pass: usize,
}

/// A non-fatal condition worth surfacing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Two selected rules matched the same node in one pass; the one listed
    /// first in the plan was applied.
    RuleConflict {
        applied: String,
        shadowed: String,
        line: usize,
    },
    /// The file kept changing after the configured pass limit.
    MaxPassesExceeded { passes: usize },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::RuleConflict {
                applied,
                shadowed,
                line,
            } => write!(
                f,
                "rules '{}' and '{}' both matched at line {}; '{}' was applied",
                applied, shadowed, line, applied
            ),
            EngineWarning::MaxPassesExceeded { passes } => {
                write!(f, "file did not settle within {} passes", passes)
            }
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No rule produced a change.
    Clean,
    /// Rewrites were applied, or would be in dry-run mode.
    Changed,
    /// The file could not be processed; see the error text.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub state: EngineState,
    pub changes: Vec<ChangeRecord>,
    pub warnings: Vec<EngineWarning>,
    pub error: Option<String>,
    /// Freshness data for the cache, captured after any write.
    #[serde(skip)]
    pub cache_update: Option<CacheEntry>,
}

impl FileReport {
    pub fn clean(path: PathBuf) -> FileReport {
        FileReport {
            path,
            state: EngineState::Clean,
            changes: Vec::new(),
            warnings: Vec::new(),
            error: None,
            cache_update: None,
        }
    }

    pub fn failed(path: PathBuf, error: String) -> FileReport {
        FileReport {
            path,
            state: EngineState::Failed,
            changes: Vec::new(),
            warnings: Vec::new(),
            error: Some(error),
            cache_update: None,
        }
    }
}

/// The full outcome of a run, across all files.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    /// Files the cache let the run skip entirely.
    pub skipped: usize,
    pub dry_run: bool,
}

impl RunReport {
    pub fn changed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == EngineState::Changed)
            .count()
    }

    pub fn failed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == EngineState::Failed)
            .count()
    }

    pub fn total_changes(&self) -> usize {
        self.files.iter().map(|f| f.changes.len()).sum()
    }

    pub fn exit_code(&self) -> u8 {
        if self.failed_files() > 0 {
            2
        } else if self.changed_files() > 0 {
            1
        } else {
            0
        }
    }
}
