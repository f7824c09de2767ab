//! The rewrite engine.
//!
//! A run turns the configuration into a [`TransformationPlan`] once, then
//! processes each file independently: parse, walk, collect edits, splice,
//! re-parse, until a pass produces no edits. Within one pass the first rule
//! to match a node owns it; rewritten subtrees are not revisited until the
//! next pass, which sees them as ordinary parsed code.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::cache::{self, CacheEntry, RunCache};
use crate::config::{ConfigError, RunConfig};
use crate::edit::{apply_edits, widen_removal, Edit, EditError};
use crate::files;
use crate::parallel::{self, CancelToken};
use crate::parser::{parse, ParseError};
use crate::printer;
use crate::registry::Registry;
use crate::report::{ChangeRecord, EngineState, EngineWarning, FileReport, RunReport};
use crate::rule::{Rewrite, Rule, RuleContext};
use crate::rules::imports::ImportNames;
use crate::tree::{Node, SyntaxTree};
use crate::version::PhpVersion;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// The resolved, filtered, ordered rule list for a run, plus a signature the
/// cache uses to notice plan changes.
pub struct TransformationPlan {
    pub rules: Vec<Arc<dyn Rule>>,
    pub signature: String,
}

impl TransformationPlan {
    pub fn build(
        config: &RunConfig,
        registry: &Registry,
    ) -> Result<TransformationPlan, ConfigError> {
        let rules: Vec<Arc<dyn Rule>> = registry
            .resolve(&config.sets)?
            .into_iter()
            .filter(|rule| !config.skip.iter().any(|skipped| skipped == rule.id()))
            .filter(|rule| {
                rule.min_version()
                    .map_or(true, |min| min <= config.php_version)
            })
            .filter(|rule| {
                rule.max_version()
                    .map_or(true, |max| config.php_version <= max)
            })
            .collect();

        let ids: Vec<&str> = rules.iter().map(|rule| rule.id()).collect();
        let signature = cache::signature_of(&(
            config.php_version.tag(),
            config.import_names,
            config.import_short_classes,
            config.max_passes,
            &ids,
        ));
        Ok(TransformationPlan { rules, signature })
    }
}

/// What one source text turned into.
pub struct Outcome {
    pub output: String,
    pub changes: Vec<ChangeRecord>,
    pub warnings: Vec<EngineWarning>,
}

pub struct Engine {
    config: RunConfig,
    plan: TransformationPlan,
}

impl Engine {
    pub fn new(config: RunConfig, registry: &Registry) -> Result<Engine, ConfigError> {
        config.validate()?;
        let plan = TransformationPlan::build(&config, registry)?;
        debug!(
            "plan: {} rules for target {}",
            plan.rules.len(),
            config.php_version
        );
        Ok(Engine { config, plan })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn plan(&self) -> &TransformationPlan {
        &self.plan
    }

    /// Rewrites one source text to its fixpoint and runs the name-import
    /// phase on the result when enabled.
    pub fn process_source(&self, source: &str) -> Result<Outcome, EngineError> {
        let mut text = source.to_string();
        let mut changes = Vec::new();
        let mut warnings = Vec::new();
        let mut pass = 0;
        let mut settled = false;

        while pass < self.config.max_passes {
            pass += 1;
            let tree = parse(&text)?;
            let (edits, mut pass_changes, mut pass_warnings) = self.run_pass(&tree, &text, pass);
            warnings.append(&mut pass_warnings);
            if edits.is_empty() {
                settled = true;
                break;
            }
            changes.append(&mut pass_changes);
            text = apply_edits(&text, edits)?;
        }

        if !settled {
            // The limit alone is not oscillation; only warn when another
            // pass would still change something.
            let tree = parse(&text)?;
            let (edits, _, _) = self.run_pass(&tree, &text, pass);
            if !edits.is_empty() {
                warnings.push(EngineWarning::MaxPassesExceeded {
                    passes: self.config.max_passes,
                });
            }
        }

        if self.config.import_names {
            let tree = parse(&text)?;
            let importer = ImportNames::new(self.config.import_short_classes);
            let (edits, mut import_changes) = importer.run(&tree, &text, pass + 1);
            if !edits.is_empty() {
                text = apply_edits(&text, edits)?;
                changes.append(&mut import_changes);
            }
        }

        Ok(Outcome {
            output: text,
            changes,
            warnings,
        })
    }

    fn run_pass(
        &self,
        tree: &SyntaxTree,
        source: &str,
        pass: usize,
    ) -> (Vec<Edit>, Vec<ChangeRecord>, Vec<EngineWarning>) {
        let mut visitor = PassVisitor {
            rules: &self.plan.rules,
            source,
            root: &tree.root,
            target: self.config.php_version,
            pass,
            edits: Vec::new(),
            changes: Vec::new(),
            warnings: Vec::new(),
        };
        let mut ancestors = Vec::new();
        visitor.visit(&tree.root, &mut ancestors);
        (visitor.edits, visitor.changes, visitor.warnings)
    }

    /// Processes one file. Never returns an error; failures become part of
    /// the report so one bad file cannot stop a run.
    pub fn process_file(&self, path: &Path, write: bool) -> FileReport {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                return FileReport::failed(path.to_path_buf(), format!("cannot read file: {err}"))
            }
        };

        let outcome = match self.process_source(&source) {
            Ok(outcome) => outcome,
            Err(err) => return FileReport::failed(path.to_path_buf(), err.to_string()),
        };

        let changed = outcome.output != source;
        if changed && write {
            if let Err(err) = write_atomic(path, &outcome.output) {
                return FileReport::failed(path.to_path_buf(), format!("cannot write file: {err}"));
            }
        }

        let oscillating = outcome
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::MaxPassesExceeded { .. }));
        // Cache only states known to be stable: untouched files, or the
        // just-written fixpoint. A would-change dry-run file must stay warm.
        let cache_update = if !oscillating && (!changed || write) {
            CacheEntry::capture(path)
        } else {
            None
        };

        FileReport {
            path: path.to_path_buf(),
            state: if changed {
                EngineState::Changed
            } else {
                EngineState::Clean
            },
            changes: outcome.changes,
            warnings: outcome.warnings,
            error: None,
            cache_update,
        }
    }

    pub fn run(&self, write: bool) -> RunReport {
        self.run_with_cancel(write, &CancelToken::new())
    }

    /// Full run over the configured paths: collect files, consult the cache,
    /// fan out, merge reports back in path order.
    pub fn run_with_cancel(&self, write: bool, cancel: &CancelToken) -> RunReport {
        let all_files = files::collect_files(&self.config);

        let mut run_cache = if self.config.cache {
            let cache_path = self.config.cache_file();
            let mut loaded = match RunCache::load(&cache_path) {
                Ok(loaded) => loaded,
                Err(err) => {
                    debug!("starting with a cold cache: {err}");
                    RunCache::new()
                }
            };
            loaded.set_plan_signature(&self.plan.signature);
            Some(loaded)
        } else {
            None
        };

        let (pending, skipped) = match &run_cache {
            Some(cache) => {
                let mut pending = Vec::new();
                let mut skipped = 0;
                for file in all_files {
                    if cache.is_clean(&file) {
                        skipped += 1;
                    } else {
                        pending.push(file);
                    }
                }
                (pending, skipped)
            }
            None => (all_files, 0),
        };

        debug!("{} files to process, {} cache hits", pending.len(), skipped);
        let mut reports = parallel::run_files(self, &pending, write, cancel);

        if let Some(cache) = &mut run_cache {
            for report in &mut reports {
                if let Some(entry) = report.cache_update.take() {
                    cache.store(&report.path, entry);
                }
            }
            cache.prune();
            let cache_path = self.config.cache_file();
            if let Err(err) = cache.save(&cache_path) {
                warn!("cannot save cache {}: {}", cache_path.display(), err);
            }
        }

        RunReport {
            files: reports,
            skipped,
            dry_run: !write,
        }
    }
}

struct PassVisitor<'a> {
    rules: &'a [Arc<dyn Rule>],
    source: &'a str,
    root: &'a Node,
    target: PhpVersion,
    pass: usize,
    edits: Vec<Edit>,
    changes: Vec<ChangeRecord>,
    warnings: Vec<EngineWarning>,
}

impl<'a> PassVisitor<'a> {
    fn visit(&mut self, node: &'a Node, ancestors: &mut Vec<&'a Node>) {
        if self.apply_rules(node, ancestors) {
            // The subtree was rewritten; the next pass sees its new form.
            return;
        }
        ancestors.push(node);
        for child in &node.children {
            self.visit(child, ancestors);
        }
        ancestors.pop();
    }

    /// Offers the node to every rule in plan order. Returns whether a
    /// rewrite was taken.
    fn apply_rules(&mut self, node: &'a Node, ancestors: &[&'a Node]) -> bool {
        if node.kind.is_trivia() {
            return false;
        }
        let Some(span) = node.span else {
            return false;
        };

        let ctx = RuleContext {
            source: self.source,
            root: self.root,
            target: self.target,
            ancestors,
        };

        let mut applied: Option<&'static str> = None;
        for rule in self.rules {
            if !rule.applies(node, &ctx) {
                continue;
            }
            if let Some(winner) = applied {
                self.warnings.push(EngineWarning::RuleConflict {
                    applied: winner.to_string(),
                    shadowed: rule.id().to_string(),
                    line: span.line,
                });
                continue;
            }
            match rule.rewrite(node, &ctx) {
                Rewrite::Unchanged => {}
                Rewrite::Replace(replacement) => {
                    let rendered = printer::render(&replacement, self.source);
                    let original = &self.source[span.start..span.end];
                    if rendered == original {
                        // A rewrite that reproduces its input is a no-op,
                        // not a claim on the node.
                        continue;
                    }
                    self.edits.push(Edit {
                        start: span.start,
                        end: span.end,
                        replacement: rendered.clone(),
                    });
                    self.changes.push(ChangeRecord {
                        rule_id: rule.id().to_string(),
                        line: span.line,
                        column: span.column,
                        before: original.to_string(),
                        after: rendered,
                        pass: self.pass,
                    });
                    applied = Some(rule.id());
                }
                Rewrite::Remove => {
                    let (start, end) = widen_removal(self.source, span.start, span.end);
                    self.edits.push(Edit {
                        start,
                        end,
                        replacement: String::new(),
                    });
                    self.changes.push(ChangeRecord {
                        rule_id: rule.id().to_string(),
                        line: span.line,
                        column: span.column,
                        before: self.source[span.start..span.end].to_string(),
                        after: String::new(),
                        pass: self.pass,
                    });
                    applied = Some(rule.id());
                }
            }
        }
        applied.is_some()
    }
}

/// Replaces the file through a sibling temp file so readers never observe a
/// half-written state. Permissions carry over from the original.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents.as_bytes())?;
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions()).ok();
    }
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
