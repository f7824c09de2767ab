//! Parallel file processing using Rayon.
//!
//! Files are independent, so the fan-out is a plain `par_iter` over the
//! pending list inside a run-local pool. Reports come back sorted by path,
//! which keeps output and exit codes independent of scheduling.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;
use rayon::prelude::*;

use crate::engine::Engine;
use crate::report::FileReport;

/// Cooperative cancellation flag shared with signal handlers. Files that
/// have not started when it flips are left untouched on disk.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Processes the files with the engine, in parallel when configured.
pub fn run_files(
    engine: &Engine,
    files: &[PathBuf],
    write: bool,
    cancel: &CancelToken,
) -> Vec<FileReport> {
    let process = |path: &PathBuf| -> Option<FileReport> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(engine.process_file(path, write))
    };

    let config = engine.config();
    let mut reports: Vec<FileReport> = if config.parallel && files.len() > 1 {
        let threads = if config.jobs > 0 {
            config.jobs
        } else {
            num_cpus::get()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| files.par_iter().filter_map(process).collect()),
            Err(err) => {
                warn!("thread pool unavailable ({err}), processing sequentially");
                files.iter().filter_map(process).collect()
            }
        }
    } else {
        files.iter().filter_map(process).collect()
    };

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    reports
}
