//! Input file collection.
//!
//! Include roots come from [`RunConfig::paths`]: explicit files are taken
//! as-is, directories are walked for `.php` files, and patterns are expanded
//! with the `glob` crate. Skip patterns and the built-in excludes use
//! `globset` so one matcher covers the whole walk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::warn;
use once_cell::sync::Lazy;

use crate::config::RunConfig;

/// Directories that are never walked into, no matter the include roots.
static DEFAULT_EXCLUDES: Lazy<GlobSet> = Lazy::new(|| {
    build_globset(&["**/vendor/**", "**/node_modules/**", "**/.git/**"])
});

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern.as_ref()) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!("ignoring invalid skip pattern '{}': {}", pattern.as_ref(), err),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!("skip patterns disabled: {}", err);
        GlobSet::empty()
    })
}

fn is_php_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("php"))
        .unwrap_or(false)
}

fn is_glob_pattern(literal: &str) -> bool {
    literal.contains(['*', '?', '['])
}

/// Resolves the configured paths to the sorted, deduplicated list of files
/// this run will touch.
pub fn collect_files(config: &RunConfig) -> Vec<PathBuf> {
    let skip = build_globset(&config.skip_paths);
    let mut found = BTreeSet::new();

    for path in &config.paths {
        let literal = path.to_string_lossy();
        if is_glob_pattern(&literal) {
            expand_pattern(&literal, &skip, &mut found);
        } else if path.is_dir() {
            walk_directory(path, &skip, &mut found);
        } else if path.is_file() {
            // An explicitly named file is processed even without the `.php`
            // extension; skip patterns still apply.
            if !skip.is_match(path) {
                found.insert(path.clone());
            }
        }
    }

    found.into_iter().collect()
}

fn expand_pattern(pattern: &str, skip: &GlobSet, found: &mut BTreeSet<PathBuf>) {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(err) => {
            warn!("invalid path pattern '{}': {}", pattern, err);
            return;
        }
    };
    for entry in paths.flatten() {
        if entry.is_file() && is_php_file(&entry) && !is_excluded(&entry, skip) {
            found.insert(entry);
        }
    }
}

fn walk_directory(dir: &Path, skip: &GlobSet, found: &mut BTreeSet<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read directory {}: {}", dir.display(), err);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if is_excluded(&path, skip) {
            continue;
        }
        if path.is_dir() {
            walk_directory(&path, skip, found);
        } else if path.is_file() && is_php_file(&path) {
            found.insert(path);
        }
    }
}

fn is_excluded(path: &Path, skip: &GlobSet) -> bool {
    DEFAULT_EXCLUDES.is_match(path) || skip.is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "<?php\n").unwrap();
    }

    fn config_for(paths: Vec<PathBuf>) -> RunConfig {
        RunConfig {
            paths,
            ..RunConfig::default()
        }
    }

    #[test]
    fn walks_directories_for_php_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.php"));
        touch(&dir.path().join("sub/deep/b.php"));
        fs::write(dir.path().join("notes.md"), "x").unwrap();

        let files = collect_files(&config_for(vec![dir.path().to_path_buf()]));
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "php"));
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn vendor_is_excluded_by_default() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("src/app.php"));
        touch(&dir.path().join("vendor/lib/code.php"));

        let files = collect_files(&config_for(vec![dir.path().to_path_buf()]));
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/app.php"));
    }

    #[test]
    fn skip_patterns_drop_matching_subtrees() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("src/app.php"));
        touch(&dir.path().join("src/legacy/old.php"));

        let mut config = config_for(vec![dir.path().to_path_buf()]);
        config.skip_paths = vec!["**/legacy/**".to_string()];
        let files = collect_files(&config);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/app.php"));
    }

    #[test]
    fn explicit_files_bypass_the_extension_filter() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("bin/console");
        touch(&script);

        let files = collect_files(&config_for(vec![script.clone()]));
        assert_eq!(files, vec![script]);
    }

    #[test]
    fn glob_patterns_expand_to_php_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("src/a.php"));
        touch(&dir.path().join("src/nested/b.php"));
        fs::write(dir.path().join("src/c.txt"), "x").unwrap();

        let pattern = PathBuf::from(format!("{}/**/*.php", dir.path().display()));
        let files = collect_files(&config_for(vec![pattern]));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn overlapping_inputs_are_reported_once() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.php");
        touch(&file);

        let files = collect_files(&config_for(vec![dir.path().to_path_buf(), file]));
        assert_eq!(files.len(), 1);
    }
}
