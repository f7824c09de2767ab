//! Run configuration.
//!
//! Loaded from `refractor.toml`, then overlaid by command line flags. Every
//! field has a default so an empty file and a missing file mean the same
//! thing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::PhpVersion;

pub const CONFIG_FILE_NAME: &str = "refractor.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown rule set tag '{tag}'")]
    UnknownTag { tag: String },

    #[error("input path {} does not exist", path.display())]
    MissingPath { path: PathBuf },

    #[error("max_passes must be at least 1")]
    ZeroPasses,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Files and directories to process. Directories are walked for `.php`
    /// files; glob patterns are expanded.
    pub paths: Vec<PathBuf>,
    /// Rule set tags to apply, in order.
    pub sets: Vec<String>,
    /// Target language version; rules demanding a newer one stay inactive.
    pub php_version: PhpVersion,
    /// Rule ids excluded from the run even when their set is selected.
    pub skip: Vec<String>,
    /// Glob patterns for paths to leave alone.
    pub skip_paths: Vec<String>,
    pub parallel: bool,
    /// Worker threads; zero means one per logical CPU.
    pub jobs: usize,
    pub cache: bool,
    /// Cache file location; defaults to `.refractor-cache.json` in the
    /// working directory.
    pub cache_path: Option<PathBuf>,
    /// Upper bound on rewrite passes per file before the run flags the file
    /// as oscillating.
    pub max_passes: usize,
    pub import_names: bool,
    /// Whether `import_names` also imports single-segment names like
    /// `\DateTime`.
    pub import_short_classes: bool,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            paths: Vec::new(),
            sets: vec![format!("up-to-{}", PhpVersion::Php84.tag())],
            php_version: PhpVersion::Php84,
            skip: Vec::new(),
            skip_paths: Vec::new(),
            parallel: true,
            jobs: 0,
            cache: false,
            cache_path: None,
            max_passes: 10,
            import_names: false,
            import_short_classes: true,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<RunConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Looks for `refractor.toml` in `dir` and its ancestors.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|a| a.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Checks the parts that must hold before an engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_passes == 0 {
            return Err(ConfigError::ZeroPasses);
        }
        for path in &self.paths {
            let literal = path.to_string_lossy();
            let is_glob = literal.contains(['*', '?', '[']);
            if !is_glob && !path.exists() {
                return Err(ConfigError::MissingPath { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Cache file location for this run.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(".refractor-cache.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_latest_version() {
        let config = RunConfig::default();
        assert_eq!(config.php_version, PhpVersion::Php84);
        assert_eq!(config.sets, vec!["up-to-php84".to_string()]);
        assert!(config.parallel);
        assert!(!config.cache);
        assert_eq!(config.max_passes, 10);
        assert!(config.import_short_classes);
    }

    #[test]
    fn partial_file_fills_the_rest() {
        let config: RunConfig = toml::from_str(
            r#"
                php_version = "7.4"
                sets = ["up-to-php74", "code-quality"]
                skip = ["ternary-to-elvis"]
            "#,
        )
        .unwrap();
        assert_eq!(config.php_version, PhpVersion::Php74);
        assert_eq!(config.sets.len(), 2);
        assert_eq!(config.skip, vec!["ternary-to-elvis".to_string()]);
        assert_eq!(config.max_passes, 10);
    }

    #[test]
    fn version_accepts_tag_spelling() {
        let config: RunConfig = toml::from_str("php_version = \"php80\"").unwrap();
        assert_eq!(config.php_version, PhpVersion::Php80);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<RunConfig>("php_verison = \"8.0\"");
        assert!(err.is_err());
    }

    #[test]
    fn zero_max_passes_fails_validation() {
        let config = RunConfig {
            max_passes: 0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPasses)));
    }

    #[test]
    fn missing_path_fails_validation() {
        let config = RunConfig {
            paths: vec![PathBuf::from("/no/such/path/anywhere")],
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPath { .. })
        ));
    }

    #[test]
    fn glob_paths_skip_the_existence_check() {
        let config = RunConfig {
            paths: vec![PathBuf::from("src/**/*.php")],
            ..RunConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
