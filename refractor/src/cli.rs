//! CLI argument parsing using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use refractor_core::PhpVersion;

use crate::version;

/// Rule-based PHP source modernizer
#[derive(Parser, Debug)]
#[command(name = "refractor")]
#[command(author, version, long_version = version::long(), about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Rewrite a project in place for PHP 8.0
    refractor run src/ --php-version 8.0

    # Show what the code-quality set would change, without writing
    refractor dry-run src/ --sets code-quality

    # Everything up to PHP 7.4, but keep long closures
    refractor run src/ --sets up-to-php74 --skip closure-to-arrow-function

    # Machine-readable report for CI
    refractor dry-run src/ --format json

    # See what ships with the tool
    refractor list-rules
    refractor list-sets
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the selected rule sets and write changes to disk
    Run(RunArgs),
    /// Report what would change without touching any file
    DryRun(RunArgs),
    /// List every built-in rule with its set and version bound
    ListRules,
    /// List the registered rule set tags
    ListSets,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Files or directories to process (defaults to the current directory)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Configuration file (default: refractor.toml, discovered upward)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Rule set tags to apply, e.g. php74 or up-to-php80
    #[arg(short = 's', long = "sets", value_delimiter = ',')]
    pub sets: Vec<String>,

    /// Target PHP version, e.g. 7.4 or 8.0
    #[arg(long = "php-version")]
    pub php_version: Option<PhpVersion>,

    /// Rule ids to skip, on top of any configured skips
    #[arg(long = "skip", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Glob patterns for paths to leave alone
    #[arg(long = "skip-path")]
    pub skip_paths: Vec<String>,

    /// Number of parallel workers (0 = one per CPU)
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Process files one at a time
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,

    /// Skip files that were clean in the previous run
    #[arg(long = "cache")]
    pub cache: bool,

    /// Cache file location
    #[arg(long = "cache-path")]
    pub cache_path: Option<PathBuf>,

    /// Shorten fully qualified class names and add use statements
    #[arg(long = "import-names")]
    pub import_names: bool,

    /// Output format: text (default), json
    #[arg(short = 'o', long = "format", default_value = "text")]
    pub format: String,
}
