//! refractor - rule-based PHP source modernizer
//!
//! This is the main CLI entry point: it resolves the configuration, builds
//! the engine for the selected rule sets, runs it over the input paths and
//! prints the report.

mod cli;
mod version;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use log::debug;

use refractor_core::{Engine, EngineState, Registry, RunConfig, RunReport};

use cli::{Cli, Command, RunArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run(args) => execute(args, true),
        Command::DryRun(args) => execute(args, false),
        Command::ListRules => {
            list_rules();
            Ok(ExitCode::SUCCESS)
        }
        Command::ListSets => {
            list_sets();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn execute(args: RunArgs, write: bool) -> Result<ExitCode> {
    if !matches!(args.format.as_str(), "text" | "json") {
        bail!("invalid format '{}'. Valid formats: text, json", args.format);
    }

    let config = build_config(&args)?;
    let registry = Registry::builtin();
    let engine = Engine::new(config, &registry)?;

    let report = engine.run(write);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&report);
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// Loads the config file (explicit, discovered, or defaults) and lays the
/// command line flags over it.
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => match RunConfig::discover(&std::env::current_dir()?) {
            Some(path) => {
                debug!("using config {}", path.display());
                RunConfig::load(&path)?
            }
            None => RunConfig::default(),
        },
    };

    if !args.paths.is_empty() {
        config.paths = args.paths.clone();
    } else if config.paths.is_empty() {
        config.paths = vec![PathBuf::from(".")];
    }
    if !args.sets.is_empty() {
        config.sets = args.sets.clone();
    }
    if let Some(php_version) = args.php_version {
        config.php_version = php_version;
    }
    config.skip.extend(args.skip.iter().cloned());
    config.skip_paths.extend(args.skip_paths.iter().cloned());
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if args.no_parallel {
        config.parallel = false;
    }
    if args.cache {
        config.cache = true;
    }
    if let Some(path) = &args.cache_path {
        config.cache_path = Some(path.clone());
    }
    if args.import_names {
        config.import_names = true;
    }
    Ok(config)
}

fn print_text_report(report: &RunReport) {
    for file in &report.files {
        if file.state == EngineState::Failed {
            if let Some(error) = &file.error {
                eprintln!("{}: {}", file.path.display(), error);
            }
            continue;
        }
        for change in &file.changes {
            println!("{}:{}  {}", file.path.display(), change.line, change.rule_id);
            for line in change.before.lines() {
                println!("  - {}", line);
            }
            for line in change.after.lines() {
                println!("  + {}", line);
            }
        }
        for warning in &file.warnings {
            eprintln!("warning: {}: {}", file.path.display(), warning);
        }
    }

    let verb = if report.dry_run { "would change" } else { "changed" };
    let mut summary = format!(
        "{} {} of {} files ({} changes)",
        verb,
        report.changed_files(),
        report.files.len() + report.skipped,
        report.total_changes(),
    );
    if report.skipped > 0 {
        summary.push_str(&format!(", {} cached", report.skipped));
    }
    if report.failed_files() > 0 {
        summary.push_str(&format!(", {} failed", report.failed_files()));
    }
    println!("{}", summary);
}

fn list_rules() {
    let registry = Registry::builtin();
    for set in registry.sets() {
        for rule in &set.rules {
            let bound = rule
                .min_version()
                .map(|v| format!(" (needs {})", v))
                .unwrap_or_default();
            println!(
                "{:32} [{}]{}\n    {}",
                rule.id(),
                set.tag,
                bound,
                rule.description()
            );
        }
    }
}

fn list_sets() {
    let registry = Registry::builtin();
    for set in registry.sets() {
        println!("{:20} {} rules", set.tag, set.rules.len());
    }
    println!();
    println!("Level tags: up-to-<version> (e.g. up-to-php74) selects every version set at or below it.");
}
