//! druptor - batch rewriter for deprecated Drupal database API calls
//!
//! Walks Drupal PHP sources (`.php`, `.module`, `.inc`, `.install`,
//! `.theme`, `.profile`), runs the registered rewrite rules and either
//! reports or applies the resulting edits.

mod config;
mod output;
mod process;

use anyhow::Result;
use clap::Parser;
use colored::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use output::{EditInfo, OutputFormat, Reporter};
use process::{process_file, write_file};
use druptor_rules::RuleRegistry;

/// File extensions Drupal ships PHP code under
const PHP_EXTENSIONS: &[&str] = &["php", "module", "inc", "install", "theme", "profile"];

#[derive(Parser)]
#[command(name = "druptor")]
#[command(version)]
#[command(about = "Rewrite deprecated Drupal database API calls")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Check for deprecated calls without applying fixes (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Apply fixes to files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Path to config file (default: auto-detect .druptor.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let registry = RuleRegistry::new();

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for (name, description) in registry.list_rules() {
            println!("  {} - {}", name.green(), description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let output_format = OutputFormat::from_str(&cli.format).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: text, json, diff",
            cli.format
        )
    })?;

    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        if cli.verbose && output_format == OutputFormat::Text {
            println!("{}: {}", "Using config".bold(), config_path.display());
        }
        cfg
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                if cli.verbose && output_format == OutputFormat::Text {
                    println!("{}: {}", "Using config".bold(), path.display());
                }
                cfg
            }
            None => Config::default(),
        }
    };

    let all_rules = registry.all_names();

    for rule in &cli.rule {
        if !all_rules.contains(&rule.as_str()) {
            eprintln!(
                "{}: Unknown rule '{}'. Use --list-rules to see available rules.",
                "Error".red(),
                rule
            );
            return Ok(ExitCode::from(1));
        }
    }

    let enabled_rules = config.effective_rules(&all_rules, &cli.rule);
    if enabled_rules.is_empty() {
        eprintln!("{}: No rules enabled", "Error".red());
        return Ok(ExitCode::from(1));
    }

    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    // Collect all file paths first.
    let mut file_paths: Vec<PathBuf> = Vec::new();
    let mut missing_paths: Vec<PathBuf> = Vec::new();

    for path in &cli.paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_php_extension(e.path()))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    // Process files in parallel, then report in deterministic path order.
    let mut results: Vec<(FileResult, &PathBuf)> = file_paths
        .par_iter()
        .map(|path| (process_to_result(path, &registry, &enabled_rules), path))
        .collect();
    results.sort_by(|a, b| a.1.cmp(b.1));

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!(
                "{}: Path does not exist: {}",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    for (result, path) in results {
        report_result(path, result, fix_mode, &mut reporter)?;
    }

    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode);

    Ok(exit_code)
}

fn has_php_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHP_EXTENSIONS.contains(&ext))
}

/// Result of processing a single file (for parallel processing)
enum FileResult {
    NoChanges,
    HasChanges {
        edits: Vec<EditInfo>,
        old_source: String,
        new_source: String,
    },
    ParseError,
    Error(String),
}

/// Process a file and return a result (no output, suitable for rayon)
fn process_to_result(
    path: &PathBuf,
    registry: &RuleRegistry,
    enabled_rules: &HashSet<String>,
) -> FileResult {
    match process_file(path, registry, enabled_rules) {
        Ok(Some(result)) => {
            if result.edits.is_empty() {
                FileResult::NoChanges
            } else {
                FileResult::HasChanges {
                    edits: result.edits,
                    old_source: result.old_source,
                    new_source: result.new_source.unwrap_or_default(),
                }
            }
        }
        Ok(None) => FileResult::ParseError,
        Err(e) => FileResult::Error(format!("{:#}", e)),
    }
}

/// Report a file result and optionally apply fixes
fn report_result(
    path: &PathBuf,
    result: FileResult,
    fix_mode: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    match result {
        FileResult::NoChanges => {
            reporter.report_skipped(path);
        }
        FileResult::HasChanges {
            edits,
            old_source,
            new_source,
        } => {
            if fix_mode {
                write_file(path, &new_source)?;
                reporter.report_fix(path, edits);
            } else {
                reporter.report_check(path, edits, &old_source, &new_source);
            }
        }
        FileResult::ParseError => {
            reporter.report_error(path, "Parse error, skipping");
        }
        FileResult::Error(msg) => {
            reporter.report_error(path, &msg);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_php_extension() {
        assert!(has_php_extension(Path::new("update.php")));
        assert!(has_php_extension(Path::new("node.module")));
        assert!(has_php_extension(Path::new("system.install")));
        assert!(has_php_extension(Path::new("common.inc")));
        assert!(!has_php_extension(Path::new("readme.md")));
        assert!(!has_php_extension(Path::new("script.sh")));
        assert!(!has_php_extension(Path::new("Makefile")));
    }
}
