//! Output formatting for druptor
//!
//! Supports text (colored terminal), JSON and unified-diff output.

use colored::*;
use serde::Serialize;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Information about a single edit
#[derive(Debug, Clone, Serialize)]
pub struct EditInfo {
    pub rule: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Per-file entry in the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<EditInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_edits: usize,
    pub errors: usize,
}

#[derive(Debug, Serialize)]
struct JsonOutput {
    version: String,
    summary: Summary,
    files: Vec<FileReport>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileReport>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report a file with pending changes (check mode)
    pub fn report_check(
        &mut self,
        path: &Path,
        edits: Vec<EditInfo>,
        old_source: &str,
        new_source: &str,
    ) {
        self.summary.files_processed += 1;
        self.summary.files_with_changes += 1;
        self.summary.total_edits += edits.len();

        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                print_changed_lines(old_source, new_source);
                for edit in &edits {
                    println!("  {} {}:{} {}", "->".green(), edit.line, edit.column, edit.message);
                }
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(path, old_source, new_source);
            }
            OutputFormat::Json => {}
        }

        self.results.push(FileReport {
            path: path.display().to_string(),
            edits,
            error: None,
        });
    }

    /// Report a file after applying fixes
    pub fn report_fix(&mut self, path: &Path, edits: Vec<EditInfo>) {
        self.summary.files_processed += 1;
        self.summary.files_with_changes += 1;
        self.summary.total_edits += edits.len();

        if self.format == OutputFormat::Text {
            println!(
                "{} {} ({} change(s))",
                "Fixed".green(),
                path.display(),
                edits.len()
            );
        }

        self.results.push(FileReport {
            path: path.display().to_string(),
            edits,
            error: None,
        });
    }

    /// Report a file with nothing to do
    pub fn report_skipped(&mut self, path: &Path) {
        self.summary.files_processed += 1;
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: No changes needed", path.display());
        }
        self.results.push(FileReport {
            path: path.display().to_string(),
            edits: Vec::new(),
            error: None,
        });
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        self.summary.files_processed += 1;
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), error);
        }

        self.results.push(FileReport {
            path: path.display().to_string(),
            edits: Vec::new(),
            error: Some(error.to_string()),
        });
    }

    /// Print final summary/output
    pub fn finish(self, check_mode: bool) {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Total edits: {}", self.summary.total_edits);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }

                if check_mode && self.summary.total_edits > 0 {
                    println!();
                    println!("{}", "Run with --fix to apply changes".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            }
            OutputFormat::Diff => {
                // Each file's diff was printed as it was processed.
            }
        }
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

/// Print only the changed lines, colored
fn print_changed_lines(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => println!("  {}", format!("- {}", l).red()),
            diff::Result::Right(r) => println!("  {}", format!("+ {}", r).green()),
            diff::Result::Both(_, _) => {}
        }
    }
}

/// Print unified diff format (standard diff -u compatible)
fn print_unified_diff(path: &Path, old: &str, new: &str) {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();

    println!("--- a/{}", path_str);
    println!("+++ b/{}", path_str);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            print!("{}{}", sign, change);
            if change.missing_newline() {
                println!();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_json_serialization() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                files_processed: 4,
                files_with_changes: 1,
                total_edits: 3,
                errors: 0,
            },
            files: vec![FileReport {
                path: "update.php".to_string(),
                edits: vec![EditInfo {
                    rule: "db_call".to_string(),
                    line: 12,
                    column: 3,
                    message: "Replace deprecated db_delete()".to_string(),
                }],
                error: None,
            }],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"files_processed\":4"));
        assert!(json.contains("\"rule\":\"db_call\""));
    }
}
