//! File processing logic for druptor

use anyhow::{Context, Result};
use bumpalo::Bump;
use mago_database::file::FileId;
use std::collections::HashSet;
use std::path::Path;

use druptor_core::apply_edits;
use druptor_rules::RuleRegistry;

use crate::output::EditInfo;

/// Result of processing a single file
pub struct ProcessResult {
    /// Edits that were found/applied
    pub edits: Vec<EditInfo>,
    /// Original source code
    pub old_source: String,
    /// New source code after edits (only if edits were found)
    pub new_source: Option<String>,
}

/// Process a single PHP file and return the edits found.
/// Returns `Ok(None)` when the file does not parse.
pub fn process_file(
    path: &Path,
    registry: &RuleRegistry,
    enabled_rules: &HashSet<String>,
) -> Result<Option<ProcessResult>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let arena = Bump::new();
    let file_id = FileId::new(path.to_string_lossy().as_ref());

    let (program, parse_error) = mago_syntax::parser::parse_file_content(&arena, file_id, &source);

    if parse_error.is_some() {
        return Ok(None);
    }

    // Run each enabled rule separately so edits stay attributed to the rule
    // that produced them.
    let mut edits = Vec::new();
    let mut edit_infos = Vec::new();
    for rule in registry.get_enabled(enabled_rules) {
        for edit in rule.check(program, &source) {
            let (line, column) = offset_to_line_column(&source, edit.start_offset());
            edit_infos.push(EditInfo {
                rule: rule.name().to_string(),
                line,
                column,
                message: edit.message.clone(),
            });
            edits.push(edit);
        }
    }

    if edits.is_empty() {
        return Ok(Some(ProcessResult {
            edits: vec![],
            old_source: source,
            new_source: None,
        }));
    }

    let new_source = apply_edits(&source, &edits)
        .with_context(|| format!("Failed to apply edits to {}", path.display()))?;

    Ok(Some(ProcessResult {
        edits: edit_infos,
        old_source: source,
        new_source: Some(new_source),
    }))
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Convert byte offset to line and column numbers (1-based)
fn offset_to_line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn enabled_all(registry: &RuleRegistry) -> HashSet<String> {
        registry.all_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_offset_to_line_column() {
        let source = "line1\nline2\nline3";
        assert_eq!(offset_to_line_column(source, 0), (1, 1));
        assert_eq!(offset_to_line_column(source, 5), (1, 6)); // newline
        assert_eq!(offset_to_line_column(source, 6), (2, 1)); // start of line2
        assert_eq!(offset_to_line_column(source, 12), (3, 1)); // start of line3
    }

    #[test]
    fn test_process_file_with_deprecated_call() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("update.php");
        fs::write(&path, "<?php db_drop_table('old');").unwrap();

        let registry = RuleRegistry::new();
        let result = process_file(&path, &registry, &enabled_all(&registry))
            .unwrap()
            .unwrap();

        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].rule, "db_call");
        assert!(result
            .new_source
            .unwrap()
            .contains("\\Drupal::service('database')->schema()->dropTable('old')"));
    }

    #[test]
    fn test_process_file_clean() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clean.php");
        fs::write(&path, "<?php echo 'hello';").unwrap();

        let registry = RuleRegistry::new();
        let result = process_file(&path, &registry, &enabled_all(&registry))
            .unwrap()
            .unwrap();

        assert!(result.edits.is_empty());
        assert!(result.new_source.is_none());
    }
}
