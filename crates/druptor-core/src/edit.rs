//! Span-based source code editing with format preservation

use mago_span::Span;
use thiserror::Error;

/// Errors that can occur during edit application
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit span {start}..{end} out of bounds for source length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },
}

/// A single code edit: replace the text covered by `span` with `replacement`.
///
/// Replacing a whole statement with several new statements is expressed as
/// one edit whose replacement contains newline-joined statements; the rule
/// producing it is responsible for re-indenting continuation lines with
/// [`line_indent`]. Deleting code is an edit with an empty replacement.
#[derive(Debug, Clone)]
pub struct Edit {
    /// The source span to replace
    pub span: Span,
    /// The replacement text
    pub replacement: String,
    /// Human-readable description of the edit
    pub message: String,
}

impl Edit {
    pub fn new(span: Span, replacement: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            message: message.into(),
        }
    }

    /// Byte offset where this edit starts
    pub fn start_offset(&self) -> usize {
        self.span.start.offset as usize
    }

    /// Byte offset where this edit ends
    pub fn end_offset(&self) -> usize {
        self.span.end.offset as usize
    }
}

/// Apply edits to source code, preserving surrounding formatting.
///
/// Edits are applied from the end of the file toward the start so earlier
/// offsets stay valid. Overlapping or out-of-bounds edits are rejected as a
/// whole; no partial application happens.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| std::cmp::Reverse(e.start_offset()));

    validate(source.len(), &ordered)?;

    let mut result = source.to_string();
    for edit in ordered {
        let start = edit.start_offset();
        let end = edit.end_offset();

        let replacement = preserve_leading_whitespace(&source[start..end], &edit.replacement);
        result.replace_range(start..end, &replacement);
    }

    Ok(result)
}

/// Check bounds and overlap for edits sorted by descending start offset
fn validate(source_len: usize, ordered: &[&Edit]) -> Result<(), EditError> {
    let mut prev_start: Option<usize> = None;

    for edit in ordered {
        let start = edit.start_offset();
        let end = edit.end_offset();

        if end > source_len {
            return Err(EditError::SpanOutOfBounds {
                start,
                end,
                len: source_len,
            });
        }

        if let Some(prev) = prev_start {
            if end > prev {
                return Err(EditError::OverlappingEdits(start));
            }
        }

        prev_start = Some(start);
    }

    Ok(())
}

/// Keep the leading whitespace of the replaced text when the replacement
/// does not already carry it
fn preserve_leading_whitespace(original: &str, replacement: &str) -> String {
    let leading_ws: String = original.chars().take_while(|c| c.is_whitespace()).collect();

    if !leading_ws.is_empty() && !replacement.starts_with(&leading_ws) {
        format!("{}{}", leading_ws, replacement.trim_start())
    } else {
        replacement.to_string()
    }
}

/// Return the indentation (spaces and tabs) of the line containing `offset`.
///
/// Used when a rule replaces one statement with several: inserted statements
/// after the first are prefixed with this indentation so the result lines up
/// with the statement it replaced.
pub fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source[..offset.min(source.len())]
        .rfind('\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);

    let rest = &source[line_start..];
    let indent_len = rest
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    &rest[..indent_len]
}
