//! Inspection and mutation of `$options` array arguments
//!
//! Several deprecated `db_*` functions take an options array whose `target`
//! key routes the query to a named connection. These helpers read that key
//! out of literal arrays and rewrite its value. Anything that is not a
//! literal array (a variable, a call result) is opaque: its contents must
//! never be guessed, so extraction reports `Unknown` and callers decline to
//! rewrite.

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

/// What the `target` key of an options argument resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsTarget {
    /// A literal array with a `target` key; span of the value expression.
    /// With duplicate keys the last one wins, matching PHP array semantics.
    Concrete(Span),
    /// A literal array without a `target` key: an explicit null/default target
    Null,
    /// Not a literal array; nothing can be known about its contents
    Unknown,
}

/// Read the `target` entry out of an options argument
pub fn extract_target(expr: &Expression<'_>, source: &str) -> OptionsTarget {
    let Some(elements) = literal_array_elements(expr) else {
        return OptionsTarget::Unknown;
    };

    let mut found = None;
    for elem in elements {
        if let ArrayElement::KeyValue(kv) = elem {
            if is_target_key(&kv.key, source) {
                found = Some(kv.value.span());
            }
        }
    }

    match found {
        Some(span) => OptionsTarget::Concrete(span),
        None => OptionsTarget::Null,
    }
}

/// Re-render a literal options array with the value of every `target` entry
/// replaced by `literal`. Returns the original array text when there is no
/// `target` key, and `None` when the expression is not a literal array.
///
/// Note the asymmetry with [`extract_target`]: extraction takes the last
/// duplicate, mutation rewrites all of them. Duplicate keys are malformed
/// input; rewriting every occurrence keeps the array consistent either way.
pub fn rewrite_target_values(
    expr: &Expression<'_>,
    source: &str,
    literal: &str,
) -> Option<String> {
    let elements = literal_array_elements(expr)?;

    let array_span = expr.span();
    let array_start = array_span.start.offset as usize;
    let mut text = source[array_start..array_span.end.offset as usize].to_string();

    let value_spans: Vec<Span> = elements
        .into_iter()
        .filter_map(|elem| match elem {
            ArrayElement::KeyValue(kv) if is_target_key(&kv.key, source) => {
                Some(kv.value.span())
            }
            _ => None,
        })
        .collect();

    // Splice back to front so earlier offsets stay valid.
    for span in value_spans.iter().rev() {
        let start = span.start.offset as usize - array_start;
        let end = span.end.offset as usize - array_start;
        text.replace_range(start..end, literal);
    }

    Some(text)
}

/// The content of a string literal expression, without its quotes
pub fn string_literal_content<'s>(expr: &Expression<'_>, source: &'s str) -> Option<&'s str> {
    if let Expression::Literal(Literal::String(string_lit)) = expr {
        let text = &source[string_lit.span().start.offset as usize
            ..string_lit.span().end.offset as usize];
        if text.len() >= 2 {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

fn is_target_key(key: &Expression<'_>, source: &str) -> bool {
    string_literal_content(key, source) == Some("target")
}

/// Elements of a literal array in either syntax, or `None` for anything else
fn literal_array_elements<'e, 'a>(
    expr: &'e Expression<'a>,
) -> Option<Vec<&'e ArrayElement<'a>>> {
    match expr {
        Expression::Array(arr) => Some(arr.elements.iter().collect()),
        Expression::LegacyArray(arr) => Some(arr.elements.iter().collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;

    /// Parse `source` and hand the first argument of the first function call
    /// to `f`
    fn with_first_argument<R>(source: &str, f: impl FnOnce(&Expression<'_>, &str) -> R) -> R {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);

        for stmt in program.statements.iter() {
            if let Statement::Expression(expr_stmt) = stmt {
                if let Expression::Call(Call::Function(call)) = expr_stmt.expression {
                    let arg = call
                        .argument_list
                        .arguments
                        .first()
                        .expect("call has no arguments");
                    return f(arg.value(), source);
                }
            }
        }
        panic!("no function call in test source");
    }

    fn target_text(source: &str) -> Option<String> {
        with_first_argument(source, |expr, src| match extract_target(expr, src) {
            OptionsTarget::Concrete(span) => {
                Some(src[span.start.offset as usize..span.end.offset as usize].to_string())
            }
            _ => None,
        })
    }

    #[test]
    fn test_extract_concrete() {
        let source = "<?php f(['target' => 'replica']);";
        assert_eq!(target_text(source).as_deref(), Some("'replica'"));
    }

    #[test]
    fn test_extract_non_literal_value_is_still_concrete() {
        let source = "<?php f(['target' => $t]);";
        assert_eq!(target_text(source).as_deref(), Some("$t"));
    }

    #[test]
    fn test_extract_last_duplicate_wins() {
        let source = "<?php f(['target' => 'a', 'target' => 'b']);";
        assert_eq!(target_text(source).as_deref(), Some("'b'"));
    }

    #[test]
    fn test_extract_null_when_key_absent() {
        let source = "<?php f(['fetch' => 1]);";
        with_first_argument(source, |expr, src| {
            assert_eq!(extract_target(expr, src), OptionsTarget::Null);
        });
    }

    #[test]
    fn test_extract_unknown_for_opaque_expression() {
        let source = "<?php f($options);";
        with_first_argument(source, |expr, src| {
            assert_eq!(extract_target(expr, src), OptionsTarget::Unknown);
        });
    }

    #[test]
    fn test_extract_legacy_array_syntax() {
        let source = "<?php f(array('target' => 'replica'));";
        assert_eq!(target_text(source).as_deref(), Some("'replica'"));
    }

    #[test]
    fn test_rewrite_target_value() {
        let source = "<?php f(['target' => 'replica', 'fetch' => 2]);";
        with_first_argument(source, |expr, src| {
            let text = rewrite_target_values(expr, src, "'default'").unwrap();
            assert_eq!(text, "['target' => 'default', 'fetch' => 2]");
        });
    }

    #[test]
    fn test_rewrite_all_duplicates() {
        let source = "<?php f(['target' => 'a', 'target' => 'b']);";
        with_first_argument(source, |expr, src| {
            let text = rewrite_target_values(expr, src, "'default'").unwrap();
            assert_eq!(text, "['target' => 'default', 'target' => 'default']");
        });
    }

    #[test]
    fn test_rewrite_without_target_key_is_identity() {
        let source = "<?php f(['fetch' => 2]);";
        with_first_argument(source, |expr, src| {
            let text = rewrite_target_values(expr, src, "'default'").unwrap();
            assert_eq!(text, "['fetch' => 2]");
        });
    }

    #[test]
    fn test_rewrite_opaque_is_none() {
        let source = "<?php f($options);";
        with_first_argument(source, |expr, src| {
            assert!(rewrite_target_values(expr, src, "'default'").is_none());
        });
    }
}
