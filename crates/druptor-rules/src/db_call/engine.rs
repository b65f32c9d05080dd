//! Rewrite engine: per-call strategy dispatch
//!
//! Given one function call node, the engine looks up the catalog entry for
//! its name and produces a [`Rewrite`] value describing the replacement. It
//! is a pure function of the call node and the source text: tree and source
//! mutation is the caller's job. A call whose name is not in the catalog, or
//! whose callee is not a static identifier, always comes back `Unchanged`.

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use super::catalog::{self, CatalogEntry, Strategy};
use super::options::{self, OptionsTarget};

/// Replacement class for connection management
pub const DATABASE_CLASS: &str = "\\Drupal\\Core\\Database\\Database";
/// Replacement class for condition construction
pub const CONDITION_CLASS: &str = "\\Drupal\\Core\\Database\\Query\\Condition";

/// Base expression fetching the default database service
const SERVICE_BASE: &str = "\\Drupal::service('database')";

/// Temporary variable used when options must be normalized at runtime
const OPTIONS_BINDING: &str = "$_db_options";

/// Outcome of rewriting one call expression.
///
/// `Statements` is an edit script: the statements replace the enclosing
/// expression statement in the given program order, and the original
/// statement is deleted. Replace-and-stop is modeled explicitly rather than
/// returning the doomed original node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Not a deprecated call, or rewriting would not be safe
    Unchanged,
    /// Replacement text for the call expression itself
    Expression(String),
    /// Statements replacing the whole enclosing expression statement
    Statements(Vec<String>),
}

/// Rewrite one function call. `statement_position` is true when the call is
/// itself an entire expression statement, which is the only position where
/// the multi-statement `db_delete` path may apply.
pub fn rewrite_call(
    call: &FunctionCall<'_>,
    source: &str,
    statement_position: bool,
) -> Rewrite {
    // Dynamic and computed callees are skipped on purpose: rewriting
    // `$func(...)` would require knowing the callee at runtime.
    let name = if let Expression::Identifier(ident) = call.function {
        text(ident.span(), source)
    } else {
        return Rewrite::Unchanged;
    };

    let Some(entry) = catalog::lookup(name) else {
        return Rewrite::Unchanged;
    };

    let args_text = text(call.argument_list.span(), source);

    match entry.strategy {
        Strategy::InjectedService if catalog::is_custom_handling(name) => {
            if name.eq_ignore_ascii_case("db_delete") {
                rewrite_delete(call, entry, source, statement_position)
            } else {
                // The uniform rewrite is known to be wrong for these when an
                // $options argument routes to another connection. Until each
                // gets its own path, leaving the call alone beats rewriting
                // it incorrectly.
                Rewrite::Unchanged
            }
        }
        Strategy::InjectedService => Rewrite::Expression(service_chain(entry, args_text)),
        Strategy::CloseConnection => rewrite_close(call, source),
        Strategy::Condition => rewrite_condition(entry, args_text),
        Strategy::SetActiveConnection => Rewrite::Expression(format!(
            "{}::setActiveConnection{}",
            DATABASE_CLASS, args_text
        )),
    }
}

/// Fold the catalog method chain onto the injected service expression.
/// Navigation methods get no arguments; the final method receives the
/// original argument list verbatim.
fn service_chain(entry: &CatalogEntry, args_text: &str) -> String {
    let mut out = String::from(SERVICE_BASE);
    if let Some((last, navigation)) = entry.chain.split_last() {
        for method in navigation {
            out.push_str("->");
            out.push_str(method);
            out.push_str("()");
        }
        out.push_str("->");
        out.push_str(last);
        out.push_str(args_text);
    }
    out
}

/// `db_close([$options])` → `Database::closeConnection([$target])`
fn rewrite_close(call: &FunctionCall<'_>, source: &str) -> Rewrite {
    let Some(arg) = call.argument_list.arguments.first() else {
        return Rewrite::Expression(format!("{}::closeConnection()", DATABASE_CLASS));
    };

    match options::extract_target(arg.value(), source) {
        OptionsTarget::Concrete(span) => Rewrite::Expression(format!(
            "{}::closeConnection({})",
            DATABASE_CLASS,
            text(span, source)
        )),
        // No target key means the default connection.
        OptionsTarget::Null => {
            Rewrite::Expression(format!("{}::closeConnection()", DATABASE_CLASS))
        }
        OptionsTarget::Unknown => Rewrite::Unchanged,
    }
}

/// `db_and()`/`db_or()`/`db_xor()` carry their operator in the catalog and
/// discard any arguments; `db_condition($op)` forwards its own arguments.
fn rewrite_condition(entry: &CatalogEntry, args_text: &str) -> Rewrite {
    match entry.parameter {
        Some(operator) => Rewrite::Expression(format!(
            "new {}('{}')",
            CONDITION_CLASS, operator
        )),
        None => Rewrite::Expression(format!("new {}{}", CONDITION_CLASS, args_text)),
    }
}

/// The argument-aware `db_delete` path.
///
/// Without options this is the uniform service rewrite. With a literal
/// options array the target is either normalized to `'default'` in place
/// (default/replica/absent) or routed through `Database::getConnection()`.
/// An options value that cannot be inspected statically forces the rewrite
/// to happen at runtime: three statements replace the original call.
fn rewrite_delete(
    call: &FunctionCall<'_>,
    entry: &CatalogEntry,
    source: &str,
    statement_position: bool,
) -> Rewrite {
    let args: Vec<_> = call.argument_list.arguments.iter().collect();
    let list_span = call.argument_list.span();
    let args_text = text(list_span, source);

    if args.len() < 2 {
        return Rewrite::Expression(service_chain(entry, args_text));
    }

    let options_expr = args[1].value();

    match options::extract_target(options_expr, source) {
        OptionsTarget::Concrete(value_span) => {
            let value_text = text(value_span, source);
            match quoted_content(value_text) {
                Some("default") | Some("replica") => {
                    // Replica reads make no sense for a delete; force the
                    // default connection in the options array itself.
                    let Some(mutated) =
                        options::rewrite_target_values(options_expr, source, "'default'")
                    else {
                        return Rewrite::Unchanged;
                    };
                    let new_args =
                        splice_argument(args_text, list_span, options_expr.span(), &mutated);
                    Rewrite::Expression(service_chain(entry, &new_args))
                }
                Some(_) => Rewrite::Expression(format!(
                    "{}::getConnection({})->delete{}",
                    DATABASE_CLASS, value_text, args_text
                )),
                // Target present but not a string literal: runtime value.
                None => delete_statements(source, list_span, args_text, options_expr, statement_position),
            }
        }
        OptionsTarget::Null => Rewrite::Expression(service_chain(entry, args_text)),
        OptionsTarget::Unknown => {
            delete_statements(source, list_span, args_text, options_expr, statement_position)
        }
    }
}

/// Synthesize the runtime-normalizing statement sequence for `db_delete`
/// with options that cannot be inspected statically:
///
/// ```php
/// $_db_options = $options;
/// if (empty($_db_options['target']) || $_db_options['target'] === 'replica') { ... }
/// \Drupal\Core\Database\Database::getConnection($_db_options['target'])->delete(...);
/// ```
///
/// Only possible when the call is a whole expression statement; anywhere
/// else the call's value is consumed by surrounding code and the original
/// statement cannot simply be replaced, so nothing is rewritten.
fn delete_statements(
    source: &str,
    list_span: Span,
    args_text: &str,
    options_expr: &Expression<'_>,
    statement_position: bool,
) -> Rewrite {
    if !statement_position {
        return Rewrite::Unchanged;
    }

    let options_text = text(options_expr.span(), source);
    let new_args = splice_argument(args_text, list_span, options_expr.span(), OPTIONS_BINDING);

    Rewrite::Statements(vec![
        format!("{} = {};", OPTIONS_BINDING, options_text),
        format!(
            "if (empty({b}['target']) || {b}['target'] === 'replica') {{ {b}['target'] = 'default'; }}",
            b = OPTIONS_BINDING
        ),
        format!(
            "{}::getConnection({}['target'])->delete{};",
            DATABASE_CLASS, OPTIONS_BINDING, new_args
        ),
    ])
}

/// Replace one argument's text inside the rendered argument list
fn splice_argument(
    args_text: &str,
    list_span: Span,
    arg_span: Span,
    replacement: &str,
) -> String {
    let base = list_span.start.offset as usize;
    let start = arg_span.start.offset as usize - base;
    let end = arg_span.end.offset as usize - base;

    let mut out = args_text.to_string();
    out.replace_range(start..end, replacement);
    out
}

/// The content of a single- or double-quoted PHP string literal's rendered
/// text, or `None` when the text is not a simple quoted string
fn quoted_content(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if text.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[text.len() - 1] == bytes[0] {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

fn text(span: Span, source: &str) -> &str {
    &source[span.start.offset as usize..span.end.offset as usize]
}
