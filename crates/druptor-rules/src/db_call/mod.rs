//! Rule: db_call (Drupal 9 compatibility)
//!
//! Rewrites the procedural database API removed in Drupal 9 (`db_query()`,
//! `db_delete()`, `db_and()`, ...) to the object-oriented replacements.
//!
//! Example transformation:
//! ```php
//! // Before
//! db_add_field($table, $field, $spec);
//! $result = db_close();
//!
//! // After
//! \Drupal::service('database')->schema()->addField($table, $field, $spec);
//! $result = \Drupal\Core\Database\Database::closeConnection();
//! ```
//!
//! `db_delete()` with an options argument that cannot be inspected
//! statically is rewritten at statement level: the original statement is
//! replaced by a temporary options binding, a target-normalizing
//! conditional, and the rewritten call.

pub mod catalog;
pub mod engine;
pub mod options;

use mago_span::HasSpan;
use mago_syntax::ast::*;

use druptor_core::{line_indent, Edit, Visitor};

use self::engine::Rewrite;
use crate::registry::Rule;

/// Check a parsed PHP program for deprecated `db_*` calls
pub fn check_db_call<'a>(program: &Program<'a>, source: &str) -> Vec<Edit> {
    let mut visitor = DbCallVisitor {
        source,
        edits: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.edits
}

struct DbCallVisitor<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'a, 's> Visitor<'a> for DbCallVisitor<'s> {
    /// Statement-position calls are handled here so the multi-statement
    /// `db_delete` path can replace the whole statement.
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        let Statement::Expression(expr_stmt) = stmt else {
            return true;
        };
        let Expression::Call(Call::Function(call)) = expr_stmt.expression else {
            return true;
        };

        match engine::rewrite_call(call, self.source, true) {
            Rewrite::Expression(replacement) => {
                self.edits.push(Edit::new(
                    expr_stmt.expression.span(),
                    replacement,
                    rewrite_message(call, self.source),
                ));
                // The replacement keeps the original argument text; nested
                // deprecated calls inside it are picked up on the next pass.
                false
            }
            Rewrite::Statements(statements) => {
                let stmt_span = stmt.span();
                let indent = line_indent(self.source, stmt_span.start.offset as usize);
                let replacement = statements.join(&format!("\n{}", indent));
                self.edits.push(Edit::new(
                    stmt_span,
                    replacement,
                    rewrite_message(call, self.source),
                ));
                false
            }
            Rewrite::Unchanged => true,
        }
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(call)) = expr {
            if let Rewrite::Expression(replacement) =
                engine::rewrite_call(call, self.source, false)
            {
                self.edits.push(Edit::new(
                    expr.span(),
                    replacement,
                    rewrite_message(call, self.source),
                ));
                return false;
            }
        }
        true
    }
}

fn rewrite_message(call: &FunctionCall<'_>, source: &str) -> String {
    let name = if let Expression::Identifier(ident) = call.function {
        let span = ident.span();
        &source[span.start.offset as usize..span.end.offset as usize]
    } else {
        "db_*"
    };
    format!(
        "Replace deprecated {}() with the object-oriented database API",
        name
    )
}

pub struct DbCallRule;

impl DbCallRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DbCallRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DbCallRule {
    fn name(&self) -> &'static str {
        "db_call"
    }

    fn description(&self) -> &'static str {
        "Replace removed db_*() database functions with the object-oriented API"
    }

    fn check<'a>(&self, program: &Program<'a>, source: &str) -> Vec<Edit> {
        check_db_call(program, source)
    }
}
