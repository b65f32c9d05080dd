//! druptor-core: Core abstractions for rewriting deprecated Drupal PHP code
//!
//! This crate provides:
//! - `Edit`: A span-based code modification
//! - `apply_edits()`: Function to apply edits preserving formatting
//! - `line_indent()`: Helper to recover the indentation of a statement
//! - `Visitor`: Trait for traversing PHP AST with statement context

mod edit;
pub mod visitor;

pub use edit::{apply_edits, line_indent, Edit, EditError};
pub use visitor::{visit, Visitor};
