//! druptor-rules: Rewrite rules for deprecated Drupal APIs
//!
//! Available rules:
//! - db_call: Replace removed db_*() database functions with the
//!   object-oriented database API

pub mod db_call;
pub mod registry;

pub use db_call::check_db_call;
pub use registry::{Rule, RuleRegistry};
