//! Rule trait and registry for druptor rewrite rules

use druptor_core::Edit;
use mago_syntax::ast::Program;
use std::collections::HashSet;

/// A rewrite rule that can detect and suggest code transformations
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g., "db_call")
    fn name(&self) -> &'static str;

    /// A short description of what this rule does
    fn description(&self) -> &'static str;

    /// Check a PHP program and return suggested edits
    fn check<'a>(&self, program: &Program<'a>, source: &str) -> Vec<Edit>;
}

/// Registry of all available rewrite rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        let mut registry = Self { rules: Vec::new() };

        registry.register(Box::new(super::db_call::DbCallRule));

        registry
    }

    /// Register a new rule
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Get all rule names
    pub fn all_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Get rules filtered by enabled names
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .filter(|r| enabled.contains(r.name()))
            .map(|r| r.as_ref())
            .collect()
    }

    /// Get all rules with their descriptions (for --list-rules)
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect()
    }

    /// Run all enabled rules on a program
    pub fn check_all<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        enabled: &HashSet<String>,
    ) -> Vec<Edit> {
        let mut edits = Vec::new();
        for rule in self.get_enabled(enabled) {
            edits.extend(rule.check(program, source));
        }
        edits
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_registered() {
        let registry = RuleRegistry::new();
        assert!(registry.all_names().contains(&"db_call"));
    }

    #[test]
    fn test_get_enabled_filters() {
        let registry = RuleRegistry::new();

        let mut enabled = HashSet::new();
        enabled.insert("db_call".to_string());
        assert_eq!(registry.get_enabled(&enabled).len(), 1);

        let none: HashSet<String> = HashSet::new();
        assert!(registry.get_enabled(&none).is_empty());
    }

    #[test]
    fn test_list_rules_has_descriptions() {
        let registry = RuleRegistry::new();
        for (name, description) in registry.list_rules() {
            assert!(!name.is_empty());
            assert!(!description.is_empty());
        }
    }
}
