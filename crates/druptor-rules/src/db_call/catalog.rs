//! Static catalog of deprecated `db_*` functions and how to rewrite them
//!
//! Each deprecated procedural call maps to one of four rewrite strategies.
//! The catalog is pure data: lookups have no side effects and unknown names
//! simply return `None` (they are the expected majority case).

/// How a deprecated call is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Rewrite to a method chain on `\Drupal::service('database')`
    InjectedService,
    /// Rewrite to `Database::closeConnection(...)`, target-aware
    CloseConnection,
    /// Rewrite to `new Condition(...)`
    Condition,
    /// Rewrite to `Database::setActiveConnection(...)`
    SetActiveConnection,
}

/// One catalog row: a deprecated function name and its rewrite recipe
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Legacy function name, e.g. `db_add_field`
    pub name: &'static str,
    pub strategy: Strategy,
    /// Method chain folded onto the service expression. Every method except
    /// the last is called with no arguments; the last receives the original
    /// argument list. Empty for strategies that ignore it.
    pub chain: &'static [&'static str],
    /// Literal forwarded to the replacement constructor (`Condition` only)
    pub parameter: Option<&'static str>,
}

const fn service(name: &'static str, chain: &'static [&'static str]) -> CatalogEntry {
    CatalogEntry {
        name,
        strategy: Strategy::InjectedService,
        chain,
        parameter: None,
    }
}

const fn condition(name: &'static str, operator: Option<&'static str>) -> CatalogEntry {
    CatalogEntry {
        name,
        strategy: Strategy::Condition,
        chain: &[],
        parameter: operator,
    }
}

/// Every deprecated `db_*` function this rule knows how to rewrite
pub static CATALOG: &[CatalogEntry] = &[
    // Schema operations: reached through the `schema()` accessor.
    service("db_add_field", &["schema", "addField"]),
    service("db_add_index", &["schema", "addIndex"]),
    service("db_add_primary_key", &["schema", "addPrimaryKey"]),
    service("db_add_unique_key", &["schema", "addUniqueKey"]),
    service("db_create_table", &["schema", "createTable"]),
    service("db_drop_field", &["schema", "dropField"]),
    service("db_drop_index", &["schema", "dropIndex"]),
    service("db_drop_primary_key", &["schema", "dropPrimaryKey"]),
    service("db_drop_table", &["schema", "dropTable"]),
    service("db_drop_unique_key", &["schema", "dropUniqueKey"]),
    service("db_field_exists", &["schema", "fieldExists"]),
    service("db_field_names", &["schema", "fieldNames"]),
    service("db_field_set_default", &["schema", "fieldSetDefault"]),
    service("db_field_set_no_default", &["schema", "fieldSetNoDefault"]),
    service("db_find_tables", &["schema", "findTables"]),
    service("db_index_exists", &["schema", "indexExists"]),
    service("db_rename_table", &["schema", "renameTable"]),
    service("db_table_exists", &["schema", "tableExists"]),
    // Data operations: methods directly on the connection.
    service("db_delete", &["delete"]),
    service("db_insert", &["insert"]),
    service("db_merge", &["merge"]),
    service("db_query", &["query"]),
    service("db_query_range", &["queryRange"]),
    service("db_query_temporary", &["queryTemporary"]),
    service("db_select", &["select"]),
    service("db_update", &["update"]),
    service("db_truncate", &["truncate"]),
    service("db_transaction", &["startTransaction"]),
    service("db_driver", &["driver"]),
    service("db_escape_field", &["escapeField"]),
    service("db_escape_table", &["escapeTable"]),
    service("db_like", &["escapeLike"]),
    service("db_next_id", &["nextId"]),
    // Condition constructors.
    condition("db_and", Some("AND")),
    condition("db_or", Some("OR")),
    condition("db_xor", Some("XOR")),
    condition("db_condition", None),
    // Connection lifecycle.
    CatalogEntry {
        name: "db_close",
        strategy: Strategy::CloseConnection,
        chain: &[],
        parameter: None,
    },
    CatalogEntry {
        name: "db_set_active",
        strategy: Strategy::SetActiveConnection,
        chain: &[],
        parameter: None,
    },
];

/// Calls whose uniform method-chain rewrite is known to be semantically
/// incomplete (they accept an `$options` array that can route the query to a
/// different connection). Only `db_delete` has an implemented custom path;
/// the rest are deliberate no-ops until their paths are written, so they are
/// left untouched rather than rewritten incorrectly.
pub static CUSTOM_HANDLING: &[&str] = &[
    "db_delete",
    "db_field_set_default",
    "db_field_set_no_default",
    "db_insert",
    "db_merge",
    "db_query",
    "db_query_range",
    "db_query_temporary",
    "db_select",
    "db_transaction",
    "db_truncate",
    "db_update",
];

/// Look up a deprecated function by name. PHP function names are
/// case-insensitive, so the lookup is too.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

/// Whether this call needs argument-aware handling instead of the uniform
/// method-chain rewrite
pub fn is_custom_handling(name: &str) -> bool {
    CUSTOM_HANDLING
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known() {
        let entry = lookup("db_add_field").unwrap();
        assert_eq!(entry.strategy, Strategy::InjectedService);
        assert_eq!(entry.chain, &["schema", "addField"]);

        let entry = lookup("db_and").unwrap();
        assert_eq!(entry.strategy, Strategy::Condition);
        assert_eq!(entry.parameter, Some("AND"));

        let entry = lookup("db_condition").unwrap();
        assert_eq!(entry.parameter, None);

        assert_eq!(lookup("db_close").unwrap().strategy, Strategy::CloseConnection);
        assert_eq!(
            lookup("db_set_active").unwrap().strategy,
            Strategy::SetActiveConnection
        );
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("db_nonexistent").is_none());
        assert!(lookup("array_push").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert!(lookup("DB_AND").is_some());
        assert!(lookup("Db_Query").is_some());
    }

    #[test]
    fn test_no_duplicate_names() {
        let mut seen = HashSet::new();
        for entry in CATALOG {
            assert!(seen.insert(entry.name), "duplicate catalog key: {}", entry.name);
        }
    }

    #[test]
    fn test_custom_handling_subset_of_catalog() {
        for name in CUSTOM_HANDLING {
            assert!(
                lookup(name).is_some(),
                "custom-handling name not in catalog: {}",
                name
            );
        }
    }

    #[test]
    fn test_custom_handling_membership() {
        assert!(is_custom_handling("db_delete"));
        assert!(is_custom_handling("db_query"));
        assert!(is_custom_handling("DB_SELECT"));
        assert!(!is_custom_handling("db_add_field"));
        assert!(!is_custom_handling("db_close"));
        assert!(!is_custom_handling("db_and"));
    }

    #[test]
    fn test_chain_shapes() {
        for entry in CATALOG {
            match entry.strategy {
                Strategy::InjectedService => assert!(!entry.chain.is_empty()),
                _ => assert!(entry.chain.is_empty()),
            }
        }
    }
}
