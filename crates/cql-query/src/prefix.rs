//! Prefix table populated by `>` declarations.

use std::collections::HashMap;

/// Name under which an unnamed `> uri` declaration is registered.
pub const DEFAULT_PREFIX: &str = "default";

/// Implicit prefix for relations written without one.
pub const RELATION_PREFIX: &str = "cql";

/// Per-parse mapping from prefix name to URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    /// Prefix name (case as written) to URI.
    entries: HashMap<String, String>,
}

impl PrefixTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, uri: impl Into<String>) {
        self.entries.insert(name.into(), uri.into());
    }

    /// Looks up the URI bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits a `prefix.name` field and resolves the prefix.
    ///
    /// Returns the field with the prefix stripped and its URI when the prefix
    /// is registered. Otherwise the field comes back untouched, dot included,
    /// with an empty URI.
    pub fn resolve_field(&self, field: &str) -> (String, String) {
        if let Some((prefix, local)) = field.split_once('.')
            && let Some(uri) = self.lookup(prefix)
        {
            return (local.to_string(), uri.to_string());
        }
        (field.to_string(), String::new())
    }

    /// Resolves a relation's prefix. Always a no-op.
    ///
    /// Relation prefixes are registered like any other, but they are never
    /// substituted: the relation keeps its dotted form and the relation URI
    /// stays empty.
    pub fn resolve_relation(&self, relation: &str) -> (String, String) {
        (relation.to_string(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_writes_overwrite() {
        let mut table = PrefixTable::new();
        table.insert("dc", "http://a");
        table.insert("dc", "http://b");
        assert_eq!(table.lookup("dc"), Some("http://b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut table = PrefixTable::new();
        table.insert("DC", "http://a");
        assert_eq!(table.lookup("dc"), None);
    }

    #[test]
    fn resolve_registered_field() {
        let mut table = PrefixTable::new();
        table.insert("dc", "http://purl.org/dc");
        assert_eq!(
            table.resolve_field("dc.title"),
            ("title".to_string(), "http://purl.org/dc".to_string())
        );
    }

    #[test]
    fn resolve_splits_on_first_dot() {
        let mut table = PrefixTable::new();
        table.insert("x", "u");
        assert_eq!(
            table.resolve_field("x.a.b"),
            ("a.b".to_string(), "u".to_string())
        );
    }

    #[test]
    fn unregistered_field_untouched() {
        let table = PrefixTable::new();
        assert_eq!(
            table.resolve_field("bath.title"),
            ("bath.title".to_string(), String::new())
        );
        assert_eq!(
            table.resolve_field("title"),
            ("title".to_string(), String::new())
        );
    }

    #[test]
    fn relation_never_substituted() {
        let mut table = PrefixTable::new();
        table.insert(RELATION_PREFIX, "info:srw/cql-context-set/1/cql-v1.2");
        table.insert("x", "http://x");
        assert_eq!(
            table.resolve_relation("x.near"),
            ("x.near".to_string(), String::new())
        );
        assert_eq!(
            table.resolve_relation("any"),
            ("any".to_string(), String::new())
        );
    }
}
