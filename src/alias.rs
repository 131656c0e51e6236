//! The alias table: user-defined names replaced by stored text before
//! dispatch.
//!
//! The store is append-only and lookup scans in insertion order, so the first
//! stored definition of a name wins over later redefinitions. That matches
//! the historic behavior of this shell and is preserved deliberately rather
//! than silently switched to last-write-wins.

/// A single `(name, expansion)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub expansion: String,
}

/// Append-only registry of aliases, owned by the session.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition. Existing entries for the same name are kept and
    /// continue to shadow this one.
    pub fn define(&mut self, name: impl Into<String>, expansion: impl Into<String>) {
        self.entries.push(AliasEntry {
            name: name.into(),
            expansion: expansion.into(),
        });
    }

    /// First stored expansion for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.expansion.as_str())
    }

    /// All stored entries in insertion order, shadowed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_finds_definition() {
        let mut aliases = AliasTable::new();
        aliases.define("ll", "ls -la");
        assert_eq!(aliases.lookup("ll"), Some("ls -la"));
        assert_eq!(aliases.lookup("missing"), None);
    }

    #[test]
    fn test_first_definition_wins_over_redefinition() {
        let mut aliases = AliasTable::new();
        aliases.define("x", "echo one");
        aliases.define("x", "echo two");
        assert_eq!(aliases.lookup("x"), Some("echo one"));
    }

    #[test]
    fn test_iter_preserves_insertion_order() {
        let mut aliases = AliasTable::new();
        aliases.define("a", "1");
        aliases.define("b", "2");
        let names: Vec<&str> = aliases.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
