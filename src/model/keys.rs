//! Cache slot identifiers.

use std::fmt;

const FLUSH_ALL: &str = "*";

/// Identifies one cache slot: a routed key and an optional hash field inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
    hfield: Option<String>,
}

impl CacheKey {
    /// Creates a key addressing a whole routed key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hfield: None,
        }
    }

    /// Creates a key addressing a single field inside a routed hash key.
    /// An empty field is treated as no field.
    pub fn with_hfield(key: impl Into<String>, hfield: impl Into<String>) -> Self {
        let hfield = hfield.into();
        Self {
            key: key.into(),
            hfield: if hfield.is_empty() { None } else { Some(hfield) },
        }
    }

    /// Routing component.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sub-field component, if any.
    pub fn hfield(&self) -> Option<&str> {
        self.hfield.as_deref()
    }

    /// Registry key: `key`, or `key:hfield` for field-granular slots.
    ///
    /// The form is not injective: `new("a:b")` and `with_hfield("a", "b")`
    /// share the registry key `a:b`, and only the first one registered is
    /// tracked. Keys that may contain `:` should not be mixed with hash fields
    /// under the same prefix.
    pub fn full_key(&self) -> String {
        match &self.hfield {
            Some(field) => format!("{}:{}", self.key, field),
            None => self.key.clone(),
        }
    }

    /// True when the routing component is empty and the key addresses nothing.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// The literal `*` means "the whole keyspace".
    pub fn is_flush_all(&self) -> bool {
        self.key == FLUSH_ALL
    }

    /// True when the routing component carries a glob wildcard.
    pub fn is_pattern(&self) -> bool {
        self.key.contains('*') || self.key.contains('?')
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_key())
    }
}
