//! Session capability snapshot.
//!
//! # Purpose
//! Holds the normalized capability keys granted to one session so the feature
//! gate can answer the common case without calling the authority.
//!
//! # Key invariants
//! - Keys are trimmed; empty and whitespace-only values never enter the set.
//! - Duplicates collapse to the first occurrence, preserving insertion order.
//! - Lookups are exact string matches; there is no wildcard or prefix logic.
//!
//! # Security considerations
//! Malformed session payloads degrade to an empty set rather than an error.
//! An empty set only shortens the fast path; the gate still consults the
//! authority, which fails closed.
use serde_json::Value;
use std::collections::HashSet;

/// Immutable, ordered set of capability keys.
///
/// # Example
/// ```rust
/// use wayfinder_nav::CapabilitySet;
///
/// let caps = CapabilitySet::build([" menu.mark2.admin ", "", "menu.mark2.admin"]);
/// assert!(caps.has("menu.mark2.admin"));
/// assert_eq!(caps.all(), ["menu.mark2.admin"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl CapabilitySet {
    /// Set with no capabilities, used for anonymous requests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from raw values.
    ///
    /// Values are trimmed, blanks are dropped and duplicates keep their first
    /// position.
    pub fn build<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for value in raw {
            set.insert(value.as_ref());
        }
        set
    }

    /// Build a set from an untyped session payload.
    ///
    /// Non-string entries are ignored.
    pub fn from_json_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        Self::build(values.into_iter().filter_map(Value::as_str))
    }

    fn insert(&mut self, raw: &str) {
        let key = raw.trim();
        if key.is_empty() || self.lookup.contains(key) {
            return;
        }
        self.lookup.insert(key.to_string());
        self.ordered.push(key.to_string());
    }

    pub fn has(&self, key: &str) -> bool {
        self.lookup.contains(key)
    }

    /// All keys in first-seen order.
    pub fn all(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
