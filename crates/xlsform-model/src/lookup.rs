//! Case-insensitive header lookup.

use std::collections::HashMap;

/// A set that performs case-insensitive lookups but preserves original names.
///
/// Keys are normalized with [`normalize_header`]; the first occurrence of a
/// name wins, so duplicate headers resolve to the leftmost column.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveSet {
    /// Maps normalized name -> (original name, 0-based position)
    inner: HashMap<String, (String, usize)>,
}

impl CaseInsensitiveSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Create a set from an ordered iterator of header names.
    pub fn from_headers<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (idx, name) in iter.into_iter().enumerate() {
            set.insert_at(name, idx);
        }
        set
    }

    /// Insert a name at a position. Blank names and repeated names are ignored.
    pub fn insert_at(&mut self, value: impl AsRef<str>, position: usize) {
        let s = value.as_ref();
        let key = normalize_header(s);
        if key.is_empty() {
            return;
        }
        self.inner
            .entry(key)
            .or_insert_with(|| (s.trim().to_string(), position));
    }

    /// Check if the set contains a value (case-insensitive).
    pub fn contains(&self, value: impl AsRef<str>) -> bool {
        self.inner.contains_key(&normalize_header(value.as_ref()))
    }

    /// Get the original header name (case-insensitive lookup).
    pub fn get(&self, value: impl AsRef<str>) -> Option<&str> {
        self.inner
            .get(&normalize_header(value.as_ref()))
            .map(|(name, _)| name.as_str())
    }

    /// Get the 0-based position of a header (case-insensitive lookup).
    pub fn position(&self, value: impl AsRef<str>) -> Option<usize> {
        self.inner
            .get(&normalize_header(value.as_ref()))
            .map(|(_, idx)| *idx)
    }

    /// Number of elements in the set.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if set is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Normalizes a header for matching.
///
/// Trims, lower-cases, folds runs of inner whitespace to `_` and strips an
/// XLSForm `::language` suffix (`label::English (en)` becomes `label`).
pub fn normalize_header(value: &str) -> String {
    let base = match value.split_once("::") {
        Some((head, _)) => head,
        None => value,
    };
    base.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}
