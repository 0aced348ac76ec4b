//! Run-scoped table from synthetic keys to external keys.
//!
//! Each synthetic key moves `Unassigned → Assigned(external)` at most once.
//! `Assigned` is terminal: [`KeyMappingTable::assign`] never overwrites.
//! Iteration follows first-assignment order.

use std::collections::HashMap;

use crate::error::{KeymapError, Result};
use crate::types::{OpType, SyntheticKey};

/// Outcome of [`KeyMappingTable::assign`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assignment<'a> {
    /// The key was unassigned and now maps to the offered external key.
    Fresh,
    /// The key already had a mapping; it is left untouched.
    Existing(&'a str),
}

/// Caller-owned bijection built up over one generation run.
#[derive(Clone, Debug, Default)]
pub struct KeyMappingTable {
    index: HashMap<SyntheticKey, usize>,
    entries: Vec<(SyntheticKey, String)>,
}

impl KeyMappingTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with room for `n` keys.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self { index: HashMap::with_capacity(n), entries: Vec::with_capacity(n) }
    }

    /// Number of assigned keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been assigned yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is assigned.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: SyntheticKey) -> bool {
        self.index.contains_key(&key)
    }

    /// External key for `key`, if assigned.
    #[must_use]
    pub fn get(&self, key: SyntheticKey) -> Option<&str> {
        self.index.get(&key).map(|&i| self.entries[i].1.as_str())
    }

    /// Assign `external` to `key` unless it is already assigned.
    pub fn assign(&mut self, key: SyntheticKey, external: String) -> Assignment<'_> {
        if let Some(&i) = self.index.get(&key) {
            return Assignment::Existing(self.entries[i].1.as_str());
        }
        self.index.insert(key, self.entries.len());
        self.entries.push((key, external));
        Assignment::Fresh
    }

    /// External key for a key referenced by `op` on input line `line`.
    ///
    /// A miss is a consistency violation ([`KeymapError::UnknownKey`]): the
    /// producer must introduce every key with an INSERT before referencing it.
    pub fn resolve(&self, key: SyntheticKey, line: usize, op: OpType) -> Result<&str> {
        self.get(key).ok_or(KeymapError::UnknownKey { line, op, key })
    }

    /// `(synthetic, external)` pairs in first-assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (SyntheticKey, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}
