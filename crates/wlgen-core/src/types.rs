//! Canonical types shared across the wlgen workspace.
//!
//! These are re-exported at the crate root so callers can write
//! `wlgen_core::OpType`, `wlgen_core::RawOperationRecord`, etc.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Small sequential integer key assigned by the trace producer.
pub type SyntheticKey = u64;

/// Operation kinds understood by the rewriter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpType {
    /// Introduce a new key.
    Insert,
    /// Point lookup.
    Read,
    /// Overwrite an existing key.
    Update,
    /// Range scan starting at a key.
    Scan,
}

impl OpType {
    /// All variants, in wire-token order.
    pub const ALL: [Self; 4] = [Self::Insert, Self::Read, Self::Update, Self::Scan];

    /// Wire token (`INSERT`, `READ`, `UPDATE`, `SCAN`).
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Scan => "SCAN",
        }
    }

    /// Case-sensitive exact match on a wire token.
    #[must_use]
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok {
            "INSERT" => Some(Self::Insert),
            "READ" => Some(Self::Read),
            "UPDATE" => Some(Self::Update),
            "SCAN" => Some(Self::Scan),
            _ => None,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed line of a raw trace.
///
/// `range` is `Some(n)` (with `n >= 1`) exactly when `op == OpType::Scan`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawOperationRecord {
    /// Operation kind.
    pub op: OpType,
    /// Synthetic key with the producer's tag stripped.
    pub key: SyntheticKey,
    /// Scan length (SCAN only).
    pub range: Option<u32>,
}

impl RawOperationRecord {
    /// An `INSERT` record.
    #[inline]
    #[must_use]
    pub const fn insert(key: SyntheticKey) -> Self {
        Self { op: OpType::Insert, key, range: None }
    }

    /// A `READ` record.
    #[inline]
    #[must_use]
    pub const fn read(key: SyntheticKey) -> Self {
        Self { op: OpType::Read, key, range: None }
    }

    /// An `UPDATE` record.
    #[inline]
    #[must_use]
    pub const fn update(key: SyntheticKey) -> Self {
        Self { op: OpType::Update, key, range: None }
    }

    /// A `SCAN` record of `range` keys starting at `key`.
    #[inline]
    #[must_use]
    pub const fn scan(key: SyntheticKey, range: u32) -> Self {
        Self { op: OpType::Scan, key, range: Some(range) }
    }
}

/// Keyspace the output traces are expressed in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// External key = synthetic key.
    RandInt,
    /// Reverse-domain encoded email addresses sampled from a corpus.
    Email,
}

impl KeyType {
    /// Name used in file names and on the command line.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RandInt => "randint",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two passes is running.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Population pass over the load trace.
    Load,
    /// Mixed pass over the transaction trace.
    Txn,
}

impl Phase {
    /// Offset added to `cursor * stride` when sampling the corpus.
    ///
    /// Transaction inserts read the row right after the one consumed by the
    /// load key at the same cursor position.
    #[inline]
    #[must_use]
    pub const fn corpus_offset(self) -> usize {
        match self {
            Self::Load => 0,
            Self::Txn => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Txn => "txn",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_tokens_are_case_sensitive() {
        for op in OpType::ALL {
            assert_eq!(OpType::from_token(op.as_str()), Some(op));
        }
        assert_eq!(OpType::from_token("insert"), None);
        assert_eq!(OpType::from_token("DELETE"), None);
        assert_eq!(OpType::from_token(""), None);
    }

    #[test]
    fn phase_offsets() {
        assert_eq!(Phase::Load.corpus_offset(), 0);
        assert_eq!(Phase::Txn.corpus_offset(), 1);
    }
}
