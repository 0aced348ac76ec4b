//! Output trace record: `OP key` or `SCAN key count`.
//!
//! This is what the index benchmarks read back (`infile >> op >> key`, plus
//! `>> range` for SCAN), so keys never contain whitespace and a SCAN always
//! carries its count.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use serde::{Deserialize, Serialize};
use std::fmt;

use wlgen_core::{KeymapError, OpType, Result};

/// One line of a rewritten trace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputRecord {
    /// Operation kind (unchanged from the input).
    pub op: OpType,
    /// External key.
    pub key: String,
    /// Scan length, passed through untranslated.
    pub range: Option<u32>,
}

impl OutputRecord {
    /// Record with no range (INSERT / READ / UPDATE).
    #[inline]
    #[must_use]
    pub const fn point(op: OpType, key: String) -> Self {
        Self { op, key, range: None }
    }

    /// SCAN record.
    #[inline]
    #[must_use]
    pub const fn scan(key: String, range: u32) -> Self {
        Self { op: OpType::Scan, key, range: Some(range) }
    }

    /// Parse one output line (`line` is used for error context only).
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let malformed = || KeymapError::MalformedOutput { line, text: text.trim_end().to_owned() };
        let mut fields = text.split_whitespace();
        let op = fields.next().and_then(OpType::from_token).ok_or_else(malformed)?;
        let key = fields.next().ok_or_else(malformed)?.to_owned();
        let range = match (op, fields.next()) {
            (OpType::Scan, Some(n)) => Some(n.parse::<u32>().map_err(|_| malformed())?),
            (OpType::Scan, None) => return Err(malformed()),
            (_, None) => None,
            (_, Some(_)) => return Err(malformed()),
        };
        if fields.next().is_some() {
            return Err(malformed());
        }
        Ok(Self { op, key, range })
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(n) => write!(f, "{} {} {}", self.op, self.key, n),
            None => write!(f, "{} {}", self.op, self.key),
        }
    }
}
