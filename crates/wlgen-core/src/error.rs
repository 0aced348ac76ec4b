//! Error type for parsing, sampling, mapping and checking traces.
//!
//! Every variant is fatal for a run. Variants raised while handling a trace
//! record carry the line number, and where known the operation and synthetic
//! key, so a failure can be traced back to its input.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{OpType, SyntheticKey};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KeymapError>;

/// Primary error type for wlgen.
#[derive(Error, Debug)]
pub enum KeymapError {
    /// Key field present, but not `<prefix><integer>`.
    #[error("line {line}: malformed {op} key field {field:?}")]
    MalformedKey {
        /// 1-based input line.
        line: usize,
        /// Operation on that line.
        op: OpType,
        /// Raw field text.
        field: String,
    },

    /// A required field is absent.
    #[error("line {line}: {op} record has no {what} field")]
    MissingField {
        /// 1-based input line.
        line: usize,
        /// Operation on that line.
        op: OpType,
        /// Which field (`"key"`, `"range length"`).
        what: &'static str,
    },

    /// SCAN length is not a positive integer.
    #[error("line {line}: malformed SCAN range length {field:?}")]
    MalformedRange {
        /// 1-based input line.
        line: usize,
        /// Raw field text.
        field: String,
    },

    /// Corpus line is not `local@host`.
    #[error("malformed email {raw:?}: {reason}")]
    MalformedEmail {
        /// Corpus line as read (terminator included).
        raw: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A READ/UPDATE/SCAN referenced a key that was never inserted.
    #[error("line {line}: {op} references synthetic key {key}, which was never inserted")]
    UnknownKey {
        /// 1-based input line.
        line: usize,
        /// Operation on that line.
        op: OpType,
        /// The unassigned key.
        key: SyntheticKey,
    },

    /// Sampler index past the end of the corpus.
    #[error(
        "corpus index {index} out of range (corpus has {len} entries; position {position}, stride {stride})"
    )]
    OutOfRange {
        /// Computed index (saturated on overflow).
        index: usize,
        /// Corpus length.
        len: usize,
        /// Cursor position.
        position: usize,
        /// Sampler stride.
        stride: usize,
    },

    /// Sample count is zero or larger than the corpus.
    #[error("cannot sample {requested} keys from a corpus of {available} entries")]
    CorpusSize {
        /// Requested sample count / record count.
        requested: usize,
        /// Entries actually available.
        available: usize,
    },

    /// Output trace line that does not match `OP key [count]`.
    #[error("line {line}: malformed output record {text:?}")]
    MalformedOutput {
        /// 1-based line.
        line: usize,
        /// Offending line.
        text: String,
    },

    /// Output traces violate referential consistency.
    #[error("{trace} trace line {line}: {detail}")]
    Inconsistent {
        /// `"load"` or `"txn"`.
        trace: &'static str,
        /// 1-based line.
        line: usize,
        /// Human-readable description.
        detail: String,
    },

    /// Failure while minting a key for a specific record.
    #[error("line {line}: cannot assign a key for {op} of synthetic key {key}")]
    Record {
        /// 1-based input line.
        line: usize,
        /// Operation on that line.
        op: OpType,
        /// Synthetic key being assigned.
        key: SyntheticKey,
        /// Underlying failure (sampler or encoder).
        #[source]
        source: Box<KeymapError>,
    },

    /// Parse failure inside a named raw trace file.
    #[error("{}: {source}", path.display())]
    Trace {
        /// Raw trace being read.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: Box<KeymapError>,
    },

    /// File I/O error.
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl KeymapError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// The innermost error once `Record` and `Trace` wrappers are removed.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Record { source, .. } | Self::Trace { source, .. } => source.root(),
            other => other,
        }
    }
}
