// crates/wlgen-trace/src/parse.rs

//! Raw trace parser.
//!
//! The producer writes one operation per line, e.g.
//!
//! ```text
//! INSERT usertable user6284781860667377211 [ field0=… ]
//! SCAN usertable user1183 42 [ <all fields>]
//! [OVERALL], RunTime(ms), 1234
//! ```
//!
//! Only lines whose first field is exactly `INSERT`, `READ`, `UPDATE` or
//! `SCAN` are kept; everything else is dropped without error. The third field
//! carries the synthetic key behind the constant tag [`KEY_PREFIX`]; a SCAN's
//! fourth field is its range length.

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

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use wlgen_core::{KeymapError, OpType, RawOperationRecord, Result};

/// Constant tag the producer puts in front of every numeric key.
pub const KEY_PREFIX: &str = "user";

/// Field index (0-based) of the tagged key.
const KEY_FIELD: usize = 2;

/// A parsed record together with its 1-based source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    /// 1-based line number in the raw file.
    pub line: usize,
    /// Parsed operation.
    pub record: RawOperationRecord,
}

/// Parse one raw line. `Ok(None)` means the line is not an operation.
pub fn parse_line(text: &str, line: usize) -> Result<Option<RawOperationRecord>> {
    let mut fields = text.split_whitespace();
    let Some(op) = fields.next().and_then(OpType::from_token) else {
        return Ok(None);
    };

    let key_field = fields
        .nth(KEY_FIELD - 1)
        .ok_or(KeymapError::MissingField { line, op, what: "key" })?;
    let key = key_field
        .strip_prefix(KEY_PREFIX)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| KeymapError::MalformedKey { line, op, field: key_field.to_owned() })?;

    let range = if op == OpType::Scan {
        let f = fields
            .next()
            .ok_or(KeymapError::MissingField { line, op, what: "range length" })?;
        match f.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => return Err(KeymapError::MalformedRange { line, field: f.to_owned() }),
        }
    } else {
        None
    };

    Ok(Some(RawOperationRecord { op, key, range }))
}

/// Re-openable handle on a raw trace file.
///
/// Each [`TraceParser::open`] starts a fresh pass from the first line, so the
/// same file can be walked once to size the sampler and again to rewrite it.
#[derive(Clone, Debug)]
pub struct TraceParser {
    path: PathBuf,
}

impl TraceParser {
    /// Parser over the file at `path` (not opened yet).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this parser reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a pass over the file.
    pub fn open(&self) -> Result<TraceRecords<BufReader<File>>> {
        let f = File::open(&self.path).map_err(|e| KeymapError::io(&self.path, e))?;
        Ok(TraceRecords::new(BufReader::new(f), Some(self.path.clone())))
    }
}

/// Lazy iterator over the operations of a raw trace.
///
/// Owns its reader, so it can be returned from [`TraceParser::open`] without
/// borrowing anything. When opened from a file, parse errors are wrapped in
/// [`KeymapError::Trace`] naming that file.
pub struct TraceRecords<R> {
    rdr: R,
    buf: String,
    line_no: usize,
    path: Option<PathBuf>,
    done: bool,
}

impl<R: BufRead> TraceRecords<R> {
    fn new(rdr: R, path: Option<PathBuf>) -> Self {
        Self { rdr, buf: String::with_capacity(256), line_no: 0, path, done: false }
    }

    fn in_trace(&self, e: KeymapError) -> KeymapError {
        match &self.path {
            Some(path) => KeymapError::Trace { path: path.clone(), source: Box::new(e) },
            None => e,
        }
    }
}

/// Iterate the operations in any buffered reader.
pub fn records_from_reader<R: BufRead>(rdr: R) -> TraceRecords<R> {
    TraceRecords::new(rdr, None)
}

impl<R: BufRead> Iterator for TraceRecords<R> {
    type Item = Result<TraceEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.rdr.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    match parse_line(&self.buf, self.line_no) {
                        Ok(Some(record)) => {
                            return Some(Ok(TraceEntry { line: self.line_no, record }));
                        }
                        Ok(None) => {}
                        Err(e) => {
                            self.done = true;
                            return Some(Err(self.in_trace(e)));
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    let path = self.path.as_deref().unwrap_or_else(|| Path::new("<reader>"));
                    return Some(Err(KeymapError::io(path, e)));
                }
            }
        }
        None
    }
}
