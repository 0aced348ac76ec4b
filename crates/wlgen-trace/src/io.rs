//! File helpers: corpus loading, output trace writing/reading, run reports.
//!
//! Output traces are written to a `<name>.partial` sibling and only renamed
//! into place by [`PartialOutput::commit`], so a failed run never leaves a
//! file that looks complete.

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

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use wlgen_core::{KeymapError, OpType, Result};

use crate::format::OutputRecord;

/// Ensure the parent directory for a file exists (no-op if none).
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| KeymapError::io(dir, e))?;
        }
    }
    Ok(())
}

/* ---------------- Corpus ---------------- */

/// Read an email corpus, one raw row (terminator included) per entry.
///
/// Rows are returned as bytes; UTF-8 is only checked when a row is sampled.
/// With `limit = Some(n)` only the first `n` rows are used, and a file with
/// fewer than `n` rows is a [`KeymapError::CorpusSize`] error.
pub fn read_corpus(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<u8>>> {
    let f = File::open(path).map_err(|e| KeymapError::io(path, e))?;
    let mut rdr = BufReader::new(f);
    let mut out = Vec::with_capacity(limit.unwrap_or(0));
    loop {
        if limit.is_some_and(|n| out.len() >= n) {
            break;
        }
        let mut row = Vec::new();
        let read = rdr.read_until(b'\n', &mut row).map_err(|e| KeymapError::io(path, e))?;
        if read == 0 {
            break;
        }
        out.push(row);
    }
    if let Some(n) = limit {
        if out.len() < n {
            return Err(KeymapError::CorpusSize { requested: n, available: out.len() });
        }
    }
    Ok(out)
}

/* ---------------- Output traces ---------------- */

/// Line writer for a rewritten trace.
pub struct TraceWriter<W: Write> {
    w: W,
    path: PathBuf,
    lines: u64,
}

impl<W: Write> TraceWriter<W> {
    /// Wrap any writer; `path` is only used in error messages.
    pub fn new(w: W, path: impl Into<PathBuf>) -> Self {
        Self { w, path: path.into(), lines: 0 }
    }

    /// Append one record.
    pub fn write_record(&mut self, rec: &OutputRecord) -> Result<()> {
        self.write_op(rec.op, &rec.key, rec.range)
    }

    /// Append one record from borrowed parts.
    pub fn write_op(&mut self, op: OpType, key: &str, range: Option<u32>) -> Result<()> {
        let res = match range {
            Some(n) => writeln!(self.w, "{op} {key} {n}"),
            None => writeln!(self.w, "{op} {key}"),
        };
        res.map_err(|e| KeymapError::io(&self.path, e))?;
        self.lines += 1;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.w.flush().map_err(|e| KeymapError::io(&self.path, e))?;
        Ok(self.w)
    }
}

/// An output file being written under a temporary `.partial` name.
pub struct PartialOutput {
    tmp: PathBuf,
    dest: PathBuf,
}

impl PartialOutput {
    /// Create `<dest>.partial`, creating parent directories as needed.
    pub fn create(dest: &Path) -> Result<(Self, TraceWriter<BufWriter<File>>)> {
        ensure_parent_dir(dest)?;
        let tmp = partial_path(dest);
        let f = File::create(&tmp).map_err(|e| KeymapError::io(&tmp, e))?;
        let writer = TraceWriter::new(BufWriter::new(f), tmp.clone());
        Ok((Self { tmp, dest: dest.to_owned() }, writer))
    }

    /// Final destination.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the partial file onto its destination. If the rename fails the
    /// partial file is removed.
    pub fn commit(self) -> Result<()> {
        fs::rename(&self.tmp, &self.dest).map_err(|e| {
            let _ = fs::remove_file(&self.tmp);
            KeymapError::io(&self.dest, e)
        })
    }

    /// Remove the partial file; errors are ignored.
    pub fn discard(self) {
        let _ = fs::remove_file(&self.tmp);
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Read a rewritten trace back into memory.
pub fn read_output_trace(path: &Path) -> Result<Vec<OutputRecord>> {
    let f = File::open(path).map_err(|e| KeymapError::io(path, e))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.map_err(|e| KeymapError::io(path, e))?;
        out.push(OutputRecord::parse(&line, i + 1)?);
    }
    Ok(out)
}

/* ---------------- Reports ---------------- */

/// Write any serializable report as pretty JSON.
pub fn write_report_json<T: Serialize>(path: &Path, v: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let f = File::create(path).map_err(|e| KeymapError::io(path, e))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, v)
        .map_err(|e| KeymapError::io(path, std::io::Error::other(e)))?;
    w.write_all(b"\n").map_err(|e| KeymapError::io(path, e))?;
    w.flush().map_err(|e| KeymapError::io(path, e))
}
