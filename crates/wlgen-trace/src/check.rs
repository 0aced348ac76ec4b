//! Consistency check over a pair of rewritten traces.
//!
//! Reads the outputs the way the index benchmarks consume them: the load file
//! must be INSERT-only; every transaction line must be a known op. On top of
//! that it verifies referential consistency in the external keyspace: a
//! READ, UPDATE or SCAN may only name a key inserted earlier (by the load
//! file or a previous transaction INSERT).

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

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use wlgen_core::{KeymapError, OpType, Result};

use crate::format::OutputRecord;
use crate::io::read_output_trace;

/// Summary of a successful check.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckReport {
    /// Lines in the load trace.
    pub load_records: usize,
    /// Lines in the transaction trace.
    pub txn_records: usize,
    /// Distinct external keys inserted across both traces.
    pub distinct_keys: usize,
    /// INSERT lines whose key was already present.
    pub duplicate_inserts: usize,
}

/// Check two in-memory traces.
pub fn check_records(load: &[OutputRecord], txn: &[OutputRecord]) -> Result<CheckReport> {
    let mut keys: HashSet<&str> = HashSet::with_capacity(load.len());
    let mut report = CheckReport {
        load_records: load.len(),
        txn_records: txn.len(),
        ..CheckReport::default()
    };

    for (i, rec) in load.iter().enumerate() {
        if rec.op != OpType::Insert {
            return Err(KeymapError::Inconsistent {
                trace: "load",
                line: i + 1,
                detail: format!("expected INSERT, found {}", rec.op),
            });
        }
        if !keys.insert(rec.key.as_str()) {
            report.duplicate_inserts += 1;
        }
    }

    for (i, rec) in txn.iter().enumerate() {
        match rec.op {
            OpType::Insert => {
                if !keys.insert(rec.key.as_str()) {
                    report.duplicate_inserts += 1;
                }
            }
            op if !keys.contains(rec.key.as_str()) => {
                return Err(KeymapError::Inconsistent {
                    trace: "txn",
                    line: i + 1,
                    detail: format!("{op} of key {:?} that was never inserted", rec.key),
                });
            }
            _ => {}
        }
    }

    report.distinct_keys = keys.len();
    Ok(report)
}

/// Check two trace files on disk.
pub fn check_files(load: &Path, txn: &Path) -> Result<CheckReport> {
    let load_recs = read_output_trace(load)?;
    let txn_recs = read_output_trace(txn)?;
    let report = check_records(&load_recs, &txn_recs)?;
    info!(
        load = report.load_records,
        txn = report.txn_records,
        keys = report.distinct_keys,
        "traces consistent"
    );
    Ok(report)
}
