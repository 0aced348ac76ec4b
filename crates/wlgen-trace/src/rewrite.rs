//! Two-pass rewrite of a load trace and a transaction trace into an external
//! keyspace.
//!
//! The load pass mints a key for every INSERT. The transaction pass mints a
//! key for every INSERT and resolves every READ / UPDATE / SCAN against the
//! keys minted so far. A SCAN's range length is copied through unchanged.
//! Both passes share one caller-owned [`KeyMappingTable`], so a synthetic key
//! maps to the same external key wherever it appears.
//!
//! A re-INSERT of a key that is already mapped still mints, and emits, a new
//! external key (the index under test gets one more distinct key), but the
//! table keeps the first mapping.

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

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wlgen_core::{
    Assignment, EmailCorpusSampler, EmailKeys, IdentityKeys, KeyMappingTable, KeySource, KeyType,
    KeymapError, OpType, Phase, Result,
};

use crate::io::{read_corpus, PartialOutput, TraceWriter};
use crate::parse::{TraceEntry, TraceParser};

/// Counters collected over one run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewriteStats {
    /// Keyspace of the output traces.
    pub key_type: KeyType,
    /// INSERTs written to the load output.
    pub load_inserts: u64,
    /// Non-INSERT records found (and dropped) in the load trace.
    pub load_skipped: u64,
    /// Records written to the transaction output.
    pub txn_records: u64,
    /// Transaction-phase INSERTs.
    pub inserts: u64,
    /// Transaction-phase READs.
    pub reads: u64,
    /// Transaction-phase UPDATEs.
    pub updates: u64,
    /// Transaction-phase SCANs.
    pub scans: u64,
    /// INSERTs of a key that was already mapped.
    pub reinserted: u64,
    /// Keys in the mapping table at the end of the run.
    pub distinct_keys: usize,
    /// Corpus stride (email mode only).
    pub stride: Option<usize>,
}

impl RewriteStats {
    fn new(key_type: KeyType) -> Self {
        Self {
            key_type,
            load_inserts: 0,
            load_skipped: 0,
            txn_records: 0,
            inserts: 0,
            reads: 0,
            updates: 0,
            scans: 0,
            reinserted: 0,
            distinct_keys: 0,
            stride: None,
        }
    }
}

/// Drives both passes for one run.
pub struct Rewriter<'t, S> {
    table: &'t mut KeyMappingTable,
    source: S,
    stats: RewriteStats,
}

impl<'t, S: KeySource> Rewriter<'t, S> {
    /// Rewriter filling `table` with keys from `source`.
    pub fn new(table: &'t mut KeyMappingTable, source: S) -> Self {
        let stats = RewriteStats::new(source.key_type());
        Self { table, source, stats }
    }

    /// Stop and return the counters.
    #[must_use]
    pub fn finish(mut self) -> RewriteStats {
        self.stats.distinct_keys = self.table.len();
        self.stats
    }

    /// Load pass. Only INSERT records are meaningful; others are dropped.
    pub fn rewrite_load<I, W>(&mut self, records: I, out: &mut TraceWriter<W>) -> Result<()>
    where
        I: IntoIterator<Item = Result<TraceEntry>>,
        W: Write,
    {
        self.source.begin_phase(Phase::Load);
        for entry in records {
            let entry = entry?;
            if entry.record.op != OpType::Insert {
                debug!(line = entry.line, op = %entry.record.op, "dropping non-INSERT load record");
                self.stats.load_skipped += 1;
                continue;
            }
            self.insert(&entry, Phase::Load, out)?;
            self.stats.load_inserts += 1;
        }
        info!(
            inserts = self.stats.load_inserts,
            skipped = self.stats.load_skipped,
            keys = self.table.len(),
            "load pass done"
        );
        Ok(())
    }

    /// Transaction pass.
    pub fn rewrite_txn<I, W>(&mut self, records: I, out: &mut TraceWriter<W>) -> Result<()>
    where
        I: IntoIterator<Item = Result<TraceEntry>>,
        W: Write,
    {
        self.source.begin_phase(Phase::Txn);
        for entry in records {
            let entry = entry?;
            let rec = entry.record;
            match rec.op {
                OpType::Insert => {
                    self.insert(&entry, Phase::Txn, out)?;
                    self.stats.inserts += 1;
                }
                op => {
                    let ext = self.table.resolve(rec.key, entry.line, op)?;
                    out.write_op(op, ext, rec.range)?;
                    match op {
                        OpType::Read => self.stats.reads += 1,
                        OpType::Update => self.stats.updates += 1,
                        _ => self.stats.scans += 1,
                    }
                }
            }
            self.stats.txn_records += 1;
        }
        info!(
            records = self.stats.txn_records,
            inserts = self.stats.inserts,
            reads = self.stats.reads,
            updates = self.stats.updates,
            scans = self.stats.scans,
            keys = self.table.len(),
            "txn pass done"
        );
        Ok(())
    }

    fn insert<W: Write>(
        &mut self,
        entry: &TraceEntry,
        phase: Phase,
        out: &mut TraceWriter<W>,
    ) -> Result<()> {
        let key = entry.record.key;
        let ext = self.source.mint(key, phase).map_err(|e| KeymapError::Record {
            line: entry.line,
            op: OpType::Insert,
            key,
            source: Box::new(e),
        })?;
        out.write_op(OpType::Insert, &ext, None)?;
        if let Assignment::Existing(prev) = self.table.assign(key, ext) {
            warn!(line = entry.line, key, %phase, kept = prev, "key inserted twice; keeping first mapping");
            self.stats.reinserted += 1;
        }
        Ok(())
    }
}

/// How external keys are produced for a file-level run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySpec {
    /// External key = synthetic key.
    RandInt,
    /// Sample and encode addresses from a corpus file.
    Email {
        /// Corpus, one address per line.
        corpus: PathBuf,
        /// Use only the first `records` lines (`None` = whole file).
        records: Option<usize>,
    },
}

impl KeySpec {
    /// Keyspace produced.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::RandInt => KeyType::RandInt,
            Self::Email { .. } => KeyType::Email,
        }
    }
}

/// Inputs and outputs of one file-level run.
#[derive(Clone, Debug)]
pub struct RewriteJob {
    /// Raw load trace.
    pub load: PathBuf,
    /// Raw transaction trace.
    pub txn: PathBuf,
    /// Rewritten load trace.
    pub out_load: PathBuf,
    /// Rewritten transaction trace.
    pub out_txn: PathBuf,
    /// Keyspace.
    pub keys: KeySpec,
}

/// Rewrite both traces of `job`.
///
/// In email mode the load trace is read twice: once to count its INSERTs
/// (the sampler's sample count), once to rewrite it. Outputs appear at their
/// final paths only if both passes succeed.
pub fn rewrite_files(job: &RewriteJob) -> Result<RewriteStats> {
    let load = TraceParser::new(&job.load);
    let txn = TraceParser::new(&job.txn);

    match &job.keys {
        KeySpec::RandInt => run_passes(&load, &txn, job, IdentityKeys, None),
        KeySpec::Email { corpus, records } => {
            let sample_count = count_inserts(&load)?;
            let lines = read_corpus(corpus, *records)?;
            info!(corpus = %corpus.display(), entries = lines.len(), sample_count, "loaded email corpus");
            let sampler = EmailCorpusSampler::new(lines, sample_count)?;
            let stride = sampler.stride();
            run_passes(&load, &txn, job, EmailKeys::new(sampler), Some(stride))
        }
    }
}

/// Number of INSERT records in a raw trace.
pub fn count_inserts(parser: &TraceParser) -> Result<usize> {
    let mut n = 0usize;
    for entry in parser.open()? {
        if entry?.record.op == OpType::Insert {
            n += 1;
        }
    }
    debug!(path = %parser.path().display(), inserts = n, "counted load inserts");
    Ok(n)
}

fn run_passes<S: KeySource>(
    load: &TraceParser,
    txn: &TraceParser,
    job: &RewriteJob,
    source: S,
    stride: Option<usize>,
) -> Result<RewriteStats> {
    let (load_part, load_out) = PartialOutput::create(&job.out_load)?;
    let (txn_part, txn_out) = match PartialOutput::create(&job.out_txn) {
        Ok(v) => v,
        Err(e) => {
            drop(load_out);
            load_part.discard();
            return Err(e);
        }
    };

    let mut table = KeyMappingTable::new();
    let mut rw = Rewriter::new(&mut table, source);
    if let Err(e) = drive(&mut rw, load, txn, load_out, txn_out) {
        load_part.discard();
        txn_part.discard();
        return Err(e);
    }
    commit_pair(load_part, txn_part)?;

    let mut stats = rw.finish();
    stats.stride = stride;
    Ok(stats)
}

/// Commit both outputs or neither. A txn rename that fails after the load
/// rename succeeded removes the committed load file again.
fn commit_pair(load: PartialOutput, txn: PartialOutput) -> Result<()> {
    let load_dest = load.dest().to_owned();
    if let Err(e) = load.commit() {
        txn.discard();
        return Err(e);
    }
    if let Err(e) = txn.commit() {
        warn!(path = %load_dest.display(), "txn output not committed; removing load output");
        let _ = fs::remove_file(&load_dest);
        return Err(e);
    }
    Ok(())
}

fn drive<S: KeySource, W: Write>(
    rw: &mut Rewriter<'_, S>,
    load: &TraceParser,
    txn: &TraceParser,
    mut load_out: TraceWriter<W>,
    mut txn_out: TraceWriter<W>,
) -> Result<()> {
    rw.rewrite_load(load.open()?, &mut load_out)?;
    rw.rewrite_txn(txn.open()?, &mut txn_out)?;
    load_out.finish()?;
    txn_out.finish()?;
    Ok(())
}
