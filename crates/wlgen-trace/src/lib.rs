//! Raw trace parsing and two-pass key rewriting.
//!
//! This crate wires the `wlgen-core` pieces to files:
//!
//! - `parse`: a restartable, lazy parser over raw producer output.
//! - `format`: the rewritten `OP key [count]` line.
//! - `io`: corpus loading, output writers (`.partial` then rename), reports.
//! - `rewrite`: the load pass + transaction pass driver.
//! - `check`: read a rewritten pair back and verify referential consistency.
//!
//! We intentionally avoid broad re-exports so callers use stable paths like
//! `wlgen_trace::rewrite::rewrite_files`.

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
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// Consistency check over rewritten traces.
pub mod check;
/// Rewritten trace line format.
pub mod format;
/// File I/O helpers.
pub mod io;
/// Raw trace parser.
pub mod parse;
/// Two-pass rewriter.
pub mod rewrite;
