//! wlgen-core: key mapping, corpus sampling and reverse-domain encoding.
//!
//! This crate holds the part of the workload generator with real invariants:
//! - canonical data types (`OpType`, `RawOperationRecord`, `KeyType`, …),
//! - the reverse-domain encoder that turns `alice@mail.example.com` into
//!   `com.example.mail.@alice` so keys sharing a domain suffix sort together,
//! - the email corpus sampler (fixed stride over a corpus),
//! - the run-scoped key mapping table (synthetic key → external key), and
//! - the key sources that mint fresh external keys (identity / email).
//!
//! ```
//! use wlgen_core::{encode::reverse_host_name, KeyMappingTable, OpType};
//!
//! let ext = reverse_host_name("alice@mail.example.com\n")?;
//! assert_eq!(ext, "com.example.mail.@alice");
//!
//! let mut table = KeyMappingTable::new();
//! table.assign(7, ext);
//! assert_eq!(table.resolve(7, 1, OpType::Read)?, "com.example.mail.@alice");
//! # Ok::<(), wlgen_core::KeymapError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Reverse-domain encoding of raw corpus lines (and its inverse).
pub mod encode;
/// Error type shared by every wlgen crate.
pub mod error;
/// Run-scoped synthetic → external key table.
pub mod keymap;
/// Fixed-stride sampler over an email corpus.
pub mod sampler;
/// Key sources that mint fresh external keys.
pub mod source;
/// Canonical data types.
pub mod types;

pub use error::{KeymapError, Result};
pub use keymap::{Assignment, KeyMappingTable};
pub use sampler::EmailCorpusSampler;
pub use source::{EmailKeys, IdentityKeys, KeySource};
pub use types::*;
