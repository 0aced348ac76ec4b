//! Generator profile: where the YCSB launcher, workload specs and outputs live.
//!
//! Loaded from an optional TOML file; every field has a default matching the
//! usual checkout layout (`YCSB/bin/ycsb`, `workload_spec/`, `workloads/`).
//!
//! ```toml
//! ycsb = "/opt/ycsb/bin/ycsb"
//! binding = "basic"
//! workload_dir = "workload_spec"
//! output_dir = "workloads"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use wlgen_core::KeyType;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// YCSB launcher script.
    pub ycsb: PathBuf,
    /// Database binding passed to `ycsb load|run`.
    pub binding: String,
    /// Directory holding the workload property files.
    pub workload_dir: PathBuf,
    /// Directory receiving raw captures and rewritten traces.
    pub output_dir: PathBuf,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            ycsb: PathBuf::from("YCSB/bin/ycsb"),
            binding: "basic".to_owned(),
            workload_dir: PathBuf::from("workload_spec"),
            output_dir: PathBuf::from("workloads"),
        }
    }
}

impl Profile {
    /// Read a profile, or fall back to defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let src = fs::read_to_string(path)
            .with_context(|| format!("read profile {}", path.display()))?;
        toml::from_str(&src).with_context(|| format!("parse profile {}", path.display()))
    }

    /// Raw producer capture for the load phase.
    pub fn raw_load(&self, key_type: KeyType, workload: &str) -> PathBuf {
        self.output_dir.join(format!("ycsb_load_{key_type}_{workload}"))
    }

    /// Raw producer capture for the transaction phase.
    pub fn raw_txn(&self, key_type: KeyType, workload: &str) -> PathBuf {
        self.output_dir.join(format!("ycsb_txn_{key_type}_{workload}"))
    }

    /// Rewritten load trace.
    pub fn out_load(&self, key_type: KeyType, workload: &str) -> PathBuf {
        self.output_dir.join(format!("load_{key_type}_{workload}"))
    }

    /// Rewritten transaction trace.
    pub fn out_txn(&self, key_type: KeyType, workload: &str) -> PathBuf {
        self.output_dir.join(format!("txn_{key_type}_{workload}"))
    }
}
