//! Run the YCSB launcher and capture its stdout as a raw trace.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::Profile;

/// `ycsb load` or `ycsb run`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum YcsbPhase {
    Load,
    Run,
}

impl YcsbPhase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Run => "run",
        }
    }
}

/// Equivalent of `ycsb <phase> <binding> -P <workload_dir>/<workload> -s > out`.
pub fn run_ycsb(profile: &Profile, phase: YcsbPhase, workload: &str, out: &Path) -> Result<()> {
    let props = profile.workload_dir.join(workload);
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    let capture = File::create(out).with_context(|| format!("create {}", out.display()))?;

    info!(
        ycsb = %profile.ycsb.display(),
        phase = phase.as_str(),
        props = %props.display(),
        out = %out.display(),
        "running trace producer"
    );
    let status = Command::new(&profile.ycsb)
        .arg(phase.as_str())
        .arg(&profile.binding)
        .arg("-P")
        .arg(&props)
        .arg("-s")
        .stdout(Stdio::from(capture))
        .status()
        .with_context(|| format!("spawn {}", profile.ycsb.display()))?;

    if !status.success() {
        bail!("ycsb {} exited with {status}", phase.as_str());
    }
    Ok(())
}
