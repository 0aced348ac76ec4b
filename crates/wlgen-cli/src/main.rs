// crates/wlgen-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

mod config;
mod ycsb;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wlgen_trace::{
    check::check_files,
    io::write_report_json,
    rewrite::{rewrite_files, KeySpec, RewriteJob, RewriteStats},
};

use crate::config::Profile;
use crate::ycsb::{run_ycsb, YcsbPhase};

#[derive(Parser, Debug)]
#[command(
    name = "wlgen",
    about = "YCSB workload generator with realistic keys",
    long_about = "YCSB workload generator with realistic keys.\n\nRewrites the synthetic keys of a YCSB load/transaction trace pair into plain integers or reverse-domain encoded email addresses, keeping operation order and cross-trace references intact.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run YCSB for a workload, then rewrite its traces into the chosen keyspace
    Generate {
        /// YCSB workload to run
        #[arg(value_enum)]
        workload: WorkloadOpt,

        /// Output keyspace
        #[arg(value_enum)]
        key_type: KeyTypeOpt,

        /// Email corpus, one address per line (email keys only)
        #[arg(long)]
        emails: Option<PathBuf>,

        /// Number of email records to use from the corpus (email keys only)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        email_count: Option<u64>,

        /// TOML profile with YCSB and directory locations
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Override the profile's output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Keep the raw YCSB captures next to the rewritten traces
        #[arg(long, default_value_t = false)]
        keep_raw: bool,

        /// Write run statistics as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Rewrite an existing pair of raw YCSB traces
    Rewrite {
        /// Raw load trace (`ycsb load ... -s` stdout)
        #[arg(long)]
        load: PathBuf,

        /// Raw transaction trace (`ycsb run ... -s` stdout)
        #[arg(long)]
        txn: PathBuf,

        /// Output keyspace
        #[arg(value_enum, long, default_value_t = KeyTypeOpt::Randint)]
        key_type: KeyTypeOpt,

        /// Email corpus, one address per line (email keys only)
        #[arg(long)]
        emails: Option<PathBuf>,

        /// Number of email records to use from the corpus
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        email_count: Option<u64>,

        /// Output path for the rewritten load trace
        #[arg(long)]
        out_load: PathBuf,

        /// Output path for the rewritten transaction trace
        #[arg(long)]
        out_txn: PathBuf,

        /// Write run statistics as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check that a rewritten load/transaction pair is consistent
    Check {
        /// Rewritten load trace
        #[arg(long)]
        load: PathBuf,

        /// Rewritten transaction trace
        #[arg(long)]
        txn: PathBuf,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum WorkloadOpt {
    /// Read-only point lookups
    Workloadc,
    /// Short range scans with inserts
    Workloade,
}

impl WorkloadOpt {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Workloadc => "workloadc",
            Self::Workloade => "workloade",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum KeyTypeOpt {
    /// Keep YCSB's integer keys
    Randint,
    /// Reverse-domain encoded email addresses
    Email,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate {
            workload,
            key_type,
            emails,
            email_count,
            profile,
            output_dir,
            keep_raw,
            report,
        } => {
            let keys = key_spec(key_type, emails, email_count, true)?;
            let mut profile = Profile::load(profile.as_deref())?;
            if let Some(dir) = output_dir {
                profile.output_dir = dir;
            }
            generate(&profile, workload, keys, keep_raw, report.as_deref())
        }

        Cmd::Rewrite {
            load,
            txn,
            key_type,
            emails,
            email_count,
            out_load,
            out_txn,
            report,
        } => {
            let keys = key_spec(key_type, emails, email_count, false)?;
            let job = RewriteJob { load, txn, out_load, out_txn, keys };
            rewrite(&job, report.as_deref())
        }

        Cmd::Check { load, txn } => check(&load, &txn),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Validate the keyspace flags and turn them into a [`KeySpec`].
///
/// `generate` insists on an explicit record count in email mode; `rewrite`
/// falls back to the whole corpus.
fn key_spec(
    key_type: KeyTypeOpt,
    emails: Option<PathBuf>,
    email_count: Option<u64>,
    require_count: bool,
) -> Result<KeySpec> {
    match (key_type, emails) {
        (KeyTypeOpt::Randint, None) => {
            if email_count.is_some() {
                bail!("--email-count only applies to email keys");
            }
            Ok(KeySpec::RandInt)
        }
        (KeyTypeOpt::Randint, Some(_)) => bail!("--emails only applies to email keys"),
        (KeyTypeOpt::Email, None) => {
            bail!("email keys need --emails <corpus> and the total number of email records")
        }
        (KeyTypeOpt::Email, Some(corpus)) => {
            if require_count && email_count.is_none() {
                bail!("email keys need --email-count <N> (total number of email records)");
            }
            let records = email_count
                .map(usize::try_from)
                .transpose()
                .context("--email-count does not fit in memory on this platform")?;
            Ok(KeySpec::Email { corpus, records })
        }
    }
}

fn generate(
    profile: &Profile,
    workload: WorkloadOpt,
    keys: KeySpec,
    keep_raw: bool,
    report: Option<&Path>,
) -> Result<()> {
    let key_type = keys.key_type();
    let wl = workload.as_str();
    info!(workload = wl, %key_type, "generating workload");

    let raw_load = profile.raw_load(key_type, wl);
    let raw_txn = profile.raw_txn(key_type, wl);
    run_ycsb(profile, YcsbPhase::Load, wl, &raw_load).context("ycsb load phase")?;
    run_ycsb(profile, YcsbPhase::Run, wl, &raw_txn).context("ycsb run phase")?;

    let job = RewriteJob {
        load: raw_load,
        txn: raw_txn,
        out_load: profile.out_load(key_type, wl),
        out_txn: profile.out_txn(key_type, wl),
        keys,
    };
    let result = rewrite(&job, report);

    if keep_raw {
        info!(load = %job.load.display(), txn = %job.txn.display(), "keeping raw captures");
    } else {
        for p in [&job.load, &job.txn] {
            if let Err(e) = fs::remove_file(p) {
                warn!(path = %p.display(), error = %e, "could not remove raw capture");
            }
        }
    }
    result
}

fn rewrite(job: &RewriteJob, report: Option<&Path>) -> Result<()> {
    info!(
        load = %job.load.display(),
        txn = %job.txn.display(),
        key_type = %job.keys.key_type(),
        "rewriting traces"
    );
    let stats = rewrite_files(job).with_context(|| {
        format!("rewriting {} and {}", job.load.display(), job.txn.display())
    })?;

    if let Some(path) = report {
        write_report_json(path, &stats)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    print_summary(job, &stats);
    Ok(())
}

fn print_summary(job: &RewriteJob, stats: &RewriteStats) {
    println!(
        "Rewrote {} load + {} txn records ({} keys, {}) → {}, {}",
        stats.load_inserts,
        stats.txn_records,
        stats.distinct_keys,
        stats.key_type,
        job.out_load.display(),
        job.out_txn.display()
    );
    if let Some(stride) = stats.stride {
        println!("  corpus stride: {stride}");
    }
    if stats.reinserted > 0 {
        println!("  re-inserted keys: {}", stats.reinserted);
    }
}

fn check(load: &Path, txn: &Path) -> Result<()> {
    info!(load = %load.display(), txn = %txn.display(), "checking traces");
    let report = check_files(load, txn).with_context(|| {
        format!("checking {} against {}", txn.display(), load.display())
    })?;
    println!(
        "OK: {} load + {} txn records, {} distinct keys ({} duplicate inserts)",
        report.load_records, report.txn_records, report.distinct_keys, report.duplicate_inserts
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn key_spec_validation() {
        assert_eq!(key_spec(KeyTypeOpt::Randint, None, None, true).unwrap(), KeySpec::RandInt);
        assert!(key_spec(KeyTypeOpt::Randint, Some("e.txt".into()), None, false).is_err());
        assert!(key_spec(KeyTypeOpt::Email, None, Some(5), false).is_err());
        assert!(key_spec(KeyTypeOpt::Email, Some("e.txt".into()), None, true).is_err());
        assert_eq!(
            key_spec(KeyTypeOpt::Email, Some("e.txt".into()), None, false).unwrap(),
            KeySpec::Email { corpus: "e.txt".into(), records: None }
        );
        assert_eq!(
            key_spec(KeyTypeOpt::Email, Some("e.txt".into()), Some(27), true).unwrap(),
            KeySpec::Email { corpus: "e.txt".into(), records: Some(27) }
        );
    }

    #[test]
    fn parses_generate_invocation() {
        let cli = Cli::try_parse_from([
            "wlgen", "generate", "workloade", "email", "--emails", "list.txt", "--email-count",
            "100",
        ])
        .unwrap();
        match cli.cmd {
            Cmd::Generate { workload, key_type, email_count, .. } => {
                assert_eq!(workload, WorkloadOpt::Workloade);
                assert_eq!(key_type, KeyTypeOpt::Email);
                assert_eq!(email_count, Some(100));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["wlgen", "generate", "workloada", "randint"]).is_err());
    }
}
