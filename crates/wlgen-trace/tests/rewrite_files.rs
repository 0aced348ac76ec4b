#![deny(rust_2018_idioms)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use wlgen_core::{
    EmailCorpusSampler, EmailKeys, IdentityKeys, KeyMappingTable, KeySource, KeyType, KeymapError,
};
use wlgen_trace::check::{check_files, check_records};
use wlgen_trace::format::OutputRecord;
use wlgen_trace::io::{read_output_trace, TraceWriter};
use wlgen_trace::parse::records_from_reader;
use wlgen_trace::rewrite::{rewrite_files, KeySpec, RewriteJob, Rewriter};

/// Fresh scratch directory under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("wlgen_trace_{name}_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const RAW_LOAD: &str = "\
Loading workload...
INSERT usertable user100 [ field0=aaaa ]
INSERT usertable user200 [ field0=bbbb ]
INSERT usertable user300 [ field0=cccc ]
[OVERALL], RunTime(ms), 12
[INSERT], Operations, 3
";

const RAW_TXN: &str = "\
Starting test.
READ usertable user200 [ <all fields>]
SCAN usertable user100 7 [ <all fields>]
INSERT usertable user400 [ field0=dddd ]
UPDATE usertable user400 [ field3=eeee ]
SCAN usertable user300 2 [ <all fields>]
[OVERALL], RunTime(ms), 20
";

fn job(dir: &PathBuf, keys: KeySpec) -> RewriteJob {
    fs::write(dir.join("raw_load"), RAW_LOAD).unwrap();
    fs::write(dir.join("raw_txn"), RAW_TXN).unwrap();
    RewriteJob {
        load: dir.join("raw_load"),
        txn: dir.join("raw_txn"),
        out_load: dir.join("out/load"),
        out_txn: dir.join("out/txn"),
        keys,
    }
}

#[test]
fn randint_files_roundtrip_through_check() {
    let dir = scratch("randint");
    let j = job(&dir, KeySpec::RandInt);
    let stats = rewrite_files(&j).unwrap();
    assert_eq!(stats.key_type, KeyType::RandInt);
    assert_eq!(stats.stride, None);

    assert_eq!(
        fs::read_to_string(&j.out_load).unwrap(),
        "INSERT 100\nINSERT 200\nINSERT 300\n"
    );
    assert_eq!(
        fs::read_to_string(&j.out_txn).unwrap(),
        "READ 200\nSCAN 100 7\nINSERT 400\nUPDATE 400\nSCAN 300 2\n"
    );
    let report = check_files(&j.out_load, &j.out_txn).unwrap();
    assert_eq!(report.distinct_keys, 4);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn email_files_use_stride_and_offset() {
    let dir = scratch("email");
    let corpus = dir.join("emails.txt");
    let lines: String = (0..9).map(|i| format!("n{i}@mx{i}.example.org\n")).collect();
    fs::write(&corpus, lines).unwrap();

    let j = job(&dir, KeySpec::Email { corpus, records: Some(6) });
    let stats = rewrite_files(&j).unwrap();
    // 6 corpus rows, 3 load inserts -> stride 2
    assert_eq!(stats.stride, Some(2));
    assert_eq!(stats.load_inserts, 3);
    assert_eq!(stats.inserts, 1);

    let load = read_output_trace(&j.out_load).unwrap();
    let keys: Vec<_> = load.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["org.example.mx0.@n0", "org.example.mx2.@n2", "org.example.mx4.@n4"]
    );

    let txn = read_output_trace(&j.out_txn).unwrap();
    assert_eq!(txn[0], OutputRecord::point(wlgen_core::OpType::Read, keys[1].into()));
    assert_eq!(txn[1], OutputRecord::scan(keys[0].into(), 7));
    assert_eq!(txn[2].key, "org.example.mx1.@n1");
    assert_eq!(txn[3].key, "org.example.mx1.@n1");
    assert_eq!(txn[4], OutputRecord::scan(keys[2].into(), 2));

    check_files(&j.out_load, &j.out_txn).unwrap();
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn failed_run_leaves_no_outputs() {
    let dir = scratch("fail");
    let j = job(&dir, KeySpec::RandInt);
    fs::write(&j.txn, "READ usertable user100\nREAD usertable user999\n").unwrap();

    let err = rewrite_files(&j).unwrap_err();
    assert!(matches!(err, KeymapError::UnknownKey { line: 2, key: 999, .. }));
    assert!(!j.out_load.exists());
    assert!(!j.out_txn.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.join("out")).unwrap().collect();
    assert!(leftovers.is_empty(), "partial files left behind: {leftovers:?}");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn corpus_shorter_than_requested_count() {
    let dir = scratch("short");
    let corpus = dir.join("emails.txt");
    fs::write(&corpus, "a@b.c\n").unwrap();
    let j = job(&dir, KeySpec::Email { corpus, records: Some(10) });
    assert!(matches!(
        rewrite_files(&j),
        Err(KeymapError::CorpusSize { requested: 10, available: 1 })
    ));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn sample_count_above_corpus_is_rejected() {
    let dir = scratch("small");
    let corpus = dir.join("emails.txt");
    fs::write(&corpus, "a@b.c\nd@e.f\n").unwrap();
    let j = job(&dir, KeySpec::Email { corpus, records: None });
    assert!(matches!(
        rewrite_files(&j),
        Err(KeymapError::CorpusSize { requested: 3, available: 2 })
    ));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unsampled_latin1_corpus_row_is_ignored() {
    let dir = scratch("latin1");
    let corpus = dir.join("emails.txt");
    fs::write(&corpus, b"a@x.com\nj\xe9r\xf4me@y.fr\n").unwrap();
    let mut j = job(&dir, KeySpec::Email { corpus, records: None });
    fs::write(&j.load, "INSERT usertable user1 [ f ]\n").unwrap();
    fs::write(&j.txn, "READ usertable user1\n").unwrap();

    let stats = rewrite_files(&j).unwrap();
    assert_eq!(stats.stride, Some(2));
    assert_eq!(fs::read_to_string(&j.out_load).unwrap(), "INSERT com.x.@a\n");
    assert_eq!(fs::read_to_string(&j.out_txn).unwrap(), "READ com.x.@a\n");

    // a transaction INSERT samples row 1, which is not UTF-8
    fs::write(&j.txn, "READ usertable user1\nINSERT usertable user2\n").unwrap();
    j.out_load = dir.join("out2/load");
    j.out_txn = dir.join("out2/txn");
    let err = rewrite_files(&j).unwrap_err();
    assert!(matches!(err, KeymapError::Record { line: 2, key: 2, .. }));
    assert!(matches!(err.root(), KeymapError::MalformedEmail { reason: "not UTF-8", .. }));
    assert!(!j.out_load.exists());
    assert!(!j.out_txn.exists());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn txn_commit_failure_rolls_back_load_output() {
    let dir = scratch("commit");
    let mut j = job(&dir, KeySpec::RandInt);
    j.out_txn = dir.join("out/txn_dir");
    fs::create_dir_all(j.out_txn.join("occupied")).unwrap();

    assert!(matches!(rewrite_files(&j), Err(KeymapError::Io { .. })));
    assert!(!j.out_load.exists());
    assert!(!dir.join("out/load.partial").exists());
    assert!(!dir.join("out/txn_dir.partial").exists());
    assert!(j.out_txn.is_dir());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn parse_errors_name_their_trace() {
    let dir = scratch("which");
    let j = job(&dir, KeySpec::RandInt);
    fs::write(&j.txn, "READ usertable user100\nREAD usertable bob7\n").unwrap();

    let err = rewrite_files(&j).unwrap_err();
    match &err {
        KeymapError::Trace { path, .. } => assert_eq!(path, &j.txn),
        other => panic!("expected a trace-level error, got {other:?}"),
    }
    assert!(matches!(err.root(), KeymapError::MalformedKey { line: 2, .. }));
    assert!(err.to_string().contains("raw_txn"));
    let _ = fs::remove_dir_all(dir);
}

/// Build a producer-shaped trace pair from a list of (op, key) choices that
/// never references a key before inserting it. At most `max_inserts`
/// transaction INSERTs are emitted; further INSERT choices become READs.
fn traces(n_load: u64, ops: &[(u8, u64)], max_inserts: u64) -> (String, String) {
    let mut load = String::new();
    for k in 0..n_load {
        load.push_str(&format!("INSERT usertable user{k} [ f ]\n"));
    }
    let mut next = n_load;
    let mut txn = String::new();
    for &(op, pick) in ops {
        let k = pick % next;
        match op % 4 {
            0 if next - n_load < max_inserts => {
                txn.push_str(&format!("INSERT usertable user{next}\n"));
                next += 1;
            }
            0 | 1 => txn.push_str(&format!("READ usertable user{k}\n")),
            2 => txn.push_str(&format!("UPDATE usertable user{k}\n")),
            _ => txn.push_str(&format!("SCAN usertable user{k} {}\n", pick % 100 + 1)),
        }
    }
    (load, txn)
}

fn rewrite_mem<S: KeySource>(
    source: S,
    load: &str,
    txn: &str,
) -> (Vec<String>, Vec<String>, HashMap<u64, String>) {
    let mut table = KeyMappingTable::new();
    let mut lo = TraceWriter::new(Vec::new(), "load");
    let mut to = TraceWriter::new(Vec::new(), "txn");
    let mut rw = Rewriter::new(&mut table, source);
    rw.rewrite_load(records_from_reader(load.as_bytes()), &mut lo).unwrap();
    rw.rewrite_txn(records_from_reader(txn.as_bytes()), &mut to).unwrap();
    drop(rw);
    let map = table.iter().map(|(k, v)| (k, v.to_owned())).collect();
    let lines = |w: TraceWriter<Vec<u8>>| {
        String::from_utf8(w.finish().unwrap())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>()
    };
    (lines(lo), lines(to), map)
}

proptest! {
    /// Every txn reference to a synthetic key carries the key assigned at
    /// its INSERT; SCAN counts are untouched.
    #[test]
    fn mapping_is_stable_across_passes(
        n_load in 1u64..40,
        ops in prop::collection::vec((any::<u8>(), any::<u64>()), 0..120),
    ) {
        // stride 4 leaves room for one transaction INSERT per load key
        let (load, txn) = traces(n_load, &ops, n_load);
        let corpus: Vec<String> = (0..(4 * n_load as usize))
            .map(|i| format!("u{i}@h{}.d{}.com\n", i % 7, i % 3))
            .collect();
        let src = EmailKeys::new(EmailCorpusSampler::new(corpus, n_load as usize).unwrap());
        let (lo, to, map) = rewrite_mem(src, &load, &txn);

        prop_assert_eq!(lo.len() as u64, n_load);
        for (k, line) in lo.iter().enumerate() {
            prop_assert_eq!(line, &format!("INSERT {}", map[&(k as u64)]));
        }

        let raw: Vec<&str> = txn.lines().collect();
        prop_assert_eq!(raw.len(), to.len());
        for (raw, out) in raw.iter().zip(&to) {
            let f: Vec<&str> = raw.split_whitespace().collect();
            let o: Vec<&str> = out.split_whitespace().collect();
            prop_assert_eq!(f[0], o[0]);
            let key: u64 = f[2].trim_start_matches("user").parse().unwrap();
            prop_assert_eq!(o[1], map[&key].as_str());
            if f[0] == "SCAN" {
                prop_assert_eq!(f[3], o[2]);
            }
        }

        let parse = |v: &[String]| v.iter().enumerate()
            .map(|(i, l)| OutputRecord::parse(l, i + 1).unwrap())
            .collect::<Vec<_>>();
        prop_assert!(check_records(&parse(&lo), &parse(&to)).is_ok());
    }

    /// Identity law end to end.
    #[test]
    fn randint_output_equals_synthetic_keys(
        n_load in 1u64..40,
        ops in prop::collection::vec((any::<u8>(), any::<u64>()), 0..120),
    ) {
        let (load, txn) = traces(n_load, &ops, u64::MAX);
        let (_, to, map) = rewrite_mem(IdentityKeys, &load, &txn);
        for (k, v) in &map {
            prop_assert_eq!(v, &k.to_string());
        }
        for (raw, out) in txn.lines().zip(&to) {
            let key = raw.split_whitespace().nth(2).unwrap().trim_start_matches("user");
            prop_assert_eq!(out.split_whitespace().nth(1).unwrap(), key);
        }
    }
}
