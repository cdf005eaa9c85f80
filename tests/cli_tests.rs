//! CLI integration tests using assert_cmd.
//!
//! Every test runs the real `segprime` binary on small inputs and checks its
//! stdout; logs go to stderr and are ignored.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use rug::integer::IsPrime;
use rug::ops::Pow;
use rug::Integer;

#[allow(deprecated)]
fn segprime() -> Command {
    let mut cmd = Command::cargo_bin("segprime").unwrap();
    cmd.env_remove("SEGPRIME_CONFIG").env("RUST_LOG", "warn");
    cmd
}

// --- Help and arg validation ---

#[test]
fn help_shows_all_subcommands() {
    segprime().arg("--help").assert().success().stdout(
        predicate::str::contains("next")
            .and(predicate::str::contains("prev"))
            .and(predicate::str::contains("gaps"))
            .and(predicate::str::contains("primes"))
            .and(predicate::str::contains("twins"))
            .and(predicate::str::contains("cluster"))
            .and(predicate::str::contains("count"))
            .and(predicate::str::contains("pretest")),
    );
}

#[test]
fn cluster_requires_pattern() {
    segprime()
        .args(["cluster", "0", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pattern"));
}

#[test]
fn rejects_malformed_numbers() {
    segprime()
        .args(["next", "12x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid number"));
}

// --- Single numbers ---

#[test]
fn next_and_prev_prime() {
    segprime()
        .args(["next", "10^12"])
        .assert()
        .success()
        .stdout("1000000000039\n");
    segprime()
        .args(["prev", "10^12"])
        .assert()
        .success()
        .stdout("999999999989\n");
    segprime()
        .args(["next", "2^64-59"])
        .assert()
        .success()
        .stdout("18446744073709551629\n");
}

#[test]
fn prev_below_three_fails() {
    segprime()
        .args(["prev", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no prime exists below 2"));
}

#[test]
fn gaps_around_a_number() {
    segprime()
        .args(["gaps", "1000"])
        .assert()
        .success()
        .stdout("3 9\n");
}

#[test]
fn next_json_output() {
    let out = segprime().args(["--json", "next", "100"]).output().unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["next"], "101");
    assert_eq!(doc["gap"], "1");
    assert_eq!(doc["digits"], 3);
}

#[test]
fn pretest_verdicts() {
    segprime()
        .args(["pretest", "2^127-1"])
        .assert()
        .success()
        .stdout("ProbablePrime prime\n");
    segprime()
        .args(["pretest", "1001"])
        .assert()
        .success()
        .stdout("Composite composite\n");
    let out = segprime()
        .args(["--json", "pretest", "1009"])
        .output()
        .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["pretest"], "prime");
    assert_eq!(doc["prime"], true);
}

// --- Ranges ---

#[test]
fn primes_in_small_range() {
    let expected = common::values_text(90, &common::naive_primes(90, 130));
    segprime()
        .args(["primes", "90", "130"])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn primes_json_offsets() {
    let out = segprime()
        .args(["--json", "primes", "10^15", "10^15+100"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let low = Integer::from(10).pow(15u32);
    let expected: Vec<u64> = (0..=100u64)
        .filter(|&i| Integer::from(&low + i).is_probably_prime(30) != IsPrime::No)
        .collect();
    assert_eq!(doc["kind"], "primes");
    assert_eq!(doc["count"], expected.len());
    assert_eq!(doc["offsets"], serde_json::json!(expected));
    assert_eq!(doc["values"][0], "1000000000000037");
}

#[test]
fn twins_and_clusters() {
    segprime()
        .args(["twins", "3", "100"])
        .assert()
        .success()
        .stdout("3\n5\n11\n17\n29\n41\n59\n71\n");
    segprime()
        .args(["cluster", "0", "1000", "--pattern", "0,2,6,8"])
        .assert()
        .success()
        .stdout("5\n11\n101\n191\n821\n");
    segprime()
        .args(["cluster", "0", "100", "--pattern", "2,4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pattern must start at 0"));
}

#[test]
fn range_too_wide_fails() {
    segprime()
        .args(["primes", "0", "2^70"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offsets must fit in 64 bits"));
}

// --- Parallel count ---

#[test]
fn count_is_independent_of_threads() {
    for threads in ["1", "4"] {
        segprime()
            .args(["--threads", threads, "count", "0", "10^6", "--chunks", "7"])
            .assert()
            .success()
            .stdout("78498\n");
    }
}

#[test]
fn count_json_reports_chunks() {
    let out = segprime()
        .args(["--json", "count", "10^9", "10^9+100000", "--chunks", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["chunks"], 3);
    let expected = common::naive_primes(1_000_000_000, 1_000_100_000).len() as u64;
    assert_eq!(doc["count"], expected);
}

// --- Config ---

#[test]
fn config_file_is_applied_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let good = common::write_config(&dir, "next_sieve_bits = 32\n");
    segprime()
        .arg("--config")
        .arg(&good)
        .args(["next", "10^12"])
        .assert()
        .success()
        .stdout("1000000000039\n");

    let bad = common::write_config(&dir, "next_sieve_bits = 4\n");
    segprime()
        .env("SEGPRIME_CONFIG", &bad)
        .args(["next", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("next_sieve_bits"));
}
