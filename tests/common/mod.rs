//! Shared test helpers for integration tests.

#![allow(dead_code)]

use rug::Integer;

/// Primality by trial division, for reference answers on small inputs.
pub fn is_prime_naive(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Reference primes in `[low, high]` as offsets from `low`.
pub fn naive_primes(low: u64, high: u64) -> Vec<u64> {
    (low..=high)
        .filter(|&n| is_prime_naive(n))
        .map(|n| n - low)
        .collect()
}

/// Values `low + offset` as decimal strings, the way the CLI prints them.
pub fn values_text(low: u64, offsets: &[u64]) -> String {
    offsets
        .iter()
        .map(|&o| format!("{}\n", Integer::from(low) + o))
        .collect()
}

/// Write a sieve config file into `dir` and return its path.
pub fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("segprime.toml");
    std::fs::write(&path, content).unwrap();
    path
}
