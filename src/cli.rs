//! # CLI Execution Functions
//!
//! Execution logic for each subcommand, kept out of `main.rs`: number
//! parsing, context construction, output formatting, and the parallel
//! chunked `count`.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use rug::ops::Pow;
use rug::Integer;
use serde_json::json;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use segprime::{
    cluster_primes_in_range, count_primes_in_range, estimate_digits, is_prob_prime, next_prime,
    pretest, prev_prime, sieve_range, surround_primes, twin_primes_in_range, PrimeContext,
    SieveConfig, SieveError,
};

// ── Input ───────────────────────────────────────────────────────

/// Parse a decimal integer or `b^e`, optionally followed by `+k` or `-k`.
pub fn parse_number(text: &str) -> Result<Integer> {
    let s = text.trim();
    let Some((base, rest)) = s.split_once('^') else {
        return s
            .parse::<Integer>()
            .with_context(|| format!("invalid number {:?}", text));
    };
    let base: Integer = base
        .trim()
        .parse()
        .with_context(|| format!("invalid base in {:?}", text))?;
    let (exp, adjust) = match rest.find(|c: char| c == '+' || c == '-') {
        Some(idx) => (&rest[..idx], Some(&rest[idx..])),
        None => (rest, None),
    };
    let exp: u32 = exp
        .trim()
        .parse()
        .with_context(|| format!("invalid exponent in {:?}", text))?;
    let mut n = base.pow(exp);
    if let Some(adjust) = adjust {
        let k: Integer = adjust
            .trim()
            .trim_start_matches('+')
            .parse()
            .with_context(|| format!("invalid offset in {:?}", text))?;
        n += k;
    }
    Ok(n)
}

fn parse_range(low: &str, high: &str) -> Result<(Integer, Integer)> {
    Ok((parse_number(low)?, parse_number(high)?))
}

/// Build the search context from an optional TOML config file.
pub fn load_context(path: Option<&Path>) -> Result<PrimeContext> {
    let config = match path {
        Some(path) => SieveConfig::load(path)?,
        None => SieveConfig::default(),
    };
    Ok(PrimeContext::new(config)?)
}

// ── Output ──────────────────────────────────────────────────────

/// Output mode shared by all subcommands.
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit(&self, doc: serde_json::Value, text: impl FnOnce() -> String) {
        if self.json {
            println!("{}", doc);
        } else {
            println!("{}", text());
        }
    }

    /// Offsets from `low` as values, one per line, or a JSON document.
    fn values(&self, kind: &str, low: &Integer, high: &Integer, offsets: &[u64]) {
        let values: Vec<String> = offsets
            .iter()
            .map(|&o| Integer::from(low + o).to_string())
            .collect();
        if self.json {
            let doc = json!({
                "kind": kind,
                "low": low.to_string(),
                "high": high.to_string(),
                "count": offsets.len(),
                "offsets": offsets,
                "values": values,
            });
            println!("{}", doc);
        } else {
            for v in values {
                println!("{}", v);
            }
        }
    }
}

// ── Single numbers ──────────────────────────────────────────────

pub fn run_next(ctx: &PrimeContext, out: &Output, n: &str) -> Result<()> {
    let n = parse_number(n)?;
    let p = next_prime(ctx, &n);
    out.emit(
        json!({
            "n": n.to_string(),
            "next": p.to_string(),
            "gap": Integer::from(&p - &n).to_string(),
            "digits": estimate_digits(&p),
        }),
        || p.to_string(),
    );
    Ok(())
}

pub fn run_prev(ctx: &PrimeContext, out: &Output, n: &str) -> Result<()> {
    let n = parse_number(n)?;
    let p = prev_prime(ctx, &n)?;
    out.emit(
        json!({
            "n": n.to_string(),
            "prev": p.to_string(),
            "gap": Integer::from(&n - &p).to_string(),
            "digits": estimate_digits(&p),
        }),
        || p.to_string(),
    );
    Ok(())
}

pub fn run_gaps(ctx: &PrimeContext, out: &Output, n: &str, skip_width: u64) -> Result<()> {
    let n = parse_number(n)?;
    let start = Instant::now();
    let (prev_gap, next_gap) = surround_primes(ctx, &n, skip_width)?;
    info!(
        bits = n.significant_bits(),
        prev_gap,
        next_gap,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "gap search finished"
    );
    out.emit(
        json!({
            "n": n.to_string(),
            "prev_gap": prev_gap,
            "next_gap": next_gap,
        }),
        || format!("{} {}", prev_gap, next_gap),
    );
    Ok(())
}

pub fn run_pretest(ctx: &PrimeContext, out: &Output, n: &str) -> Result<()> {
    let n = parse_number(n)?;
    let verdict = pretest(ctx, &n);
    let prime = is_prob_prime(ctx, &n);
    out.emit(
        json!({
            "n": n.to_string(),
            "pretest": verdict,
            "prime": prime,
        }),
        || {
            let label = if prime { "prime" } else { "composite" };
            format!("{:?} {}", verdict, label)
        },
    );
    Ok(())
}

// ── Ranges ──────────────────────────────────────────────────────

pub fn run_primes(
    ctx: &PrimeContext,
    out: &Output,
    low: &str,
    high: &str,
    depth: u64,
) -> Result<()> {
    let (low, high) = parse_range(low, high)?;
    let start = Instant::now();
    let found = sieve_range(ctx, &low, &high, depth)?;
    info!(
        found = found.len(),
        depth,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "range search finished"
    );
    out.values("primes", &low, &high, &found);
    Ok(())
}

pub fn run_twins(
    ctx: &PrimeContext,
    out: &Output,
    low: &str,
    high: &str,
    offset: u64,
) -> Result<()> {
    let (low, high) = parse_range(low, high)?;
    let start = Instant::now();
    let found = twin_primes_in_range(ctx, &low, &high, offset)?;
    info!(
        found = found.len(),
        offset,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "twin search finished"
    );
    out.values("twins", &low, &high, &found);
    Ok(())
}

pub fn run_cluster(
    ctx: &PrimeContext,
    out: &Output,
    low: &str,
    high: &str,
    pattern: &[u64],
) -> Result<()> {
    let (low, high) = parse_range(low, high)?;
    let start = Instant::now();
    let found = cluster_primes_in_range(ctx, &low, &high, pattern)?;
    info!(
        found = found.len(),
        k = pattern.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "cluster search finished"
    );
    out.values("cluster", &low, &high, &found);
    Ok(())
}

/// Split `[low, high]` into `chunks` contiguous pieces.
fn split_range(low: &Integer, high: &Integer, chunks: usize) -> Result<Vec<(Integer, Integer)>> {
    if low > high {
        return Ok(Vec::new());
    }
    let width = Integer::from(high - low);
    let Some(width) = width.to_u64() else {
        bail!(SieveError::RangeTooWide {
            width_bits: width.significant_bits(),
        });
    };
    let chunks = chunks.max(1) as u64;
    let step = (width / chunks).saturating_add(1);
    let mut pieces = Vec::with_capacity(chunks as usize);
    let mut offset = 0u64;
    while offset <= width {
        let end = offset.saturating_add(step - 1).min(width);
        pieces.push((Integer::from(low + offset), Integer::from(low + end)));
        match end.checked_add(1) {
            Some(next) => offset = next,
            None => break,
        }
    }
    Ok(pieces)
}

pub fn run_count(
    ctx: &PrimeContext,
    out: &Output,
    low: &str,
    high: &str,
    chunks: usize,
) -> Result<()> {
    let (low, high) = parse_range(low, high)?;
    let chunks = if chunks == 0 {
        rayon::current_num_threads()
    } else {
        chunks
    };
    let pieces = split_range(&low, &high, chunks)?;
    let start = Instant::now();
    let counts = pieces
        .par_iter()
        .map(|(lo, hi)| count_primes_in_range(ctx, lo, hi))
        .collect::<std::result::Result<Vec<u64>, SieveError>>()?;
    let count: u64 = counts.iter().sum();
    info!(
        count,
        chunks = pieces.len(),
        threads = rayon::current_num_threads(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "count finished"
    );
    out.emit(
        json!({
            "low": low.to_string(),
            "high": high.to_string(),
            "count": count,
            "chunks": pieces.len(),
        }),
        || count.to_string(),
    );
    Ok(())
}

// ── Rayon Configuration ─────────────────────────────────────────

/// Configure the rayon global thread pool size.
pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
