//! # Main — CLI Entry Point
//!
//! Routes subcommands to the library searches. Handles the shared concerns:
//! `.env` loading, logging setup, the sieve config file, and the Rayon
//! thread pool used by `count`.
//!
//! ## Subcommands
//!
//! `next`, `prev`, `gaps` work on a single number; `primes`, `twins`,
//! `cluster` and `count` on an interval; `pretest` classifies one number.
//! Numbers are decimal or `b^e`, optionally followed by `+k` or `-k`
//! (e.g. `10^100+7`, `2^127-1`).
//!
//! ## Global Options
//!
//! - `--config` / `SEGPRIME_CONFIG`: TOML file overriding sieve thresholds.
//! - `--json`: one JSON document on stdout instead of plain text.
//! - `--threads`: Rayon thread pool size (default: all cores).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "segprime",
    version,
    about = "Prime, gap, twin and cluster search over arbitrary-precision integers"
)]
struct Cli {
    /// TOML file with sieve threshold overrides (or set SEGPRIME_CONFIG)
    #[arg(long, env = "SEGPRIME_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Smallest prime greater than n
    Next {
        #[arg(allow_hyphen_values = true)]
        n: String,
    },
    /// Largest prime less than n
    Prev {
        #[arg(allow_hyphen_values = true)]
        n: String,
    },
    /// Distances from n to the nearest primes below and above
    Gaps {
        n: String,
        /// Stop once a prime is found within this distance on either side
        /// (0 searches both sides fully)
        #[arg(long, default_value_t = 0)]
        skip_width: u64,
    },
    /// Primes in [low, high]
    Primes {
        #[arg(allow_hyphen_values = true)]
        low: String,
        high: String,
        /// Sieve depth (0 = auto). A depth below sqrt(high) lists numbers
        /// with no prime factor up to the depth.
        #[arg(long, default_value_t = 0)]
        depth: u64,
    },
    /// Lower members of prime pairs (n, n + offset) in [low, high]
    Twins {
        #[arg(allow_hyphen_values = true)]
        low: String,
        high: String,
        /// Distance between the pair members
        #[arg(long, default_value_t = 2)]
        offset: u64,
    },
    /// Prime k-tuples matching a pattern, e.g. --pattern 0,2,6,8
    Cluster {
        #[arg(allow_hyphen_values = true)]
        low: String,
        high: String,
        /// Comma-separated member offsets, starting at 0
        #[arg(long, value_delimiter = ',', required = true)]
        pattern: Vec<u64>,
    },
    /// Number of primes in [low, high], counted in parallel chunks
    Count {
        #[arg(allow_hyphen_values = true)]
        low: String,
        high: String,
        /// Number of chunks (0 = one per rayon thread)
        #[arg(long, default_value_t = 0)]
        chunks: usize,
    },
    /// Classify n with the small-factor pretest, then BPSW
    Pretest {
        #[arg(allow_hyphen_values = true)]
        n: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Structured logging on stderr: LOG_FORMAT=json for machine-readable
    // output, RUST_LOG to filter.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::configure_rayon(cli.threads);
    let ctx = cli::load_context(cli.config.as_deref())?;
    let out = cli::Output { json: cli.json };

    match &cli.command {
        Commands::Next { n } => cli::run_next(&ctx, &out, n),
        Commands::Prev { n } => cli::run_prev(&ctx, &out, n),
        Commands::Gaps { n, skip_width } => cli::run_gaps(&ctx, &out, n, *skip_width),
        Commands::Primes { low, high, depth } => cli::run_primes(&ctx, &out, low, high, *depth),
        Commands::Twins { low, high, offset } => cli::run_twins(&ctx, &out, low, high, *offset),
        Commands::Cluster { low, high, pattern } => {
            cli::run_cluster(&ctx, &out, low, high, pattern)
        }
        Commands::Count { low, high, chunks } => cli::run_count(&ctx, &out, low, high, *chunks),
        Commands::Pretest { n } => cli::run_pretest(&ctx, &out, n),
    }
}
