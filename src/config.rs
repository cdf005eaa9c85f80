//! Sieve calibration constants, loadable from TOML.
//!
//! Every field is a cost/benefit threshold tuned against GMP on 64-bit
//! hardware. None affects correctness: survivors are always confirmed by the
//! oracle. A partial TOML file overrides only the fields it names.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SieveError;
use crate::policy::{GAP_MERIT, NEXT_MERIT};

// ── Calibration ─────────────────────────────────────────────────

/// Tunable thresholds for the search and range routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    /// Width of one-sided next/prev windows, in expected primes.
    pub next_merit: f64,
    /// Starting width of two-sided gap windows, in expected primes.
    pub gap_merit: u64,
    /// `next_prime` switches from wheel stepping to sieving above this size.
    pub next_sieve_bits: u32,
    /// `prev_prime` switches from wheel stepping to sieving above this size.
    pub prev_sieve_bits: u32,
    /// `surround_primes` sieves a two-sided window at or above this size.
    pub gap_sieve_bits: u32,
    /// Residue budget for the cluster sieve's primorial growth.
    pub cluster_target_residues: u64,
    /// Cluster candidates above this size get a GCD pretest per member.
    pub cluster_pretest_bits: u32,
    /// Integers per sieved segment when enumerating or counting primes.
    pub count_segment_width: u64,
}

impl Default for SieveConfig {
    fn default() -> Self {
        SieveConfig {
            next_merit: NEXT_MERIT,
            gap_merit: GAP_MERIT,
            next_sieve_bits: 120,
            prev_sieve_bits: 200,
            gap_sieve_bits: 64,
            cluster_target_residues: 4_000_000,
            cluster_pretest_bits: 310,
            count_segment_width: 1 << 26,
        }
    }
}

/// Sieve windows are only valid for inputs above the default depth (1000),
/// so the switch to sieving must not happen below this size.
const MIN_SIEVE_BITS: u32 = 32;

/// Window merits outside this range give empty or unallocatable windows.
const MIN_MERIT: f64 = 1.0;
const MAX_MERIT: f64 = 1000.0;

impl SieveConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SieveConfig = toml::from_str(content).context("parsing sieve config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Reject values that would break a routine's preconditions.
    pub fn validate(&self) -> std::result::Result<(), SieveError> {
        if !(MIN_MERIT..=MAX_MERIT).contains(&self.next_merit) {
            return Err(SieveError::InvalidConfig(format!(
                "next_merit must be in [{}, {}], got {}",
                MIN_MERIT, MAX_MERIT, self.next_merit
            )));
        }
        if !(1..=MAX_MERIT as u64).contains(&self.gap_merit) {
            return Err(SieveError::InvalidConfig(format!(
                "gap_merit must be in [1, {}], got {}",
                MAX_MERIT, self.gap_merit
            )));
        }
        for (name, bits) in [
            ("next_sieve_bits", self.next_sieve_bits),
            ("prev_sieve_bits", self.prev_sieve_bits),
            ("gap_sieve_bits", self.gap_sieve_bits),
        ] {
            if bits < MIN_SIEVE_BITS {
                return Err(SieveError::InvalidConfig(format!(
                    "{} must be at least {}, got {}",
                    name, MIN_SIEVE_BITS, bits
                )));
            }
        }
        if self.cluster_target_residues < 1000 {
            return Err(SieveError::InvalidConfig(format!(
                "cluster_target_residues must be at least 1000, got {}",
                self.cluster_target_residues
            )));
        }
        if self.count_segment_width < 1024 {
            return Err(SieveError::InvalidConfig(format!(
                "count_segment_width must be at least 1024, got {}",
                self.count_segment_width
            )));
        }
        Ok(())
    }
}
