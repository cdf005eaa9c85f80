//! # Error — Contract Violations Reported to Callers
//!
//! Only genuine misuse is an error. A window that happens to contain no prime
//! is retried by the search routines and never surfaces here, and an inverted
//! range is simply empty.

use rug::Integer;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SieveError {
    /// `prev_prime` (or a gap query) was asked for a prime below 2.
    #[error("no prime exists below {n}")]
    NoPrimeBelow { n: Integer },

    /// A raw sieve request violated its preconditions.
    #[error("invalid sieve interval: {reason}")]
    InvalidInterval { reason: &'static str },

    /// A constellation pattern is malformed (duplicate, unordered, missing 0, ...).
    #[error("invalid constellation pattern: {0}")]
    InvalidPattern(String),

    /// The range cannot be addressed with 64-bit offsets.
    #[error("range is {width_bits} bits wide; offsets must fit in 64 bits")]
    RangeTooWide { width_bits: u32 },

    /// A calibration value in `SieveConfig` is out of range.
    #[error("invalid sieve configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SieveError>;
