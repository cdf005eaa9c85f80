//! # segprime — Segmented Sieving over Arbitrary-Precision Integers
//!
//! Prime search for numbers of any size: next/previous prime, the gaps
//! around a number, and enumeration or counting of primes, twin pairs and
//! k-tuple clusters in an interval.
//!
//! Every search follows the same shape: sieve a window of odd numbers with
//! the small primes up to a size-dependent depth ([`sieve`]), then confirm
//! the survivors with BPSW ([`oracle`]). Depths and window widths come from
//! [`policy`]; the thresholds that switch strategies live in
//! [`SieveConfig`], owned by a [`PrimeContext`] together with the cached
//! primorial GCD filters.
//!
//! ## Modules
//!
//! - [`primes`]: small-prime tables, [`PrimeIterator`], primorials.
//! - [`bits`], [`sieve`]: the odd-only composite bitmap and the segment sieve.
//! - [`oracle`], [`pretest`]: BPSW and the cheap GCD/trial-division filters.
//! - [`stepper`]: `next_prime`, `prev_prime`, `surround_primes`.
//! - [`range`], [`twin`], [`cluster`]: interval enumeration and counting.
//!
//! Range results are `u64` offsets from the caller's `low`.

pub mod bits;
pub mod cluster;
pub mod config;
pub mod context;
pub mod error;
pub mod oracle;
pub mod policy;
pub mod pretest;
pub mod primes;
pub mod range;
pub mod sieve;
pub mod stepper;
pub mod twin;

pub use bits::BitInterval;
pub use cluster::{cluster_primes_in_range, validate_pattern};
pub use config::SieveConfig;
pub use context::PrimeContext;
pub use error::{Result, SieveError};
pub use oracle::{is_bpsw, is_strong_lucas_prp, miller_rabin};
pub use pretest::{is_prob_prime, pretest, Pretest, PrimorialCache};
pub use primes::{consecutive_integer_lcm, generate_primes, pn_primorial, primorial, PrimeIterator};
pub use range::{count_primes_in_range, primes_in_range, sieve_range};
pub use sieve::segment_sieve;
pub use stepper::{next_prime, prev_prime, surround_primes, surrounding_gaps};
pub use twin::twin_primes_in_range;

use rug::Integer;

/// Estimate decimal digit count from bit length, avoiding a full conversion.
pub fn estimate_digits(n: &Integer) -> u64 {
    let bits = n.significant_bits();
    if bits == 0 {
        return 1;
    }
    (bits as f64 * std::f64::consts::LOG10_2) as u64 + 1
}
