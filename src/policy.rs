//! # Policy — Sieve Depth and Window Width Heuristics
//!
//! Pure functions of operand size that choose how far to sieve (depth: the
//! largest prime whose multiples are marked) and how much to sieve (width of
//! the window). Sieving deeper removes more survivors but costs more per
//! window; the balance point moves with the cost of one primality test,
//! which grows roughly as `L²` for an `L`-bit operand.
//!
//! Every constant here is a calibration. Correctness never depends on them:
//! survivors are always confirmed by the oracle unless the sieve reached
//! `sqrt(high)`.
//!
//! ## Expected gap
//!
//! Near `n` the average prime gap is `ln n ≈ 0.693·L`. A window of
//! `merit · ln n` integers therefore contains about `merit` primes on average.

use std::f64::consts::LN_2;

use rug::Integer;

/// Saturation cap for sieve depth on 64-bit targets.
pub const MAX_DEPTH: u64 = 9_300_000_000_000_000_000;

/// Default merit for one-sided next/prev windows.
pub const NEXT_MERIT: f64 = 30.0;

/// Initial merit for two-sided gap windows; doubles on each miss.
pub const GAP_MERIT: u64 = 20;

/// A (width, depth) pair for one sieve pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub width: u64,
    pub depth: u64,
}

/// `1 + floor(log2(bits))`: the number of halvings until `bits` reaches zero.
pub fn log2log2(bits: u64) -> u64 {
    let mut r = 1;
    let mut i = bits;
    loop {
        i >>= 1;
        if i == 0 {
            return r;
        }
        r += 1;
    }
}

/// Sieve depth for a next/prev search at `bits` bits.
///
/// 1000 below 100 bits, otherwise `(L · (L >> 5) · ⌊1.5 · log2log2 L⌋) / 2`,
/// saturating at [`MAX_DEPTH`].
pub fn nps_depth(bits: u64) -> u64 {
    if bits < 100 {
        return 1000;
    }
    if bits > u64::from(u32::MAX) - 1 {
        return MAX_DEPTH;
    }
    let ll = (log2log2(bits) as f64 * 1.5) as u64;
    let d = bits.saturating_mul(bits >> 5).saturating_mul(ll) >> 1;
    d.min(MAX_DEPTH)
}

/// Narrowest one-sided window; keeps every window non-empty and even.
pub const MIN_WINDOW_WIDTH: u64 = 64;

fn merit_width(bits: u64, merit: f64) -> u64 {
    ((merit / 1.4427 * bits as f64 + 0.5) as u64).max(MIN_WINDOW_WIDTH)
}

/// One-sided window for `next_prime`: width `merit · ln2 · L`, made even.
pub fn next_window(bits: u64, merit: f64) -> Window {
    let width = merit_width(bits, merit);
    Window {
        width: width + (width & 1),
        depth: nps_depth(bits),
    }
}

/// One-sided window for `prev_prime`: same size, rounded up to 64.
pub fn prev_window(bits: u64, merit: f64) -> Window {
    let width = merit_width(bits, merit);
    Window {
        width: round_up_64(width),
        depth: nps_depth(bits),
    }
}

/// Half-width and depth of a two-sided gap window around `n`, given
/// `ln_n = ln n` and the current merit multiplier.
pub fn gap_window(bits: u64, ln_n: f64, merits: u64) -> Window {
    let depth = if bits > 200_000 {
        6_000_000_000_000
    } else if bits > 900 {
        let d = (-0.05 + bits as f64 / 8000.0) * ln_n * ln_n * ln_n.ln();
        (d as u64).min(MAX_DEPTH)
    } else {
        nps_depth(bits)
    };
    let width = (merits as f64 * ln_n + 0.5) as u64;
    Window {
        width: round_up_64(width),
        depth,
    }
}

fn round_up_64(x: u64) -> u64 {
    x.div_ceil(64).saturating_mul(64)
}

/// Base depth for range sieves and prime counting.
pub fn count_depth(high_bits: u64) -> u64 {
    if high_bits < 100 {
        50_000_000
    } else {
        high_bits.saturating_mul(500_000)
    }
}

/// Depth for an auto-depth range sieve: [`count_depth`], halved once for
/// each of the width thresholds 23, 21, ..., 11 bits the range is under.
pub fn range_depth(high_bits: u64, width_bits: u64) -> u64 {
    let mut k = count_depth(high_bits);
    for threshold in [23u64, 21, 19, 17, 15, 13, 11] {
        if width_bits <= threshold {
            k /= 2;
        }
    }
    k
}

/// True when a wide range of moderately small numbers is cheaper to sieve
/// completely (to `sqrt(high)`) than to sieve shallowly and test.
pub fn range_force_full(high_bits: u64, width_bits: u64) -> bool {
    let w = width_bits as f64;
    let h = high_bits as f64;
    (40..56).contains(&high_bits) && w * 2.8 >= h
        || (56..64).contains(&high_bits) && w * 2.6 >= h
        || (64..=82).contains(&high_bits) && w * 2.5 >= h
}

/// Twin sieves go much deeper than prime sieves: a pair survives twice as
/// many chances of being hit.
pub fn twin_depth(high_bits: u64) -> u64 {
    high_bits.saturating_mul(80_000)
}

/// Upper bound for the pretest's staged trial division, or `None` when the
/// primorial GCDs are already the better trade.
pub fn trial_division_limit(bits: u64) -> Option<u64> {
    if bits > 16_000 {
        Some((bits as f64 * bits as f64 * 0.005) as u64)
    } else if bits > 4000 {
        Some(80 * bits)
    } else if bits > 1600 {
        Some(30 * bits)
    } else {
        None
    }
}

/// Natural logarithm of a positive integer of any size.
pub fn ln_integer(n: &Integer) -> f64 {
    let (mantissa, exp) = n.to_f64_exp();
    mantissa.ln() + f64::from(exp) * LN_2
}

/// `floor(sqrt(n))`, saturating at `u64::MAX`.
pub fn sqrt_u64(n: &Integer) -> u64 {
    if *n <= 0 {
        return 0;
    }
    Integer::from(n.sqrt_ref()).to_u64().unwrap_or(u64::MAX)
}
