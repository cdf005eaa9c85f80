//! # Cluster — Prime k-Tuples in an Interval
//!
//! Finds every `n` in `[low, high]` with `n + c` prime for each offset `c`
//! of a pattern such as `{0, 2, 6, 8}` (prime quadruplets). Instead of a
//! bitmap, the interval is walked in chunks of a primorial `ppr` and only
//! the admissible residues modulo `ppr` are visited:
//!
//! 1. Build the residues `r` mod `30·7·11·…` for which no member `n + c` is
//!    divisible by a primorial prime. The primorial grows while the residue
//!    set stays under budget and `ppr` does not exceed the range width.
//! 2. Per chunk, drop residues using three pair tables over the next six
//!    primes, indexed by running native remainders.
//! 3. Drop more with one table per remaining prime below 1000.
//! 4. Confirm survivors: optional GCD pretest, base-2 Miller–Rabin on every
//!    member, then strong Lucas on every member.
//!
//! Values up to 997 would be sieved away by their own primes, so they are
//! checked directly.

use rug::{Assign, Integer};

use crate::context::PrimeContext;
use crate::error::{Result, SieveError};
use crate::oracle::{is_strong_lucas_prp, miller_rabin};
use crate::pretest::is_prob_prime;
use crate::primes::{gcd_u64, SMALL_PRIMES};
use crate::range::{check_width, odd_bounds, sieve_range, Origin};
use crate::twin::{twin_primes_in_range, MAX_PATTERN_OFFSET};

/// Largest of the primes used by the residue tables.
const LAST_SMALL_PRIME: u64 = 997;

/// Index of 7, the first prime past the base primorial 30.
const FIRST_GROWTH_INDEX: usize = 3;

/// Last prime index the primorial may grow to (47).
const LAST_GROWTH_INDEX: usize = 14;

// ── Pattern ─────────────────────────────────────────────────────

/// Check that `offsets` starts at 0, increases strictly, and stays below
/// 2³².
pub fn validate_pattern(offsets: &[u64]) -> Result<()> {
    match offsets.first() {
        None => return Err(SieveError::InvalidPattern("pattern is empty".into())),
        Some(&first) if first != 0 => {
            return Err(SieveError::InvalidPattern(format!(
                "pattern must start at 0, got {}",
                first
            )))
        }
        Some(_) => {}
    }
    if let Some(w) = offsets.windows(2).find(|w| w[0] >= w[1]) {
        return Err(SieveError::InvalidPattern(format!(
            "offsets must increase strictly, got {} then {}",
            w[0], w[1]
        )));
    }
    if let Some(&c) = offsets.iter().find(|&&c| c > MAX_PATTERN_OFFSET) {
        return Err(SieveError::InvalidPattern(format!(
            "offset {} exceeds {}",
            c, MAX_PATTERN_OFFSET
        )));
    }
    Ok(())
}

// ── Residue tables ──────────────────────────────────────────────

/// True if no member `x + c` is divisible by any of `primes`.
fn admissible(x: u64, offsets: &[u64], primes: &[u64]) -> bool {
    offsets
        .iter()
        .all(|&c| primes.iter().all(|&p| (x + c % p) % p != 0))
}

/// Admissible-remainder table for the primes `ps`, indexed by `n mod Π ps`.
fn remainder_table(offsets: &[u64], ps: &[u64]) -> Vec<bool> {
    let modulus: u64 = ps.iter().product();
    (0..modulus).map(|x| admissible(x, offsets, ps)).collect()
}

/// Residues `r` of odd `base + r` modulo a growing primorial.
struct ResidueSet {
    primorial: u64,
    residues: Vec<u64>,
    /// Index of the first small prime not folded into `primorial`.
    next_index: usize,
}

impl ResidueSet {
    fn build(base: &Integer, offsets: &[u64], max_primorial: u64, target: u64) -> Self {
        let mut primorial = 30u64;
        let remr = base.mod_u(30) as u64;
        let mut residues: Vec<u64> = (1..=primorial)
            .step_by(2)
            .filter(|&i| {
                offsets
                    .iter()
                    .all(|&c| gcd_u64(remr + i + c % primorial, primorial) == 1)
            })
            .collect();

        let mut pi = FIRST_GROWTH_INDEX;
        while pi <= LAST_GROWTH_INDEX {
            let p = u64::from(SMALL_PRIMES[pi]);
            let grown = match primorial.checked_mul(p) {
                Some(g) if g <= max_primorial => g,
                _ => break,
            };
            if residues.is_empty() || residues.len() as u64 > target / (p / 2) {
                break;
            }
            tracing::trace!(residues = residues.len(), primorial, "growing cluster primorial");
            let remr = base.mod_u(p as u32) as u64;
            let mut next = Vec::with_capacity(residues.len() * (p as usize - 1));
            for i in 0..p {
                for &r in &residues {
                    let r = i * primorial + r;
                    if offsets.iter().all(|&c| (remr + r % p + c % p) % p != 0) {
                        next.push(r);
                    }
                }
            }
            residues = next;
            primorial = grown;
            pi += 1;
        }
        ResidueSet {
            primorial,
            residues,
            next_index: pi,
        }
    }
}

/// One pair-of-primes filter with a running remainder of the chunk base.
struct PairFilter {
    modulus: u64,
    allowed: Vec<bool>,
    residue_mod: Vec<u64>,
    rem: u64,
    advance: u64,
}

impl PairFilter {
    fn new(p1: u64, p2: u64, offsets: &[u64], set: &ResidueSet, base: &Integer) -> Self {
        let modulus = p1 * p2;
        PairFilter {
            modulus,
            allowed: remainder_table(offsets, &[p1, p2]),
            residue_mod: set.residues.iter().map(|r| r % modulus).collect(),
            rem: u64::from(base.mod_u(modulus as u32)),
            advance: set.primorial % modulus,
        }
    }

    #[inline]
    fn allows(&self, idx: usize) -> bool {
        let mut x = self.rem + self.residue_mod[idx];
        if x >= self.modulus {
            x -= self.modulus;
        }
        self.allowed[x as usize]
    }

    fn advance(&mut self) {
        self.rem += self.advance;
        if self.rem >= self.modulus {
            self.rem -= self.modulus;
        }
    }
}

// ── Sieve ───────────────────────────────────────────────────────

/// Values `n` in `[low, high]` with every `n + c` prime for `c` in
/// `offsets`, as offsets from `low`.
///
/// A one-member pattern is a prime search and a two-member pattern a twin
/// search. Patterns that some prime divides in every residue class
/// (inadmissible ones) yield at most the few small values where a member
/// equals that prime.
pub fn cluster_primes_in_range(
    ctx: &PrimeContext,
    low: &Integer,
    high: &Integer,
    offsets: &[u64],
) -> Result<Vec<u64>> {
    validate_pattern(offsets)?;
    match offsets.len() {
        1 => return sieve_range(ctx, low, high, 0),
        2 => return twin_primes_in_range(ctx, low, high, offsets[1]),
        _ => {}
    }
    if low > high {
        return Ok(Vec::new());
    }
    check_width(low, high)?;
    let origin = Origin::new(low);
    let members = &offsets[1..];
    let mut out = Vec::new();
    let mut value = Integer::new();

    // Small values would be sieved away by their own primes.
    if *low <= LAST_SMALL_PRIME && *high >= 2 {
        let small_low = low.to_u64().unwrap_or(0).max(2);
        let small_high = high.to_u64().map_or(LAST_SMALL_PRIME, |h| h.min(LAST_SMALL_PRIME));
        for p in SMALL_PRIMES.iter().map(|&p| u64::from(p)) {
            if p > small_high {
                break;
            }
            if p < small_low {
                continue;
            }
            let all_prime = members.iter().all(|&c| {
                value.assign(p + c);
                is_prob_prime(ctx, &value)
            });
            if all_prime {
                out.push(origin.of_native(p));
            }
        }
    }

    let mut lo = if *low < 1 { Integer::from(1) } else { low.clone() };
    let mut hi = high.clone();
    odd_bounds(&mut lo, &mut hi);
    if lo > hi || hi <= LAST_SMALL_PRIME {
        return Ok(out);
    }

    let config = ctx.config();
    let mut base = Integer::from(&lo - 1u32);
    let width_bits = Integer::from(&hi - &base).significant_bits();
    let max_primorial = if width_bits >= 64 {
        u64::MAX
    } else {
        1u64 << width_bits
    };
    let set = ResidueSet::build(&base, offsets, max_primorial, config.cluster_target_residues);
    tracing::debug!(
        residues = set.residues.len(),
        primorial = set.primorial,
        "cluster residues"
    );
    if set.residues.is_empty() {
        return Ok(out);
    }

    let run_pretests = base.significant_bits() > config.cluster_pretest_bits;
    let gcd_filter = if run_pretests {
        Some(ctx.primorials().medium())
    } else {
        None
    };

    let start = set.next_index;
    let pair_primes: Vec<u64> = SMALL_PRIMES[start..start + 6]
        .iter()
        .map(|&p| u64::from(p))
        .collect();
    let mut pairs: Vec<PairFilter> = pair_primes
        .chunks(2)
        .map(|ps| PairFilter::new(ps[0], ps[1], offsets, &set, &base))
        .collect();
    let tail_primes: Vec<u64> = SMALL_PRIMES[start + 6..]
        .iter()
        .map(|&p| u64::from(p))
        .collect();
    let tail_tables: Vec<Vec<bool>> = tail_primes
        .iter()
        .map(|&p| remainder_table(offsets, &[p]))
        .collect();

    let (mut mr_tests, mut lucas_tests) = (0u64, 0u64);
    let mut chunk: Vec<u64> = Vec::with_capacity(set.residues.len());
    let mut member = Integer::new();
    while base <= hi {
        chunk.clear();
        chunk.extend(
            set.residues
                .iter()
                .enumerate()
                .filter(|&(idx, _)| pairs.iter().all(|f| f.allows(idx)))
                .map(|(_, &r)| r),
        );
        for f in &mut pairs {
            f.advance();
        }

        let native_base = base.to_u64();
        for (&p, table) in tail_primes.iter().zip(&tail_tables) {
            if chunk.is_empty() {
                break;
            }
            let rem = match native_base {
                Some(b) => b % p,
                None => u64::from(base.mod_u(p as u32)),
            };
            chunk.retain(|&r| table[((rem + r % p) % p) as usize]);
        }

        for &r in &chunk {
            value.assign(&base + r);
            if value > hi {
                break;
            }
            if let Some(product) = gcd_filter {
                let shares = offsets.iter().any(|&c| {
                    member.assign(&value + c);
                    member.gcd_mut(product);
                    member != 1
                });
                if shares {
                    continue;
                }
            }
            let mr_pass = offsets.iter().all(|&c| {
                member.assign(&value + c);
                mr_tests += 1;
                miller_rabin(&member, 2)
            });
            if !mr_pass {
                continue;
            }
            let lucas_pass = offsets.iter().all(|&c| {
                member.assign(&value + c);
                lucas_tests += 1;
                is_strong_lucas_prp(&member)
            });
            if lucas_pass {
                out.push(origin.of(&value));
            }
        }
        base += set.primorial;
    }
    tracing::debug!(
        mr_tests,
        lucas_tests,
        pretests = run_pretests,
        found = out.len(),
        "cluster sieve done"
    );
    Ok(out)
}
