//! # Primes — Native Prime Generation and Primorial Products
//!
//! Native-word prime infrastructure shared by every sieve in the crate:
//!
//! 1. **`SMALL_PRIMES`**: the 168 primes below 1000. The cluster sieve builds
//!    its residue tables from them and the pretest's first primorial is their
//!    product.
//! 2. **`generate_primes`**: an odd-only sieve of Eratosthenes on the same
//!    [`BitInterval`] the big-integer sieve uses, one bit per odd integer.
//! 3. **`PrimeIterator`**: a lazy, restartable, segmented odd-only sieve that
//!    yields primes in increasing order without a fixed upper bound. This is
//!    how `segment_sieve` walks primes up to depths in the billions while
//!    holding one 2^16-integer segment plus base primes up to the square root.
//! 4. **Primorials**: `primorial` (product of primes ≤ n), `pn_primorial`
//!    (product of the first n primes) and `consecutive_integer_lcm`, all
//!    finished with a balanced product tree so GMP multiplies operands of
//!    similar size.

use rug::Integer;

use crate::bits::BitInterval;

/// The 168 primes below 1000.
pub const SMALL_PRIMES: [u32; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

/// All primes up to `limit`, in increasing order.
///
/// Sieve of Eratosthenes over a [`BitInterval`] whose odd offset `i` stands
/// for the integer `i`; each odd prime `q` marks from `q²`.
pub fn generate_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let mut comp = BitInterval::new(limit.saturating_add(1));
    let len = comp.len();
    let mut q = 3u64;
    while q * q <= limit {
        if !comp.test(q) {
            comp.mark_stride(q * q, q, len);
        }
        q += 2;
    }

    let mut primes = Vec::with_capacity(estimate_prime_count(limit));
    primes.push(2);
    primes.extend(comp.survivors().filter(|&v| v > 1 && v <= limit));
    primes
}

/// Upper estimate of π(n), for preallocation.
fn estimate_prime_count(n: u64) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

/// Integers covered by one `PrimeIterator` segment.
const SEGMENT_LEN: u64 = 1 << 16;

/// Lazy prime enumeration in increasing order.
///
/// Sieves one segment of [`SEGMENT_LEN`] integers at a time with the odd
/// primes up to the segment's square root, growing that base set (by
/// doubling its limit) only when a segment needs it. Restart with
/// [`PrimeIterator::reset`]; buffers are released on drop.
pub struct PrimeIterator {
    start: u64,
    emit_two: bool,
    base_primes: Vec<u64>,
    base_limit: u64,
    segment: BitInterval,
    /// Even base: segment offset `i` is the integer `seg_base + i`.
    seg_base: u64,
    cursor: u64,
    exhausted: bool,
}

impl PrimeIterator {
    /// Iterate all primes from 2.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Iterate primes `>= n`.
    pub fn starting_at(n: u64) -> Self {
        let mut iter = PrimeIterator {
            start: n,
            emit_two: false,
            base_primes: Vec::new(),
            base_limit: 0,
            segment: BitInterval::new(SEGMENT_LEN),
            seg_base: 0,
            cursor: 1,
            exhausted: false,
        };
        iter.reset();
        iter
    }

    /// Rewind to the first prime `>=` the original starting point.
    pub fn reset(&mut self) {
        self.emit_two = self.start <= 2;
        let first_odd = self.start.max(3) | 1;
        self.exhausted = false;
        self.load_segment(first_odd - 1);
    }

    fn load_segment(&mut self, seg_base: u64) {
        let Some(seg_end) = seg_base.checked_add(SEGMENT_LEN) else {
            self.exhausted = true;
            return;
        };
        let root = (seg_end as f64).sqrt() as u64 + 1;
        if root > self.base_limit {
            self.base_limit = root.max(self.base_limit.saturating_mul(2)).max(1024);
            self.base_primes = generate_primes(self.base_limit);
            self.base_primes.retain(|&p| p != 2);
        }

        self.seg_base = seg_base;
        self.cursor = 1;
        self.segment = BitInterval::new(SEGMENT_LEN);
        for &q in &self.base_primes {
            let Some(q2) = q.checked_mul(q) else { break };
            if q2 >= seg_end {
                break;
            }
            // First multiple of q above seg_base, never q itself.
            let first = (seg_base / q + 1) * q;
            let first = first.max(q2);
            self.segment.mark_stride(first - seg_base, q, SEGMENT_LEN);
        }
    }
}

impl Default for PrimeIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for PrimeIterator {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.emit_two {
            self.emit_two = false;
            return Some(2);
        }
        loop {
            if self.exhausted {
                return None;
            }
            while self.cursor < SEGMENT_LEN {
                let i = self.cursor;
                self.cursor += 2;
                if !self.segment.test(i) {
                    let v = self.seg_base + i;
                    if v > 1 {
                        return Some(v);
                    }
                }
            }
            match self.seg_base.checked_add(SEGMENT_LEN) {
                Some(next) => self.load_segment(next),
                None => self.exhausted = true,
            }
        }
    }
}

/// Greatest common divisor of two native words.
pub fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// `n mod m` for a native modulus, `0 <= result < m`.
///
/// Moduli that fit in 32 bits use GMP's single-limb remainder; wider moduli
/// fall back to a multi-limb division.
pub fn rem_u64(n: &Integer, m: u64) -> u64 {
    debug_assert!(m > 0);
    match u32::try_from(m) {
        Ok(m32) => u64::from(n.mod_u(m32)),
        Err(_) => {
            let modulus = Integer::from(m);
            let mut r = Integer::from(n % &modulus);
            if r < 0 {
                r += &modulus;
            }
            r.to_u64_wrapping()
        }
    }
}

/// Multiply a list of factors pairwise until one product remains.
fn product_tree(mut factors: Vec<Integer>) -> Integer {
    while factors.len() > 1 {
        let mut next = Vec::with_capacity(factors.len() / 2 + 1);
        let mut it = factors.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(a * b),
                None => next.push(a),
            }
        }
        factors = next;
    }
    factors.pop().unwrap_or_else(|| Integer::from(1))
}

/// Pack native factors into full 64-bit words before the big multiplications.
fn packed_product(values: impl Iterator<Item = u64>) -> Integer {
    let mut words = Vec::new();
    let mut acc: u64 = 1;
    for v in values {
        match acc.checked_mul(v) {
            Some(prod) => acc = prod,
            None => {
                words.push(Integer::from(acc));
                acc = v;
            }
        }
    }
    words.push(Integer::from(acc));
    product_tree(words)
}

/// Product of all primes `<= n` (n#).
pub fn primorial(n: u32) -> Integer {
    Integer::from(Integer::primorial(n))
}

/// Product of the first `n` primes (p_n#).
pub fn pn_primorial(n: usize) -> Integer {
    match n {
        0 => Integer::from(1),
        1 => Integer::from(2),
        2 => Integer::from(6),
        3 => Integer::from(30),
        4 => Integer::from(210),
        _ => packed_product(PrimeIterator::new().take(n)),
    }
}

/// lcm(1, 2, ..., b): every prime `p <= b` raised to its largest power `<= b`.
pub fn consecutive_integer_lcm(b: u64) -> Integer {
    if b < 2 {
        return Integer::from(1);
    }
    let powers = PrimeIterator::new()
        .take_while(move |&p| p <= b)
        .map(move |p| {
            let mut pp = p;
            while pp <= b / p {
                pp *= p;
            }
            pp
        });
    packed_product(powers)
}
