//! # Oracle — Probable-Prime Tests
//!
//! The confirmation step behind every sieve: survivors are merely "not known
//! composite up to depth" until one of these tests accepts them.
//!
//! - [`miller_rabin`]: single-base strong Fermat test.
//! - [`is_strong_lucas_prp`]: strong Lucas test with Selfridge's method A
//!   parameters (first `D` in 5, -7, 9, -11, ... with Jacobi symbol
//!   `(D/n) = -1`, `P = 1`, `Q = (1 - D) / 4`).
//! - [`is_bpsw`]: Baillie–PSW, base-2 Miller–Rabin followed by the strong
//!   Lucas test. No counterexample is known; callers treat it as definitive.
//!
//! ## References
//!
//! - Baillie, Wagstaff, "Lucas Pseudoprimes", Math. Comp. 35 (1980).
//! - Pomerance, Selfridge, Wagstaff, "The pseudoprimes to 25·10⁹",
//!   Math. Comp. 35 (1980).

use rug::{Assign, Integer};

use crate::primes::{gcd_u64, rem_u64};

/// Reduce `x` into `[0, n)`.
fn reduce(x: &mut Integer, n: &Integer) {
    *x %= n;
    if *x < 0 {
        *x += n;
    }
}

/// Strong probable-prime test to a single base.
///
/// Returns false for `n < 2` and even `n > 2`. A base that reduces to 0, 1 or
/// `n - 1` modulo `n` carries no information and passes.
pub fn miller_rabin(n: &Integer, base: u32) -> bool {
    if *n < 2 {
        return false;
    }
    if *n < 4 {
        return true;
    }
    if n.is_even() {
        return false;
    }
    let n_minus_1 = Integer::from(n - 1u32);
    let s = n_minus_1.find_one(0).unwrap_or(0);
    let d = Integer::from(&n_minus_1 >> s);

    let mut b = Integer::from(base);
    reduce(&mut b, n);
    if b <= 1 || b == n_minus_1 {
        return true;
    }
    let mut x = match b.pow_mod(&d, n) {
        Ok(x) => x,
        Err(_) => return false,
    };
    if x == 1 || x == n_minus_1 {
        return true;
    }
    for _ in 1..s {
        x.square_mut();
        x %= n;
        if x == n_minus_1 {
            return true;
        }
        if x == 1 {
            return false;
        }
    }
    false
}

/// Selfridge method A: the first `D` in 5, -7, 9, -11, ... with `(D/n) = -1`.
///
/// Returns `None` when `n` is proven composite along the way (a `D` sharing
/// a proper factor with `n`).
fn selfridge_d(n: &Integer) -> Option<i64> {
    let mut d: i64 = 5;
    loop {
        let dz = Integer::from(d);
        match dz.jacobi(n) {
            -1 => return Some(d),
            0 if *n != d.unsigned_abs() => return None,
            _ => {}
        }
        d = if d > 0 { -(d + 2) } else { -d + 2 };
    }
}

/// Halve `x` modulo odd `n`, with `x` already in `[0, n)`.
fn half_mod(x: &mut Integer, n: &Integer) {
    if x.is_odd() {
        *x += n;
    }
    *x >>= 1u32;
}

/// Strong Lucas probable-prime test (Selfridge parameters, `P = 1`).
///
/// Writes `n + 1 = d · 2^s` and accepts when `U_d ≡ 0` or
/// `V_{d·2^r} ≡ 0 (mod n)` for some `0 <= r < s`.
pub fn is_strong_lucas_prp(n: &Integer) -> bool {
    if *n < 2 {
        return false;
    }
    if *n == 2 {
        return true;
    }
    if n.is_even() || n.is_perfect_square() {
        return false;
    }
    let Some(d_param) = selfridge_d(n) else {
        return false;
    };
    let q_param = (1 - d_param) / 4;
    let q_abs = q_param.unsigned_abs();
    if q_abs > 1 && gcd_u64(rem_u64(n, q_abs), q_abs) != 1 && *n != q_abs {
        return false;
    }

    let mut q = Integer::from(q_param);
    reduce(&mut q, n);
    let mut big_d = Integer::from(d_param);
    reduce(&mut big_d, n);

    let n_plus_1 = Integer::from(n + 1u32);
    let s = n_plus_1.find_one(0).unwrap_or(0);
    let d = Integer::from(&n_plus_1 >> s);

    // Index k = 1: U_1 = 1, V_1 = P = 1, Q^1.
    let mut u = Integer::from(1);
    let mut v = Integer::from(1);
    let mut qk = q.clone();
    let mut t = Integer::new();
    let top = d.significant_bits();
    for bit in (0..top.saturating_sub(1)).rev() {
        // k -> 2k
        u *= &v;
        reduce(&mut u, n);
        v.square_mut();
        t.assign(&qk << 1u32);
        v -= &t;
        reduce(&mut v, n);
        qk.square_mut();
        reduce(&mut qk, n);
        if d.get_bit(bit) {
            // k -> k + 1 with P = 1: U' = (U + V) / 2, V' = (D·U + V) / 2.
            t.assign(&big_d * &u);
            t += &v;
            u += &v;
            reduce(&mut u, n);
            half_mod(&mut u, n);
            v.assign(&t);
            reduce(&mut v, n);
            half_mod(&mut v, n);
            qk *= &q;
            reduce(&mut qk, n);
        }
    }

    if u == 0 || v == 0 {
        return true;
    }
    for _ in 1..s {
        v.square_mut();
        t.assign(&qk << 1u32);
        v -= &t;
        reduce(&mut v, n);
        if v == 0 {
            return true;
        }
        qk.square_mut();
        reduce(&mut qk, n);
    }
    false
}

/// Baillie–PSW: base-2 strong probable prime and strong Lucas probable prime.
pub fn is_bpsw(n: &Integer) -> bool {
    if *n < 2 {
        return false;
    }
    if *n < 4 {
        return true;
    }
    if n.is_even() {
        return false;
    }
    miller_rabin(n, 2) && is_strong_lucas_prp(n)
}
