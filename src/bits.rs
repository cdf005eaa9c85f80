//! # Bits — Odd-Only Composite Bitmap
//!
//! `BitInterval` records, for one contiguous numeric interval, which odd
//! members are known composite. Only odd offsets are stored, so a bit costs
//! two integers of range: a 10M-wide window needs 625 KB and stays in L2.
//!
//! ## Layout
//!
//! The interval is addressed by *offset* `i` from an even base `b = start - 1`,
//! so offset `i` names the integer `b + i` and odd offsets name odd integers.
//! Offset `i` lives in slot `i >> 1`, word `slot / 64`, bit `slot % 64`. A set
//! bit means "composite"; a clear bit is a survivor.
//!
//! Callers never see slots. They ask `test(i)` / `set(i)` with odd offsets and
//! walk `survivors()`.

/// Packed odd-offset bitmap over `[start, start + len)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitInterval {
    words: Vec<u64>,
    len: u64,
}

impl BitInterval {
    /// All-clear bitmap covering `len` integers. Odd lengths are rounded up to
    /// even so the interval holds a whole number of odd slots.
    pub fn new(len: u64) -> Self {
        let len = len + (len & 1);
        let slots = (len / 2) as usize;
        BitInterval {
            words: vec![0u64; slots.div_ceil(64)],
            len,
        }
    }

    /// Number of integers covered (always even).
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of odd slots.
    #[inline]
    fn slots(&self) -> u64 {
        self.len / 2
    }

    /// True if odd offset `i` is marked composite.
    #[inline]
    pub fn test(&self, i: u64) -> bool {
        debug_assert!(i & 1 == 1, "BitInterval offsets are odd: {}", i);
        debug_assert!(i < self.len, "BitInterval offset {} >= {}", i, self.len);
        let slot = (i >> 1) as usize;
        self.words[slot / 64] & (1u64 << (slot % 64)) != 0
    }

    /// Mark odd offset `i` composite.
    #[inline]
    pub fn set(&mut self, i: u64) {
        debug_assert!(i & 1 == 1, "BitInterval offsets are odd: {}", i);
        debug_assert!(i < self.len, "BitInterval offset {} >= {}", i, self.len);
        let slot = (i >> 1) as usize;
        self.words[slot / 64] |= 1u64 << (slot % 64);
    }

    /// Mark `pos, pos + 2p, pos + 4p, ...` below `limit`, after nudging an even
    /// `pos` onto the next odd multiple. `pos` is the offset of a multiple of `p`.
    #[inline]
    pub(crate) fn mark_stride(&mut self, mut pos: u64, p: u64, limit: u64) {
        if pos & 1 == 0 {
            pos += p;
        }
        let limit = limit.min(self.len);
        let step = 2 * p;
        while pos < limit {
            let slot = (pos >> 1) as usize;
            self.words[slot / 64] |= 1u64 << (slot % 64);
            pos += step;
        }
    }

    /// Number of backing words.
    #[inline]
    pub(crate) fn word_len(&self) -> usize {
        self.words.len()
    }

    /// Offset limit covered by the first `words` words.
    #[inline]
    pub(crate) fn words_to_offset(words: usize) -> u64 {
        words as u64 * 128
    }

    /// Replicate words `[0, from)` over `[from, to)`, doubling the copied run
    /// each pass. The pattern in the prefix must be periodic in `from` words.
    pub(crate) fn tile(&mut self, mut from: usize, to: usize) {
        let to = to.min(self.words.len());
        while from < to {
            let run = if 2 * from > to { to - from } else { from };
            self.words.copy_within(0..run, from);
            from += run;
        }
    }

    /// Ascending odd offsets that are not marked.
    pub fn survivors(&self) -> impl Iterator<Item = u64> + '_ {
        let slots = self.slots();
        let last = self.words.len().saturating_sub(1);
        let tail = slots % 64;
        self.words.iter().enumerate().flat_map(move |(wi, &word)| {
            let mut free = !word;
            if wi == last && tail != 0 {
                free &= (1u64 << tail) - 1;
            }
            BitIter {
                word: free,
                base: wi as u64 * 64,
            }
            .map(|slot| 2 * slot + 1)
        })
    }

    /// Descending odd offsets that are not marked.
    pub fn survivors_rev(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.slots())
            .rev()
            .map(|slot| 2 * slot + 1)
            .filter(move |&i| !self.test(i))
    }

    /// Number of unmarked odd offsets.
    pub fn count_survivors(&self) -> u64 {
        // Tiling copies whole words, so padding bits in the last word may be set.
        let tail = self.slots() % 64;
        let last = self.words.len().saturating_sub(1);
        let marked: u64 = self
            .words
            .iter()
            .enumerate()
            .map(|(wi, &w)| {
                let w = if wi == last && tail != 0 {
                    w & ((1u64 << tail) - 1)
                } else {
                    w
                };
                w.count_ones() as u64
            })
            .sum();
        self.slots() - marked
    }
}

/// Iterator over set bits within a single u64 word.
struct BitIter {
    word: u64,
    base: u64,
}

impl Iterator for BitIter {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.word == 0 {
            return None;
        }
        let tz = self.word.trailing_zeros() as u64;
        self.word &= self.word - 1;
        Some(self.base + tz)
    }
}
