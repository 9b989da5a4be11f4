//! Seeded MT19937 stream.
//!
//! Seeding uses the reference `init_by_array` construction and the derived
//! draws (`random`, `getrandbits`, `below`) consume words the way the
//! reference runtime does, so a seed reproduces the reference sequence.

use rand_mt::Mt19937GenRand32;

pub struct MtRng {
    mt: Mt19937GenRand32,
}

impl MtRng {
    /// Seeds from an integer: its little-endian 32-bit words become the key.
    pub fn from_seed(seed: u64) -> Self {
        let lo = seed as u32;
        let hi = (seed >> 32) as u32;
        let mt = if hi == 0 {
            Mt19937GenRand32::new_with_key([lo])
        } else {
            Mt19937GenRand32::new_with_key([lo, hi])
        };
        MtRng { mt }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.mt.next_u32()
    }

    /// Uniform fraction in `[0, 1)` with 53 bits of precision.
    pub fn random(&mut self) -> f64 {
        let a = (self.next_u32() >> 5) as u64;
        let b = (self.next_u32() >> 6) as u64;
        (a * 67_108_864 + b) as f64 / 9_007_199_254_740_992.0
    }

    /// `k` random bits, `1 <= k <= 64`, assembled little-endian from 32-bit words.
    pub fn getrandbits(&mut self, k: u32) -> u64 {
        debug_assert!((1..=64).contains(&k));
        let mut remaining = k;
        let mut out = 0u64;
        let mut shift = 0;
        while remaining > 0 {
            let mut word = self.next_u32();
            if remaining < 32 {
                word >>= 32 - remaining;
            }
            out |= (word as u64) << shift;
            shift += 32;
            remaining = remaining.saturating_sub(32);
        }
        out
    }

    /// Uniform integer in `[0, n)` by rejection sampling; `n` must be positive.
    pub fn below(&mut self, n: u64) -> u64 {
        debug_assert!(n > 0);
        let k = u64::BITS - n.leading_zeros();
        loop {
            let r = self.getrandbits(k);
            if r < n {
                return r;
            }
        }
    }

    /// Uniform integer in `[lo, hi]`, both ends inclusive.
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        let width = (hi - lo) as u64 + 1;
        lo + self.below(width) as i64
    }
}
