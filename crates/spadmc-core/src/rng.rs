//! Deterministic uniform stream for the whole simulation.
//!
//! A 32-bit Mersenne Twister (MT19937). Every scattering decision and every
//! drift-time draw in the engine consumes this stream in a pinned order
//! (electron drift, electron scatter, hole drift, hole scatter, in pair-index
//! order), so one seed reproduces one simulation exactly. The generator also
//! implements [`RngCore`] and [`SeedableRng`] so it composes with the `rand`
//! ecosystem where convenient.

use rand::{RngCore, SeedableRng};

/// Seed used by the device-properties mode.
pub const DEVICE_SEED: u32 = 835_800;
/// Seed used by the auxiliary field-sweep modes.
pub const FIELD_SWEEP_SEED: u32 = 4_358;

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// MT19937 state.
pub struct Mt19937 {
    mt: [u32; N],
    mti: usize,
}

impl Mt19937 {
    /// Initialize from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        let mut mt = [0u32; N];
        mt[0] = seed;
        for i in 1..N {
            mt[i] = 1_812_433_253u32
                .wrapping_mul(mt[i - 1] ^ (mt[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        Self { mt, mti: N }
    }

    /// Re-seed in place, discarding all existing state.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed as u32);
    }

    fn reload(&mut self) {
        for i in 0..N {
            let y = (self.mt[i] & UPPER_MASK) | (self.mt[(i + 1) % N] & LOWER_MASK);
            let mut next = self.mt[(i + M) % N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.mt[i] = next;
        }
        self.mti = 0;
    }

    /// Next raw 32-bit word.
    pub fn next_word(&mut self) -> u32 {
        if self.mti >= N {
            self.reload();
        }
        let mut y = self.mt[self.mti];
        self.mti += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Uniform draw in `[0, 1)` with 32-bit resolution.
    pub fn uniform(&mut self) -> f64 {
        f64::from(self.next_word()) * (1.0 / 4_294_967_296.0)
    }
}

impl RngCore for Mt19937 {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        (u64::from(self.next_word()) << 32) | u64::from(self.next_word())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Mt19937 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{ChiSquared, ContinuousCDF};

    #[test]
    fn reference_vector() {
        // First outputs of MT19937 under the canonical 2002 initializer.
        let mut rng = Mt19937::new(5489);
        assert_eq!(rng.next_word(), 3_499_211_612);
        assert_eq!(rng.next_word(), 581_869_302);
        assert_eq!(rng.next_word(), 3_890_346_734);
    }

    #[test]
    fn uniform_in_unit_interval() {
        let mut rng = Mt19937::new(DEVICE_SEED);
        for _ in 0..10_000 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Mt19937::new(DEVICE_SEED);
        let mut b = Mt19937::new(DEVICE_SEED);
        for _ in 0..1000 {
            assert_eq!(a.next_word(), b.next_word());
        }
    }

    #[test]
    fn reseed_restarts_stream() {
        let mut rng = Mt19937::new(7);
        let first = rng.next_word();
        for _ in 0..100 {
            rng.next_word();
        }
        rng.reseed(7);
        assert_eq!(rng.next_word(), first);
    }

    #[test]
    fn uniform_chi_squared() {
        // 16-bin occupancy test on 64k draws; reject only below p = 1e-4.
        let mut rng = Mt19937::new(DEVICE_SEED);
        let mut bins = [0u64; 16];
        let n = 65_536;
        for _ in 0..n {
            let u = rng.uniform();
            bins[((u * 16.0) as usize).min(15)] += 1;
        }
        let expected = n as f64 / 16.0;
        let chi2: f64 = bins
            .iter()
            .map(|&o| {
                let d = o as f64 - expected;
                d * d / expected
            })
            .sum();
        let dist = ChiSquared::new(15.0).unwrap();
        let p = 1.0 - dist.cdf(chi2);
        assert!(p > 1e-4, "chi2={chi2}, p={p}");
    }

    #[test]
    fn drift_time_sampling_is_exponential() {
        // τ = −ln(u)/Γ must average 1/Γ.
        let gamma = 3.0e14;
        let mut rng = Mt19937::new(DEVICE_SEED);
        let n = 100_000;
        let mean = (0..n)
            .map(|_| -rng.uniform().ln() / gamma)
            .sum::<f64>()
            / f64::from(n);
        assert!((mean * gamma - 1.0).abs() < 0.02, "mean·Γ = {}", mean * gamma);
    }

    #[test]
    fn rand_trait_seam() {
        let mut rng = Mt19937::from_seed(5489u32.to_le_bytes());
        assert_eq!(RngCore::next_u32(&mut rng), 3_499_211_612);
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
