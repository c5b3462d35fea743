use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, SeedableRng};

const SEED: u128 = 0x246C_CB2D_3B40_2853_9918_0A6D_BC3A_F444;

/// A 128-bit xorshift generator.
///
/// Each [`SnapSet`](crate::SnapSet) owns one of these by default, so there is
/// no hidden global generator state. The generator is not cryptographically
/// secure and makes no reproducibility promise unless constructed with an
/// explicit seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShiftState {
    state: u128,
}

impl XorShiftState {
    /// Creates a generator with the fixed built-in seed.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: SEED }
    }

    /// Creates a generator from an explicit 128-bit state.
    /// A zero state is replaced with the built-in seed.
    #[must_use]
    pub const fn from_state(state: u128) -> Self {
        if state == 0 { Self::new() } else { Self { state } }
    }

    /// Creates a generator seeded from the process clock.
    #[must_use]
    pub fn from_time() -> Self {
        // a clock before the epoch just falls back to the constant.
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        // spread the low-entropy clock bits across the whole state.
        let mut rng = Self::from_state(SEED ^ nanos.rotate_left(64) ^ nanos);
        rng.next();
        rng
    }

    /// Generates the next random number in the sequence.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        #[allow(clippy::cast_possible_truncation)]
        let r = x as u64; // truncation is the intended behavior here.
        r ^ (x >> 64) as u64 // add in the high bits.
    }
}

impl Default for XorShiftState {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for XorShiftState {
    #[allow(clippy::cast_possible_truncation)]
    fn next_u32(&mut self) -> u32 {
        // the high half mixes better than the low half.
        (self.next() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut chunks = dst.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next().to_le_bytes());
        }
        let rest = chunks.into_remainder();
        if !rest.is_empty() {
            let bytes = self.next().to_le_bytes();
            rest.copy_from_slice(&bytes[..rest.len()]);
        }
    }
}

impl SeedableRng for XorShiftState {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::from_state(u128::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        // splitmix the two halves so nearby u64 seeds diverge immediately.
        let lo = splitmix64(state);
        let hi = splitmix64(lo);
        Self::from_state((u128::from(hi) << 64) | u128::from(lo))
    }
}

const fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
