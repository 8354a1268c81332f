//! Lightweight xorshift32 PRNG

/// Seeded xorshift32 generator.
///
/// Deterministic for a given seed, which keeps particle layouts and roster
/// shuffles reproducible in tests.
#[derive(Debug, Clone)]
pub struct XorShiftRng {
    state: u32,
}

impl XorShiftRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Seed from the wall clock (sub-second nanos mixed with seconds)
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
            .unwrap_or(0x9E37_79B9);
        Self::new(nanos)
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fit the f32 mantissa exactly, so 1.0 is never produced
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns an f64 in [min, max), for millisecond timings
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f32() as f64 * (max - min)
    }

    /// Returns an index in [0, n). `n` must be non-zero.
    pub fn index(&mut self, n: usize) -> usize {
        ((self.next_f32() as f64) * n as f64) as usize % n.max(1)
    }

    /// In-place Fisher–Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_range_bounds() {
        let mut rng = XorShiftRng::new(42);
        for _ in 0..1000 {
            let v = rng.range(0.0, 10.0);
            assert!(v >= 0.0 && v < 10.0);
        }
    }

    #[test]
    fn rng_zero_seed_is_usable() {
        let mut rng = XorShiftRng::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn rng_index_in_bounds() {
        let mut rng = XorShiftRng::new(7);
        for _ in 0..1000 {
            assert!(rng.index(4) < 4);
        }
    }

    #[test]
    fn shuffle_is_a_permutation_and_deterministic() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        XorShiftRng::new(9).shuffle(&mut a);
        XorShiftRng::new(9).shuffle(&mut b);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
