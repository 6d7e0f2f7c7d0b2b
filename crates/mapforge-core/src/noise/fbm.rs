//! Octave-summed Perlin noise with seeded per-octave offsets.
//!
//! The Perlin lattice itself is fixed; the map seed only decides where each
//! octave samples it. Offsets are drawn one octave at a time from a ChaCha8
//! stream, so raising the octave count never changes the earlier octaves.
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::params::NoiseParams;

/// Lattice seed for the shared Perlin instance.
const PERLIN_SEED: u32 = 0;

/// Offsets are drawn from `[-OFFSET_RANGE, OFFSET_RANGE)`.
const OFFSET_RANGE: i32 = 10_000;

pub struct Fbm {
    pub persistence: f64,
    pub lacunarity: f64,
    offsets: Vec<[f64; 2]>,
    noise: Perlin,
}

impl Fbm {
    pub fn new(params: &NoiseParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed as u64);
        let offsets = (0..params.octaves)
            .map(|_| {
                let ox = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE) as f64 + params.offset[0];
                let oy = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE) as f64 + params.offset[1];
                [ox, oy]
            })
            .collect();
        Self {
            persistence: params.persistence,
            lacunarity: params.lacunarity,
            offsets,
            noise: Perlin::new(PERLIN_SEED),
        }
    }

    pub fn octaves(&self) -> usize {
        self.offsets.len()
    }

    pub fn offsets(&self) -> &[[f64; 2]] {
        &self.offsets
    }

    /// Evaluate at `(x, y)`, already centred and divided by the scale.
    ///
    /// Each octave contributes at most its amplitude, so the result lies in
    /// `[-Σamp, Σamp]`. It is not normalised here.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = 1.0f64;
        for &[ox, oy] in &self.offsets {
            let n = self.noise.get([x * freq + ox, y * freq + oy]).clamp(-1.0, 1.0);
            value += amp * n;
            amp *= self.persistence;
            freq *= self.lacunarity;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: i32, octaves: u32) -> NoiseParams {
        NoiseParams { seed, octaves, ..NoiseParams::default() }
    }

    #[test]
    fn offsets_are_a_prefix_across_octave_counts() {
        let short = Fbm::new(&params(9, 2));
        let long = Fbm::new(&params(9, 6));
        assert_eq!(short.offsets(), &long.offsets()[..2]);
    }

    #[test]
    fn offsets_include_user_pan() {
        let base = Fbm::new(&params(3, 3));
        let panned = Fbm::new(&NoiseParams { offset: [5.0, -2.5], ..params(3, 3) });
        for (a, b) in base.offsets().iter().zip(panned.offsets()) {
            assert_eq!(b[0] - a[0], 5.0);
            assert_eq!(b[1] - a[1], -2.5);
        }
    }

    #[test]
    fn zero_octaves_is_silent() {
        let fbm = Fbm::new(&params(1, 0));
        assert_eq!(fbm.sample(0.37, 1.91), 0.0);
    }

    #[test]
    fn sample_bounded_by_amplitude_sum() {
        let fbm = Fbm::new(&NoiseParams { persistence: 0.5, ..params(77, 4) });
        let bound = 1.0 + 0.5 + 0.25 + 0.125;
        for i in 0..200 {
            let v = fbm.sample(i as f64 * 0.173, i as f64 * -0.091);
            assert!(v.abs() <= bound + 1e-12, "sample {v} exceeds {bound}");
        }
    }
}
