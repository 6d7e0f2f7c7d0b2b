pub mod fbm;
pub mod params;

use tracing::debug;

use crate::grid::Grid;
use fbm::Fbm;
use params::NoiseParams;

/// Generate a normalised noise field in `[0, 1]`.
///
/// Pipeline:
///   1. Draw per-octave offsets from the seed.
///   2. Sample the octave sum at every cell, centred on the grid middle.
///   3. Min-max normalise the raw sums over the whole grid.
///
/// A field with no spread (zero octaves, or every sample identical) comes back
/// as a constant 0.5.
pub fn generate_noise_field(width: usize, height: usize, params: &NoiseParams) -> Grid<f32> {
    if width == 0 || height == 0 {
        return Grid::new(width, height, 0.5);
    }

    let fbm = Fbm::new(params);
    let scale = params.effective_scale();
    let raw = sample_raw(&fbm, width, height, scale);

    let (min, max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;
    debug!(seed = params.seed, octaves = fbm.octaves(), min, max, "noise field sampled");

    let data = if span <= f64::EPSILON {
        vec![0.5f32; raw.len()]
    } else {
        raw.iter().map(|&v| ((v - min) / span).clamp(0.0, 1.0) as f32).collect()
    };

    Grid::from_vec(width, height, data).unwrap_or_else(|| Grid::new(width, height, 0.5))
}

/// Raw octave sums, row-major. Rows are independent, so the threaded build
/// produces exactly the same values.
fn sample_raw(fbm: &Fbm, width: usize, height: usize, scale: f64) -> Vec<f64> {
    let half_w = (width / 2) as f64;
    let half_h = (height / 2) as f64;
    let fill_row = |(y, row): (usize, &mut [f64])| {
        let sy = (y as f64 - half_h) / scale;
        for (x, v) in row.iter_mut().enumerate() {
            *v = fbm.sample((x as f64 - half_w) / scale, sy);
        }
    };

    let mut raw = vec![0.0f64; width * height];
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        raw.par_chunks_mut(width).enumerate().for_each(fill_row);
    }
    #[cfg(not(feature = "threading"))]
    raw.chunks_mut(width).enumerate().for_each(fill_row);
    raw
}
