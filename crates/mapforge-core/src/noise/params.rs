use serde::{Deserialize, Serialize};

/// Smallest usable noise scale. Anything at or below zero is raised to this.
pub const MIN_SCALE: f64 = 1e-3;

/// Parameter vector for one fractal noise field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Seeds the per-octave offset stream.
    pub seed: i32,
    /// Zoom factor; larger values stretch features over more cells.
    pub scale: f64,
    pub octaves: u32,
    /// Amplitude multiplier applied per octave, usually 0-1.
    pub persistence: f64,
    /// Frequency multiplier applied per octave, ≥ 1.
    pub lacunarity: f64,
    /// Added to every octave offset; pans the field.
    pub offset: [f64; 2],
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
        }
    }
}

impl NoiseParams {
    /// Scale with the non-positive case lifted to [`MIN_SCALE`].
    pub fn effective_scale(&self) -> f64 {
        if self.scale <= 0.0 { MIN_SCALE } else { self.scale }
    }
}
