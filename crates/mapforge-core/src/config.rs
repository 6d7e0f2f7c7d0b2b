//! Generation parameters and the clamping applied before the core runs.

use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::classify::{BandOverflow, BandRule, Palette, ValueRange};
use crate::error::Result;
use crate::noise::params::{NoiseParams, MIN_SCALE};

pub const MAX_BUILDING_SIZE: u32 = 9;
pub const MAX_BUILDING_COUNT: usize = 20;
pub const MAX_ROAD_COUNT: usize = 20;

/// Everything one map generation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    #[serde(deserialize_with = "saturating_unsigned")]
    pub width: usize,
    #[serde(deserialize_with = "saturating_unsigned")]
    pub height: usize,
    pub offset: [f64; 2],

    pub noise_scale: f64,
    #[serde(deserialize_with = "saturating_unsigned")]
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,

    pub map_seed: i32,
    pub forest_seed: i32,
    pub building_seed: u64,

    pub forest: ValueRange,
    pub road: ValueRange,
    #[serde(deserialize_with = "saturating_unsigned")]
    pub building_size: u32,
    #[serde(deserialize_with = "saturating_unsigned")]
    pub building_count: usize,
    #[serde(deserialize_with = "saturating_unsigned")]
    pub road_count: usize,

    pub bands: Vec<BandRule>,
    pub band_overflow: BandOverflow,
    pub palette: Palette,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            offset: [0.0, 0.0],
            noise_scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            map_seed: 0,
            forest_seed: 1,
            building_seed: 0,
            forest: ValueRange::new(0.55, 0.7),
            road: ValueRange::new(0.4, 0.7),
            building_size: 3,
            building_count: 5,
            road_count: 3,
            bands: default_bands(),
            band_overflow: BandOverflow::default(),
            palette: Palette::default(),
        }
    }
}

/// Read a count or dimension that may arrive negative, flooring it at zero.
///
/// The lower bounds that matter (width ≥ 1 and so on) are applied later in
/// [`MapConfig::validated`]; this only keeps a negative value from failing
/// the whole parse.
fn saturating_unsigned<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = i64::deserialize(d)?;
    if raw < 0 {
        warn!(value = raw, "negative value raised to 0");
    }
    T::try_from(raw.max(0)).map_err(|_| de::Error::custom(format!("value {raw} is out of range")))
}

/// Water, sand, grass, rock, snow.
pub fn default_bands() -> Vec<BandRule> {
    vec![
        BandRule::new("water", 0.3, [40, 80, 200]),
        BandRule::new("sand", 0.4, [210, 200, 140]),
        BandRule::new("grass", 0.7, [90, 170, 60]),
        BandRule::new("rock", 0.9, [120, 110, 100]),
        BandRule::new("snow", 1.0, [245, 245, 250]),
    ]
}

impl MapConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Clamp every field into its usable range.
    ///
    /// The generator assumes a validated config and does not re-check.
    pub fn validated(mut self) -> Self {
        if self.width < 1 {
            warn!(width = self.width, "width raised to 1");
            self.width = 1;
        }
        if self.height < 1 {
            warn!(height = self.height, "height raised to 1");
            self.height = 1;
        }
        if self.noise_scale <= 0.0 {
            warn!(scale = self.noise_scale, "noise scale raised to {MIN_SCALE}");
            self.noise_scale = MIN_SCALE;
        }
        if self.lacunarity < 1.0 {
            warn!(lacunarity = self.lacunarity, "lacunarity raised to 1");
            self.lacunarity = 1.0;
        }
        if self.forest_seed.unsigned_abs() == self.map_seed.unsigned_abs() {
            let bumped = self.forest_seed.wrapping_add(1);
            warn!(from = self.forest_seed, to = bumped, "forest seed matched map seed, perturbed");
            self.forest_seed = bumped;
        }
        if self.forest.max < self.forest.min {
            warn!(min = self.forest.min, max = self.forest.max, "forest max raised to min");
            self.forest.max = self.forest.min;
        }
        if self.road.max < self.road.min {
            warn!(min = self.road.min, max = self.road.max, "road max raised to min");
            self.road.max = self.road.min;
        }
        let size = self.building_size.clamp(1, MAX_BUILDING_SIZE);
        if size != self.building_size {
            warn!(from = self.building_size, to = size, "building size clamped");
            self.building_size = size;
        }
        if self.building_count > MAX_BUILDING_COUNT {
            warn!(from = self.building_count, "building count clamped to {MAX_BUILDING_COUNT}");
            self.building_count = MAX_BUILDING_COUNT;
        }
        if self.road_count > MAX_ROAD_COUNT {
            warn!(from = self.road_count, "road count clamped to {MAX_ROAD_COUNT}");
            self.road_count = MAX_ROAD_COUNT;
        }
        self
    }

    fn noise_params(&self, seed: i32) -> NoiseParams {
        NoiseParams {
            seed,
            scale: self.noise_scale,
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            offset: self.offset,
        }
    }

    pub fn terrain_noise(&self) -> NoiseParams {
        self.noise_params(self.map_seed)
    }

    pub fn forest_noise(&self) -> NoiseParams {
        self.noise_params(self.forest_seed)
    }
}
