//! Per-cell terrain labelling: forest first, then threshold bands.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::grid::Grid;

pub type Rgb = [u8; 3];

/// Categorical label carried by every output cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Index into the band rule list the map was classified with.
    Band(usize),
    Forest,
    Building,
    Road,
    Unclassified,
}

/// One terrain band: cells with a value at or below `threshold` (and above
/// every lower threshold) take this band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRule {
    pub name: String,
    pub threshold: f32,
    pub color: Rgb,
}

impl BandRule {
    pub fn new(name: impl Into<String>, threshold: f32, color: Rgb) -> Self {
        Self { name: name.into(), threshold, color }
    }
}

/// What a value above every band threshold becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandOverflow {
    /// Leave the cell unclassified.
    #[default]
    Unclassified,
    /// Use the band with the highest threshold.
    HighestBand,
}

/// Inclusive `[min, max]` window on a noise value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, v: f32) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Fixed colours for the non-band labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub forest: Rgb,
    pub building: Rgb,
    pub road: Rgb,
    pub unclassified: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            forest: [34, 100, 34],
            building: [150, 40, 40],
            road: [120, 90, 60],
            unclassified: [0, 0, 0],
        }
    }
}

/// Assign Forest or a terrain band to every cell.
///
/// A cell is Forest when both the forest field and the terrain field fall
/// inside `forest_range`. Otherwise bands are scanned by ascending threshold
/// and the first with `threshold >= value` wins; `overflow` decides the rest.
pub fn label_terrain(
    terrain: &Grid<f32>,
    forest: &Grid<f32>,
    rules: &[BandRule],
    forest_range: ValueRange,
    overflow: BandOverflow,
) -> Result<Grid<Label>> {
    if !terrain.same_shape(forest) {
        return Err(MapError::DimensionMismatch {
            what: "forest field",
            want_w: terrain.width,
            want_h: terrain.height,
            got_w: forest.width,
            got_h: forest.height,
        });
    }

    let order = ascending_order(rules);
    let fallback = match overflow {
        BandOverflow::Unclassified => Label::Unclassified,
        BandOverflow::HighestBand => order.last().map_or(Label::Unclassified, |&i| Label::Band(i)),
    };

    Ok(Grid::from_fn(terrain.width, terrain.height, |x, y| {
        let value = *terrain.get(x, y);
        if forest_range.contains(*forest.get(x, y)) && forest_range.contains(value) {
            return Label::Forest;
        }
        order
            .iter()
            .find(|&&i| value <= rules[i].threshold)
            .map_or(fallback, |&i| Label::Band(i))
    }))
}

/// Rule indices sorted by threshold, ties keeping list order.
fn ascending_order(rules: &[BandRule]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rules.len()).collect();
    order.sort_by(|&a, &b| rules[a].threshold.total_cmp(&rules[b].threshold));
    order
}

/// Colour for a single label.
pub fn label_color(label: Label, rules: &[BandRule], palette: &Palette) -> Rgb {
    match label {
        Label::Band(i) => rules.get(i).map_or(palette.unclassified, |r| r.color),
        Label::Forest => palette.forest,
        Label::Building => palette.building,
        Label::Road => palette.road,
        Label::Unclassified => palette.unclassified,
    }
}

/// Row-major colour array for a renderer.
pub fn colorize(labels: &Grid<Label>, rules: &[BandRule], palette: &Palette) -> Vec<Rgb> {
    labels.values().iter().map(|&l| label_color(l, rules, palette)).collect()
}
