//! Pipeline orchestrator: noise → labels → buildings → roads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{colorize, label_terrain, Label, Rgb};
use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::grid::{Cell, Grid};
use crate::noise::generate_noise_field;
use crate::pathfind::{path_cost, Path, Pathfinder};
use crate::placement::{find_building_sites, paint_buildings, select_buildings, Building};

/// A road that was found and painted between two placed buildings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Road {
    /// Indices into [`GeneratedMap::buildings`].
    pub from: usize,
    pub to: usize,
    pub start: Cell,
    pub path: Path,
    pub cost: u32,
}

/// Full output of one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedMap {
    pub labels: Grid<Label>,
    pub buildings: Vec<Building>,
    pub roads: Vec<Road>,
    #[serde(skip)]
    pub terrain: Grid<f32>,
    #[serde(skip)]
    pub forest: Grid<f32>,
}

impl GeneratedMap {
    pub fn width(&self) -> usize {
        self.labels.width
    }

    pub fn height(&self) -> usize {
        self.labels.height
    }

    /// Row-major colour array using the config's band rules and palette.
    pub fn colors(&self, config: &MapConfig) -> Vec<Rgb> {
        colorize(&self.labels, &config.bands, &config.palette)
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.values().iter().filter(|&&l| l == label).count()
    }
}

/// The main pipeline orchestrator.
pub struct MapGenerator {
    config: MapConfig,
}

impl MapGenerator {
    /// Clamps `config` on the way in.
    pub fn new(config: MapConfig) -> Self {
        Self { config: config.validated() }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Run the full generation pipeline.
    ///
    /// Pipeline order:
    ///   1. Terrain noise field (map seed)
    ///   2. Forest noise field (forest seed)
    ///   3. Classification, placement and road routing
    pub fn generate(&self) -> Result<GeneratedMap> {
        let c = &self.config;
        let terrain = generate_noise_field(c.width, c.height, &c.terrain_noise());
        let forest = generate_noise_field(c.width, c.height, &c.forest_noise());
        classify_map(terrain, forest, c)
    }
}

/// Label, place and route over pre-built noise fields.
///
/// `config` is taken as already validated.
pub fn classify_map(terrain: Grid<f32>, forest: Grid<f32>, config: &MapConfig) -> Result<GeneratedMap> {
    if terrain.width != config.width || terrain.height != config.height {
        return Err(MapError::DimensionMismatch {
            what: "terrain field",
            want_w: config.width,
            want_h: config.height,
            got_w: terrain.width,
            got_h: terrain.height,
        });
    }

    let mut labels = label_terrain(&terrain, &forest, &config.bands, config.forest, config.band_overflow)?;
    debug!(forest = labels.values().iter().filter(|&&l| l == Label::Forest).count(), "terrain labelled");

    let sites = find_building_sites(&terrain, config.building_size, config.forest);
    let site_count = sites.len();
    let mut rng = ChaCha8Rng::seed_from_u64(config.building_seed);
    let buildings = select_buildings(sites, config.building_size, config.building_count, &mut rng);
    paint_buildings(&mut labels, &buildings);
    debug!(sites = site_count, placed = buildings.len(), "buildings placed");

    let pathfinder = Pathfinder::new(&terrain, config.road);
    let roads = route_roads(&pathfinder, &buildings, config.road_count, &mut labels)?;

    info!(
        width = config.width,
        height = config.height,
        buildings = buildings.len(),
        roads = roads.len(),
        "map generated"
    );

    Ok(GeneratedMap { labels, buildings, roads, terrain, forest })
}

/// Connect building pairs `(i, j)`, `i < j`, in placement order until
/// `road_count` roads exist. Road cells never replace Building cells.
pub fn route_roads(
    pathfinder: &Pathfinder,
    buildings: &[Building],
    road_count: usize,
    labels: &mut Grid<Label>,
) -> Result<Vec<Road>> {
    let mut roads = Vec::new();
    'pairs: for i in 0..buildings.len() {
        for j in i + 1..buildings.len() {
            if roads.len() >= road_count {
                break 'pairs;
            }
            let start = buildings[i].center();
            let end = buildings[j].center();
            let path = pathfinder.find_path(start, end)?;
            if path.is_empty() {
                debug!(from = i, to = j, "no road possible");
                continue;
            }
            for &cell in &path {
                if labels.get_cell(cell).is_some_and(|&l| l != Label::Building) {
                    labels.set_cell(cell, Label::Road)?;
                }
            }
            let cost = path_cost(start, &path);
            roads.push(Road { from: i, to: j, start, path, cost });
        }
    }
    Ok(roads)
}
