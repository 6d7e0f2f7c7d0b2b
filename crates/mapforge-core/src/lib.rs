//! Procedural map generation: fractal noise terrain, forest and terrain bands,
//! spaced building placement, and A* road routing between buildings.

pub mod classify;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod noise;
pub mod pathfind;
pub mod placement;

pub use classify::{BandOverflow, BandRule, Label, Palette, Rgb, ValueRange};
pub use config::MapConfig;
pub use error::{MapError, Result};
pub use generator::{classify_map, GeneratedMap, MapGenerator, Road};
pub use grid::{Cell, Grid};
pub use pathfind::{octile_distance, path_cost, Path, Pathfinder};
pub use placement::Building;
