//! Seed sweep: generate one map per seed in parallel and report how many
//! buildings and roads each configuration actually achieves.
//! Output: a summary table on stderr and, optionally, per-seed JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{warn, Level};

use mapforge_core::{Label, MapConfig, MapGenerator};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sweep", about = "Run map generation across a range of seeds and summarise placement")]
struct Args {
    /// Base JSON config; seeds are overridden per run.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First seed (inclusive).
    #[arg(long, default_value_t = 0)]
    from: i32,

    /// Number of seeds to run.
    #[arg(short = 'n', long, default_value_t = 32)]
    count: u32,

    /// Write per-seed results as JSON to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

// ── Per-seed record ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SeedStats {
    seed: i32,
    buildings: usize,
    roads: usize,
    road_cells: usize,
    forest_fraction: f32,
    mean_road_cost: Option<f32>,
}

fn run_seed(base: &MapConfig, seed: i32) -> Result<SeedStats> {
    let config = MapConfig {
        map_seed: seed,
        forest_seed: seed.wrapping_mul(31).wrapping_add(7),
        building_seed: seed as u64,
        ..base.clone()
    };
    let map = MapGenerator::new(config)
        .generate()
        .with_context(|| format!("seed {seed}"))?;

    let cells = (map.width() * map.height()) as f32;
    let mean_road_cost = (!map.roads.is_empty())
        .then(|| map.roads.iter().map(|r| r.cost as f32).sum::<f32>() / map.roads.len() as f32);

    Ok(SeedStats {
        seed,
        buildings: map.buildings.len(),
        roads: map.roads.len(),
        road_cells: map.count(Label::Road),
        forest_fraction: map.count(Label::Forest) as f32 / cells,
        mean_road_cost,
    })
}

/// `count` consecutive seeds starting at `from`, wrapping past `i32::MAX`.
fn seed_range(from: i32, count: u32) -> Result<Vec<i32>> {
    let count = i32::try_from(count).context("--count does not fit in the seed range")?;
    Ok((0..count).map(|i| from.wrapping_add(i)).collect())
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f32 }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    if args.count == 0 {
        bail!("--count must be at least 1");
    }

    let base = match &args.config {
        Some(path) => MapConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MapConfig::default(),
    }
    .validated();

    let seeds = seed_range(args.from, args.count)?;
    eprintln!("Sweeping {} seeds from {} ...", seeds.len(), args.from);

    let results: Vec<Result<SeedStats>> = seeds.par_iter().map(|&s| run_seed(&base, s)).collect();

    let mut stats = Vec::with_capacity(results.len());
    for res in results {
        match res {
            Ok(s) => stats.push(s),
            Err(e) => warn!("{e:#}"),
        }
    }
    if stats.is_empty() {
        bail!("every seed failed");
    }

    let full_buildings = stats.iter().filter(|s| s.buildings == base.building_count).count();
    let full_roads = stats.iter().filter(|s| s.roads == base.road_count).count();

    eprintln!(
        "\n{:<10} {:>6} {:>10} {:>8} {:>10} {:>8}",
        "", "N", "Buildings", "Roads", "RoadCells", "Forest"
    );
    eprintln!("{}", "-".repeat(58));
    eprintln!(
        "{:<10} {:>6} {:>10.2} {:>8.2} {:>10.1} {:>8.3}",
        "mean",
        stats.len(),
        mean(stats.iter().map(|s| s.buildings as f32)),
        mean(stats.iter().map(|s| s.roads as f32)),
        mean(stats.iter().map(|s| s.road_cells as f32)),
        mean(stats.iter().map(|s| s.forest_fraction)),
    );
    eprintln!(
        "\n{full_buildings}/{} seeds placed all {} buildings, {full_roads}/{} routed all {} roads.",
        stats.len(),
        base.building_count,
        stats.len(),
        base.road_count,
    );

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("  -> {}", path.display());
    }

    Ok(())
}
