/// Command-line front end: load a map config, generate, and emit the result
/// as JSON and/or a text preview.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};

use mapforge_core::{Building, GeneratedMap, Label, MapConfig, MapGenerator, Rgb, Road};

#[derive(Parser, Debug)]
#[command(name = "mapforge", about = "Generate a terrain map with buildings and roads")]
struct Args {
    /// JSON config file; omitted fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Terrain noise seed.
    #[arg(short, long)]
    seed: Option<i32>,

    #[arg(long)]
    forest_seed: Option<i32>,

    #[arg(long)]
    building_seed: Option<u64>,

    /// Number of buildings to place (0-20).
    #[arg(long)]
    buildings: Option<usize>,

    /// Number of roads to route (0-20).
    #[arg(long)]
    roads: Option<usize>,

    /// Write the generated map as JSON to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a character preview of the map to stdout.
    #[arg(long)]
    preview: bool,

    /// Print the effective (clamped) config as JSON and exit.
    #[arg(long)]
    dump_config: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// JSON document written by `--output`.
#[derive(Serialize)]
struct MapDocument<'a> {
    width: usize,
    height: usize,
    config: &'a MapConfig,
    labels: &'a [Label],
    colors: Vec<Rgb>,
    buildings: &'a [Building],
    roads: &'a [Road],
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<MapConfig> {
    let mut config = match &args.config {
        Some(path) => MapConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MapConfig::default(),
    };
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(s) = args.seed {
        config.map_seed = s;
    }
    if let Some(s) = args.forest_seed {
        config.forest_seed = s;
    }
    if let Some(s) = args.building_seed {
        config.building_seed = s;
    }
    if let Some(n) = args.buildings {
        config.building_count = n;
    }
    if let Some(n) = args.roads {
        config.road_count = n;
    }
    Ok(config)
}

/// One character per cell: band initial, `T` forest, `#` building, `+` road.
fn preview(map: &GeneratedMap, config: &MapConfig) -> String {
    let mut out = String::with_capacity((map.width() + 1) * map.height());
    for y in 0..map.height() {
        for x in 0..map.width() {
            let ch = match *map.labels.get(x, y) {
                Label::Band(i) => config
                    .bands
                    .get(i)
                    .and_then(|b| b.name.chars().next())
                    .unwrap_or('?'),
                Label::Forest => 'T',
                Label::Building => '#',
                Label::Road => '+',
                Label::Unclassified => ' ',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let generator = MapGenerator::new(load_config(&args)?);
    let config = generator.config();

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let map = generator.generate().context("map generation failed")?;

    if args.preview {
        print!("{}", preview(&map, config));
    }

    if let Some(path) = &args.output {
        let doc = MapDocument {
            width: map.width(),
            height: map.height(),
            config,
            labels: map.labels.values(),
            colors: map.colors(config),
            buildings: &map.buildings,
            roads: &map.roads,
        };
        let json = serde_json::to_string(&doc)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    for (n, road) in map.roads.iter().enumerate() {
        info!(
            road = n,
            from = road.from,
            to = road.to,
            cells = road.path.len(),
            cost = road.cost,
            "road"
        );
    }

    Ok(())
}
