use std::path::{Path, PathBuf};

use anyhow::Context;
use chunkgraph_common::{Bounds, CellCoord};
use chunkgraph_stream::{Delivered, GridConfig, GridId, GridManager};
use chunkgraph_tools::{GridInfo, GridInspector};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chunkgraph-cli", about = "CLI tool for chunk graph operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grid config file (.yaml/.yml, otherwise JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the active grid config
    Info,
    /// Drive one grid along a path and report each delta
    Walk {
        /// Grid radius
        #[arg(short, long, default_value = "3")]
        radius: i32,
        /// Starting root as x,y
        #[arg(
            long,
            default_value = "0,0",
            value_parser = parse_coord,
            allow_hyphen_values = true
        )]
        start: CellCoord,
        /// Waypoint as x,y; repeat for a longer path
        #[arg(
            long = "to",
            value_parser = parse_coord,
            required = true,
            allow_hyphen_values = true
        )]
        waypoints: Vec<CellCoord>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Draw an ASCII map after the last step
        #[arg(long)]
        map: bool,
    },
    /// Move one grid towards another and report the cells they share
    Overlap {
        /// Radius of both grids
        #[arg(short, long, default_value = "3")]
        radius: i32,
        /// Starting distance between the roots along X
        #[arg(short, long, default_value = "8")]
        distance: i32,
    },
}

/// One waypoint of a walk.
#[derive(Debug, Serialize)]
struct Step {
    to: CellCoord,
    created: Vec<CellCoord>,
    deleted: Vec<CellCoord>,
    grid: Option<GridInfo>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GridConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("chunkgraph-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", chunkgraph_stream::crate_info());
            println!("tools: {}", chunkgraph_tools::crate_info());
            println!(
                "config: min_radius={} max_radius={}",
                config.min_radius, config.max_radius
            );
        }
        Commands::Walk {
            radius,
            start,
            waypoints,
            json,
            map,
        } => {
            let mut manager: GridManager<CellCoord> = GridManager::with_config(config)?;
            let id = manager.create_grid();
            let delivered = manager.init(id, start, radius)?;
            tag_created(&mut manager, &delivered)?;
            tracing::info!(%start, cells = delivered.created.len(), "grid initialized");

            let mut steps = Vec::with_capacity(waypoints.len());
            for to in waypoints {
                let delivered = manager
                    .move_to(id, to)
                    .with_context(|| format!("moving grid to {to}"))?;
                tag_created(&mut manager, &delivered)?;
                steps.push(Step {
                    to,
                    created: delivered.created_coords(manager.cells()),
                    deleted: delivered.deleted,
                    grid: GridInspector::inspect_grid(&manager, id),
                });
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                for step in &steps {
                    println!(
                        "-> {}: created={} deleted={}",
                        step.to,
                        step.created.len(),
                        step.deleted.len()
                    );
                    if let Some(info) = &step.grid {
                        println!("   {info}");
                    }
                }
                println!("{}", GridInspector::summary(&manager));
            }

            if map {
                let area = manager
                    .grid(id)
                    .and_then(|g| g.bounds())
                    .context("grid lost its region")?;
                print!("{}", GridInspector::render_map(&manager, pad(area, 1)));
            }
        }
        Commands::Overlap { radius, distance } => {
            let mut manager: GridManager<CellCoord> = GridManager::with_config(config)?;
            let mover = manager.create_grid();
            let resident = manager.create_grid();
            manager.init(resident, CellCoord::new(distance, 0), radius)?;
            manager.init(mover, CellCoord::ORIGIN, radius)?;

            for x in 0..=distance {
                manager.move_to(mover, CellCoord::new(x, 0))?;
                let summary = GridInspector::summary(&manager);
                let touching = manager.colliding_grids(mover)?.contains(&resident);
                println!(
                    "root x={x:>3}: cells={} shared={} colliding={touching}",
                    summary.cells, summary.shared_cells
                );
            }

            let area = region(&manager, mover)?.union(&region(&manager, resident)?);
            print!("{}", GridInspector::render_map(&manager, pad(area, 1)));
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<GridConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: GridConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML config {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON config {}", path.display()))?,
    };
    config.validate()?;
    tracing::debug!(?config, "loaded grid config");
    Ok(config)
}

/// Store each new cell's coordinate as its payload, so deletions report
/// where they happened.
fn tag_created(
    manager: &mut GridManager<CellCoord>,
    delivered: &Delivered<CellCoord>,
) -> anyhow::Result<()> {
    for id in &delivered.created {
        let coord = manager
            .cells()
            .coord(*id)
            .context("created cell vanished")?;
        manager.cells_mut().attach(*id, coord)?;
    }
    Ok(())
}

fn region<T>(manager: &GridManager<T>, id: GridId) -> anyhow::Result<Bounds> {
    manager
        .grid(id)
        .and_then(|g| g.bounds())
        .context("grid is not initialized")
}

fn pad(area: Bounds, by: i32) -> Bounds {
    Bounds::new(
        CellCoord::new(area.min.x - by, area.min.y - by),
        CellCoord::new(area.max.x + by, area.max.y + by),
    )
}

fn parse_coord(s: &str) -> Result<CellCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(CellCoord::new(x, y))
}
