/// Trace downstream flowpaths from seed points over a D8 flow-direction
/// grid and write them as GeoJSON LineStrings.
///
/// Inputs are the workspace's JSON forms of `FlowDirectionGrid`,
/// `ElevationGrid` and a list of `{ "id": ..., "point": { "x", "y" } }` seeds.
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flowpath_core::{
    BoundaryPolicy, ElevationGrid, FlowDirectionGrid, GeoJsonWriter, Seed, TraceOptions, Tracer, ZMode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "flowpath", about = "Trace downstream flowpaths over a D8 flow-direction grid")]
struct Args {
    /// Flow-direction grid JSON.
    #[arg(short, long)]
    flow: PathBuf,

    /// Seed points JSON: an array of { "id", "point": { "x", "y" } }.
    #[arg(short, long)]
    seeds: PathBuf,

    /// Optional surface grid JSON; enables Z output unless --z says otherwise.
    #[arg(long)]
    surface: Option<PathBuf>,

    /// Output GeoJSON path, `-` for stdout.
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// TraceOptions JSON file; flags below override its fields.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Edge rule: `legacy` walks a one-cell border south and east of the grid.
    #[arg(long, value_enum)]
    boundary: Option<BoundaryArg>,

    /// Force Z output on or off.
    #[arg(long, value_enum)]
    z: Option<ZArg>,

    /// Step ceiling per trace (default: rows * cols + 2).
    #[arg(long)]
    max_steps: Option<usize>,

    /// Disable the revisited-cell check.
    #[arg(long)]
    no_cycle_check: bool,

    /// Disable every guard; a looping flow grid will then never finish.
    #[arg(long, conflicts_with_all = ["max_steps", "no_cycle_check"])]
    faithful: bool,

    /// CRS name recorded in the output collection, e.g. EPSG:32633.
    #[arg(long)]
    crs: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BoundaryArg {
    Legacy,
    Strict,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ZArg {
    Enabled,
    Disabled,
}

impl Args {
    /// File options first, then flag overrides.
    fn trace_options(&self, base: TraceOptions) -> TraceOptions {
        let mut opts = if self.faithful {
            TraceOptions { boundary: base.boundary, z_override: base.z_override, ..TraceOptions::faithful() }
        } else {
            base
        };
        if let Some(b) = self.boundary {
            opts.boundary = match b {
                BoundaryArg::Legacy => BoundaryPolicy::Legacy,
                BoundaryArg::Strict => BoundaryPolicy::Strict,
            };
        }
        if let Some(z) = self.z {
            opts.z_override = Some(match z {
                ZArg::Enabled => ZMode::Enabled,
                ZArg::Disabled => ZMode::Disabled,
            });
        }
        if let Some(n) = self.max_steps {
            opts.max_steps = Some(n);
            opts.guard_steps = true;
        }
        if self.no_cycle_check {
            opts.detect_cycles = false;
        }
        opts
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {what} {}", path.display()))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .compact()
        .init();

    let args = Args::parse();

    let base = match &args.options {
        Some(path) => read_json(path, "options")?,
        None => TraceOptions::default(),
    };
    let options = args.trace_options(base);

    let flow: FlowDirectionGrid = read_json(&args.flow, "flow grid")?;
    let surface: Option<ElevationGrid> = args
        .surface
        .as_deref()
        .map(|p| read_json(p, "surface grid"))
        .transpose()?;
    let seeds: Vec<Seed<Value>> = read_json(&args.seeds, "seeds")?;

    info!(
        flow = %args.flow.display(),
        rows = flow.geometry.rows,
        cols = flow.geometry.cols,
        seeds = seeds.len(),
        "inputs.loaded"
    );

    let tracer = Tracer::new(flow, surface, options).context("Invalid input grids")?;

    let out = open_output(&args.output)?;
    let mut writer = GeoJsonWriter::new(out);
    if let Some(crs) = &args.crs {
        writer = writer.with_crs(crs.clone());
    }

    let summary = tracer.run(seeds, &mut writer).context("Tracing failed")?;

    eprintln!(
        "{} traces: {} sinks, {} off grid, {} truncated, {} degenerate",
        summary.traced,
        summary.sinks,
        summary.off_grid,
        summary.truncated(),
        summary.degenerate
    );
    Ok(())
}
