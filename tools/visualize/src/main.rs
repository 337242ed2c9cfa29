//! Diagnostic visualizer: paints a flow-direction grid by D8 code and draws
//! the traced flowpaths over it as a PNG.
//! A debugging aid for eyeballing traces; the `flowpath` CLI is the output path.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flowpath_core::flow::FlowDirection;
use flowpath_core::{FlowDirectionGrid, GeoPoint, GridGeometry, Seed, TraceOptions, Tracer, VecSink};
use image::{Rgb, RgbImage};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Render a flow-direction grid and its traced flowpaths to PNG")]
struct Args {
    /// Flow-direction grid JSON.
    #[arg(long)]
    flow: PathBuf,

    /// Seed points JSON.
    #[arg(long)]
    seeds: PathBuf,

    /// Output PNG.
    #[arg(short, long, default_value = "data/debug/flowpaths.png")]
    output: PathBuf,

    /// Pixels per raster cell.
    #[arg(long, default_value = "8")]
    scale: u32,
}

// ── Colour helpers ────────────────────────────────────────────────────────────

/// D8 direction → muted hue, one per compass point.
fn direction_color(code: u8) -> [u8; 3] {
    match FlowDirection::from_code(code) {
        Some(FlowDirection::East)      => [120, 170, 120],
        Some(FlowDirection::SouthEast) => [100, 150, 170],
        Some(FlowDirection::South)     => [ 90, 120, 190],
        Some(FlowDirection::SouthWest) => [130, 110, 180],
        Some(FlowDirection::West)      => [170, 120, 150],
        Some(FlowDirection::NorthWest) => [190, 130, 110],
        Some(FlowDirection::North)     => [190, 170, 100],
        Some(FlowDirection::NorthEast) => [160, 180,  90],
        None                           => [ 20,  20,  20], // sink / nodata
    }
}

const PATH_COLOR: [u8; 3] = [255, 255, 255];
const SEED_COLOR: [u8; 3] = [230, 40, 40];

// ── Drawing ───────────────────────────────────────────────────────────────────

/// Map coordinate → pixel position.
fn to_pixel(p: GeoPoint, g: &GridGeometry, scale: u32) -> (i64, i64) {
    let px = (p.x - g.upper_left.x) / g.cell_width * scale as f64;
    let py = (g.upper_left.y - p.y) / g.cell_height * scale as f64;
    (px.round() as i64, py.round() as i64)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: [u8; 3]) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, Rgb(color));
    }
}

/// Bresenham segment, clipped to the image.
fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: [u8; 3]) {
    let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
    let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let flow: FlowDirectionGrid = serde_json::from_str(
        &fs::read_to_string(&args.flow).with_context(|| format!("Cannot read {}", args.flow.display()))?,
    )
    .context("Failed to parse flow grid")?;
    let seeds: Vec<Seed<Value>> = serde_json::from_str(
        &fs::read_to_string(&args.seeds).with_context(|| format!("Cannot read {}", args.seeds.display()))?,
    )
    .context("Failed to parse seeds")?;

    let g = flow.geometry;
    let scale = args.scale.max(1);
    println!("Tracing {} seeds over {}×{}…", seeds.len(), g.cols, g.rows);

    let tracer = Tracer::new(flow, None, TraceOptions::default()).context("Invalid flow grid")?;
    let mut sink = VecSink::new();
    tracer.run(seeds, &mut sink)?;

    let mut img = RgbImage::new(g.cols as u32 * scale, g.rows as u32 * scale);
    for r in 0..g.rows {
        for c in 0..g.cols {
            let color = direction_color(tracer.flow().codes[r * g.cols + c]);
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(c as u32 * scale + dx, r as u32 * scale + dy, Rgb(color));
                }
            }
        }
    }

    for path in &sink.paths {
        let pixels: Vec<(i64, i64)> =
            path.trace.vertices.iter().map(|v| to_pixel(v.point(), &g, scale)).collect();
        for pair in pixels.windows(2) {
            draw_line(&mut img, pair[0], pair[1], PATH_COLOR);
        }
        let (sx, sy) = pixels[0];
        for (dx, dy) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
            put(&mut img, sx + dx, sy + dy, SEED_COLOR);
        }
    }

    if let Some(dir) = args.output.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    img.save(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
