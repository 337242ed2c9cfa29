//! Downstream flowpath tracing over a D8 grid.
//!
//! A trace starts at the seed's own coordinate, then follows the flow codes
//! one cell at a time, emitting each cell centre.  Each candidate vertex is
//! emitted before the termination checks run, so the last vertex of a trace
//! that runs off the raster lies outside it.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::direction::step;
use crate::elevation::{sample_z, DEFAULT_Z};
use crate::georef::{Cell, GeoPoint};
use crate::grid::{ElevationGrid, FlowDirectionGrid};
use crate::options::TraceOptions;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    pub fn at(point: GeoPoint, z: f64) -> Self {
        Self { x: point.x, y: point.y, z }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.x, self.y)
    }
}

/// Why a trace stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Reached a cell with no flow direction.
    Sink,
    /// Stepped past the raster edge, or the seed itself was outside it or
    /// not a finite coordinate.
    OffGrid,
    /// Hit the step ceiling before any other stop condition.
    StepLimit { limit: usize },
    /// Re-entered a cell already on this trace.
    Cycle { at: Cell },
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sink => "sink",
            Self::OffGrid => "off_grid",
            Self::StepLimit { .. } => "step_limit",
            Self::Cycle { .. } => "cycle",
        }
    }
}

/// Ordered vertices from the seed downstream.  `trace_flowpath` always
/// yields at least the seed vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub vertices: Vec<Vertex>,
    pub termination: Termination,
    /// Flow steps taken; `vertices.len() - 1`.
    pub steps: usize,
}

impl Trace {
    /// The trace never entered the raster, or stalled at a sink no more than
    /// one move from the seed cell.  A single move that leaves the raster
    /// still counts as flow.
    pub fn is_degenerate(&self) -> bool {
        // A sink stop spends its final step on the no-move.
        self.steps == 0 || (self.termination == Termination::Sink && self.steps <= 2)
    }

    /// Stopped by a guard rather than by the flow grid itself.
    pub fn is_truncated(&self) -> bool {
        matches!(self.termination, Termination::StepLimit { .. } | Termination::Cycle { .. })
    }

    pub fn last(&self) -> Option<&Vertex> {
        self.vertices.last()
    }
}

/// Trace the flowpath leaving `origin`.
///
/// `surface` is sampled for every vertex; pass `None` for flat output (all
/// z = 0).  The caller is responsible for having checked that `surface`
/// shares `flow`'s georeference.
pub fn trace_flowpath(
    origin: GeoPoint,
    flow: &FlowDirectionGrid,
    surface: Option<&ElevationGrid>,
    options: &TraceOptions,
) -> Trace {
    let geometry = &flow.geometry;
    let mut cell = geometry.point_to_cell(origin);

    if !origin.is_finite() || !geometry.contains(cell) {
        return Trace {
            vertices: vec![Vertex::at(origin, DEFAULT_Z)],
            termination: Termination::OffGrid,
            steps: 0,
        };
    }

    let mut vertices = vec![Vertex::at(origin, sample_z(cell, surface))];
    let limit = options.step_limit(geometry);
    let mut visited = options.detect_cycles.then(|| HashSet::from([cell]));
    let mut steps = 0usize;

    let termination = loop {
        let prev = cell;
        cell = step(flow, cell);
        steps += 1;
        vertices.push(Vertex::at(geometry.cell_to_point(cell), sample_z(cell, surface)));

        if options.boundary.is_outside(cell, geometry) {
            break Termination::OffGrid;
        }
        if cell == prev {
            // Only a legacy-border cell can stall outside the raster.
            break if geometry.contains(cell) { Termination::Sink } else { Termination::OffGrid };
        }
        if let Some(seen) = visited.as_mut() {
            if !seen.insert(cell) {
                break Termination::Cycle { at: cell };
            }
        }
        if let Some(limit) = limit {
            if steps >= limit {
                break Termination::StepLimit { limit };
            }
        }
    };

    Trace { vertices, termination, steps }
}
