//! Run orchestrator: validates the inputs once, then traces every seed and
//! hands the results to a sink.
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, RunError};
use crate::flow::{trace_flowpath, Termination, Trace};
use crate::georef::GeoPoint;
use crate::grid::{ElevationGrid, FlowDirectionGrid};
use crate::options::{resolve_z_mode, TraceOptions, ZMode};
use crate::sink::FeatureSink;

// ── Public structs ────────────────────────────────────────────────────────────

/// A start point and the caller's identifier for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed<I> {
    pub id: I,
    pub point: GeoPoint,
}

impl<I> Seed<I> {
    pub fn new(id: I, point: GeoPoint) -> Self {
        Self { id, point }
    }
}

/// One seed's trace, tagged with the seed id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedPath<I> {
    pub id: I,
    pub trace: Trace,
    /// Whether vertex z values came from a surface.
    pub has_z: bool,
}

/// Per-run tally of how traces ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub traced: usize,
    pub sinks: usize,
    pub off_grid: usize,
    pub step_limited: usize,
    pub cycles: usize,
    /// Traces that never entered the raster or stalled at a sink within one
    /// move of the seed cell.
    pub degenerate: usize,
}

impl RunSummary {
    fn record(&mut self, trace: &Trace) {
        self.traced += 1;
        match trace.termination {
            Termination::Sink => self.sinks += 1,
            Termination::OffGrid => self.off_grid += 1,
            Termination::StepLimit { .. } => self.step_limited += 1,
            Termination::Cycle { .. } => self.cycles += 1,
        }
        if trace.is_degenerate() {
            self.degenerate += 1;
        }
    }

    pub fn truncated(&self) -> usize {
        self.step_limited + self.cycles
    }
}

// ── Tracer ────────────────────────────────────────────────────────────────────

/// Validated flow/surface pair plus the options every trace runs under.
/// Grids are only read, so one `Tracer` can serve any number of seeds.
#[derive(Debug, Clone)]
pub struct Tracer {
    flow: FlowDirectionGrid,
    surface: Option<ElevationGrid>,
    options: TraceOptions,
    z_mode: ZMode,
}

impl Tracer {
    /// Check the grids and resolve the Z mode.  Nothing is traced yet.
    pub fn new(
        flow: FlowDirectionGrid,
        surface: Option<ElevationGrid>,
        options: TraceOptions,
    ) -> Result<Self, ConfigError> {
        flow.validate()?;
        if let Some(surface) = &surface {
            surface.validate()?;
            surface.check_matches(&flow.geometry)?;
        }
        let z_mode = resolve_z_mode(options.z_override, surface.is_some());
        debug!(
            target: "flowpath::tracer",
            rows = flow.geometry.rows,
            cols = flow.geometry.cols,
            has_surface = surface.is_some(),
            ?z_mode,
            ?options,
            "tracer.ready"
        );
        Ok(Self { flow, surface, options, z_mode })
    }

    pub fn flow(&self) -> &FlowDirectionGrid {
        &self.flow
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    pub fn has_z(&self) -> bool {
        self.z_mode == ZMode::Enabled
    }

    /// Trace a single seed.  Pure: no logging, no shared state.
    pub fn trace<I: Clone>(&self, seed: &Seed<I>) -> TracedPath<I> {
        TracedPath {
            id: seed.id.clone(),
            trace: self.trace_point(seed.point),
            has_z: self.has_z(),
        }
    }

    pub fn trace_point(&self, point: GeoPoint) -> Trace {
        // With Z disabled the surface is never read and every z stays 0.
        let surface = if self.has_z() { self.surface.as_ref() } else { None };
        trace_flowpath(point, &self.flow, surface, &self.options)
    }

    /// Trace every seed in order, emitting each path to `sink`, then finish
    /// the sink.  An empty seed list is an error.
    pub fn run<I, S>(&self, seeds: Vec<Seed<I>>, sink: &mut S) -> Result<RunSummary, RunError>
    where
        I: std::fmt::Debug,
        S: FeatureSink<I>,
    {
        if seeds.is_empty() {
            return Err(RunError::NoSeeds);
        }
        let mut summary = RunSummary::default();

        for (index, seed) in seeds.into_iter().enumerate() {
            let trace = self.trace_point(seed.point);
            summary.record(&trace);

            if trace.is_truncated() {
                warn!(
                    target: "flowpath::tracer",
                    seed = ?seed.id,
                    termination = ?trace.termination,
                    steps = trace.steps,
                    "trace.truncated"
                );
            } else {
                debug!(
                    target: "flowpath::tracer",
                    seed = ?seed.id,
                    termination = trace.termination.label(),
                    vertices = trace.vertices.len(),
                    "trace.done"
                );
            }

            let path = TracedPath { id: seed.id, trace, has_z: self.has_z() };
            sink.emit(path).map_err(|source| RunError::Emit { index, source })?;
        }
        sink.finish().map_err(RunError::Finish)?;

        info!(
            target: "flowpath::tracer",
            traced = summary.traced,
            sinks = summary.sinks,
            off_grid = summary.off_grid,
            truncated = summary.truncated(),
            degenerate = summary.degenerate,
            "run.complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmitError;
    use crate::georef::GridGeometry;
    use crate::sink::VecSink;

    fn geometry() -> GridGeometry {
        GridGeometry::new(3, 3, 10.0, 10.0, GeoPoint::new(0.0, 30.0))
    }

    fn diagonal_flow() -> FlowDirectionGrid {
        let mut flow = FlowDirectionGrid::filled(geometry(), 2);
        flow.set(2, 2, 0);
        flow
    }

    #[test]
    fn new_rejects_mismatched_surface() {
        let other = GridGeometry { cell_width: 5.0, ..geometry() };
        let err = Tracer::new(diagonal_flow(), Some(ElevationGrid::filled(other, 1.0)), TraceOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::GeoreferenceMismatch { .. }));
    }

    #[test]
    fn new_rejects_short_flow_data() {
        let mut flow = diagonal_flow();
        flow.codes.pop();
        let err = Tracer::new(flow, None, TraceOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::DataLength { .. }));
    }

    #[test]
    fn new_rejects_overflowing_dimensions() {
        let json = r#"{
            "geometry": {"rows": 4294967297, "cols": 4294967297, "cell_width": 1.0,
                         "cell_height": 1.0, "upper_left": {"x": 0.0, "y": 0.0}},
            "codes": []
        }"#;
        let flow: FlowDirectionGrid = serde_json::from_str(json).unwrap();
        let err = Tracer::new(flow, None, TraceOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyCells { .. }));
    }

    #[test]
    fn z_mode_follows_surface_unless_overridden() {
        let surface = ElevationGrid::filled(geometry(), 42.0);

        let tracer = Tracer::new(diagonal_flow(), Some(surface.clone()), TraceOptions::default()).unwrap();
        assert!(tracer.has_z());
        assert!(tracer.trace_point(GeoPoint::new(1.0, 29.0)).vertices.iter().all(|v| v.z == 42.0));

        let off = TraceOptions { z_override: Some(ZMode::Disabled), ..TraceOptions::default() };
        let tracer = Tracer::new(diagonal_flow(), Some(surface), off).unwrap();
        assert!(!tracer.has_z());
        assert!(tracer.trace_point(GeoPoint::new(1.0, 29.0)).vertices.iter().all(|v| v.z == 0.0));

        let on = TraceOptions { z_override: Some(ZMode::Enabled), ..TraceOptions::default() };
        let tracer = Tracer::new(diagonal_flow(), None, on).unwrap();
        assert!(tracer.has_z());
        assert!(tracer.trace_point(GeoPoint::new(1.0, 29.0)).vertices.iter().all(|v| v.z == 0.0));
    }

    #[test]
    fn run_keeps_seed_order_and_ids() {
        let tracer = Tracer::new(diagonal_flow(), None, TraceOptions::default()).unwrap();
        let seeds = vec![
            Seed::new("outlet", GeoPoint::new(25.0, 5.0)),
            Seed::new("ridge", GeoPoint::new(1.0, 29.0)),
            Seed::new("offshore", GeoPoint::new(5.0, -50.0)),
        ];
        let mut sink = VecSink::new();
        let summary = tracer.run(seeds, &mut sink).unwrap();

        let ids: Vec<&str> = sink.paths.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["outlet", "ridge", "offshore"]);
        assert_eq!(summary.traced, 3);
        assert_eq!(summary.sinks, 2);
        assert_eq!(summary.off_grid, 1);
        assert_eq!(summary.degenerate, 2);
        assert_eq!(sink.paths[1].trace.vertices.len(), 4);
    }

    #[test]
    fn run_rejects_empty_seed_list() {
        let tracer = Tracer::new(diagonal_flow(), None, TraceOptions::default()).unwrap();
        let mut sink: VecSink<u32> = VecSink::new();
        assert!(matches!(tracer.run(Vec::new(), &mut sink), Err(RunError::NoSeeds)));
    }

    #[test]
    fn run_reports_failing_seed_index() {
        struct FailSecond(usize);
        impl FeatureSink<u32> for FailSecond {
            fn emit(&mut self, _path: TracedPath<u32>) -> Result<(), EmitError> {
                self.0 += 1;
                if self.0 == 2 {
                    return Err(std::io::Error::other("disk full").into());
                }
                Ok(())
            }
        }

        let tracer = Tracer::new(diagonal_flow(), None, TraceOptions::default()).unwrap();
        let seeds: Vec<Seed<u32>> = (0..3u32).map(|i| Seed::new(i, GeoPoint::new(1.0, 29.0))).collect();
        let err = tracer.run(seeds, &mut FailSecond(0)).unwrap_err();
        assert!(matches!(err, RunError::Emit { index: 1, .. }));
    }

    #[test]
    fn run_counts_cycles_as_truncated() {
        let mut flow = FlowDirectionGrid::filled(geometry(), 0);
        flow.set(0, 0, 4);
        flow.set(1, 0, 64);
        let tracer = Tracer::new(flow, None, TraceOptions::default()).unwrap();
        let mut sink = VecSink::new();
        let summary = tracer.run(vec![Seed::new(1u8, GeoPoint::new(5.0, 25.0))], &mut sink).unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.truncated(), 1);
    }
}
