//! Error types.  Tracing itself never fails; these cover the checks made
//! before a run starts and the hand-off to an output sink.
use thiserror::Error;

use crate::georef::GridGeometry;

/// Input rejected before any tracing begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid has no cells ({rows} rows x {cols} cols)")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("grid of {rows} rows x {cols} cols has more cells than can be addressed")]
    TooManyCells { rows: usize, cols: usize },
    #[error("cell size must be finite and positive, got {width} x {height}")]
    InvalidCellSize { width: f64, height: f64 },
    #[error("upper-left anchor must be finite, got ({x}, {y})")]
    InvalidAnchor { x: f64, y: f64 },
    #[error("{grid} grid holds {actual} samples, expected {expected}")]
    DataLength {
        grid: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "elevation grid is {elevation_rows}x{elevation_cols}, flow grid is {flow_rows}x{flow_cols}"
    )]
    DimensionMismatch {
        flow_rows: usize,
        flow_cols: usize,
        elevation_rows: usize,
        elevation_cols: usize,
    },
    #[error("elevation grid georeference {elevation:?} does not match flow grid {flow:?}")]
    GeoreferenceMismatch {
        flow: GridGeometry,
        elevation: GridGeometry,
    },
}

/// Failure reported by a `FeatureSink`.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write feature: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode feature: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no seed points supplied")]
    NoSeeds,
    #[error("seed #{index}: {source}")]
    Emit {
        index: usize,
        #[source]
        source: EmitError,
    },
    #[error("failed to finalise output: {0}")]
    Finish(#[source] EmitError),
}
