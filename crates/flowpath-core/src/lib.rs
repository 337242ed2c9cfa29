//! Downstream flowpath tracing over D8 flow-direction rasters.
//!
//! Seeds are mapped to raster cells, then followed cell by cell along the
//! flow codes until they reach a sink or leave the raster.  Each seed yields
//! one ordered vertex list, optionally carrying surface elevations as Z.
pub mod elevation;
pub mod error;
pub mod flow;
pub mod georef;
pub mod grid;
pub mod options;
pub mod sink;
pub mod tracer;

pub use error::{ConfigError, EmitError, RunError};
pub use flow::{Termination, Trace, Vertex};
pub use georef::{Cell, GeoPoint, GridGeometry};
pub use grid::{ElevationGrid, FlowDirectionGrid};
pub use options::{BoundaryPolicy, TraceOptions, ZMode};
pub use sink::{FeatureSink, GeoJsonWriter, VecSink};
pub use tracer::{RunSummary, Seed, TracedPath, Tracer};
