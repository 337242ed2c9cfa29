//! D8 flow stepping and downstream tracing.
pub mod direction;
pub mod trace;

pub use crate::grid::NO_FLOW;
pub use direction::{step, FlowDirection};
pub use trace::{trace_flowpath, Termination, Trace, Vertex};
