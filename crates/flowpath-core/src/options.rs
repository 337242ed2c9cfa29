use serde::{Deserialize, Serialize};

use crate::georef::{Cell, GridGeometry};

/// Where a trace counts as having left the raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Stop on `row < 0 || row > rows` (likewise columns).  Row `rows` and
    /// column `cols` are still walked, giving a one-cell border south and
    /// east of the raster.  Reproduces the reference tool's output.
    #[default]
    Legacy,
    /// Stop as soon as the cell is outside `0..rows` / `0..cols`.
    Strict,
}

impl BoundaryPolicy {
    pub fn is_outside(self, cell: Cell, geometry: &GridGeometry) -> bool {
        let (rows, cols) = (geometry.rows as i64, geometry.cols as i64);
        match self {
            Self::Legacy => cell.row < 0 || cell.row > rows || cell.col < 0 || cell.col > cols,
            Self::Strict => !geometry.contains(cell),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZMode {
    Enabled,
    Disabled,
}

/// Whether output carries Z: explicit override, else enabled iff a surface
/// grid was supplied.
pub fn resolve_z_mode(z_override: Option<ZMode>, has_surface: bool) -> ZMode {
    match z_override {
        Some(mode) => mode,
        None if has_surface => ZMode::Enabled,
        None => ZMode::Disabled,
    }
}

/// Run-wide tracing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    pub boundary: BoundaryPolicy,
    /// Hard ceiling on steps per trace.  `None` derives one from the raster
    /// size when `guard_steps` is set.
    pub max_steps: Option<usize>,
    /// Apply a step ceiling at all.
    pub guard_steps: bool,
    /// Stop when a trace re-enters a cell it already visited.
    pub detect_cycles: bool,
    pub z_override: Option<ZMode>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            boundary: BoundaryPolicy::Legacy,
            max_steps: None,
            guard_steps: true,
            detect_cycles: true,
            z_override: None,
        }
    }
}

impl TraceOptions {
    /// No step ceiling, no cycle detection.  A flow grid containing a
    /// multi-cell loop makes tracing under these options never return.
    pub fn faithful() -> Self {
        Self {
            guard_steps: false,
            detect_cycles: false,
            ..Self::default()
        }
    }

    /// Effective step ceiling for a raster of this shape.
    ///
    /// An acyclic path visits each stored cell at most once and may take
    /// one more step onto the legacy border, so `rows * cols + 2` never cuts
    /// a legitimate trace short.
    pub fn step_limit(&self, geometry: &GridGeometry) -> Option<usize> {
        if !self.guard_steps {
            return None;
        }
        Some(self.max_steps.unwrap_or_else(|| geometry.cell_count().saturating_add(2)))
    }
}
