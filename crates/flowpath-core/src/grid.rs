use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::georef::{Cell, GridGeometry};

/// Flow code read for any cell with no determinable direction, including
/// cells outside the raster.
pub const NO_FLOW: u8 = 0;

/// A D8 flow-direction raster, row-major, row 0 = north edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDirectionGrid {
    pub geometry: GridGeometry,
    /// Row-major D8 codes; anything outside {1, 2, 4, …, 128} is a sink.
    pub codes: Vec<u8>,
}

impl FlowDirectionGrid {
    pub fn new(geometry: GridGeometry, codes: Vec<u8>) -> Result<Self, ConfigError> {
        let grid = Self { geometry, codes };
        grid.validate()?;
        Ok(grid)
    }

    /// Create a grid with every cell set to `code`.
    pub fn filled(geometry: GridGeometry, code: u8) -> Self {
        Self { codes: vec![code; geometry.cell_count()], geometry }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        check_len("flow direction", self.geometry.cell_count(), self.codes.len())
    }

    /// Code at `cell`; `NO_FLOW` outside the raster, matching the
    /// nodata-to-zero convention of the rasters this reads.
    #[inline]
    pub fn code_at(&self, cell: Cell) -> u8 {
        self.geometry
            .index(cell)
            .and_then(|i| self.codes.get(i).copied())
            .unwrap_or(NO_FLOW)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, code: u8) {
        self.codes[row * self.geometry.cols + col] = code;
    }
}

/// Surface elevations co-registered with a `FlowDirectionGrid`.
/// Elevation values use f32; coordinate math stays f64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationGrid {
    pub geometry: GridGeometry,
    /// Row-major elevation values in map vertical units.
    pub values: Vec<f32>,
    /// Sentinel marking missing samples.  Read back as zero.
    #[serde(default)]
    pub nodata: Option<f32>,
}

impl ElevationGrid {
    pub fn new(geometry: GridGeometry, values: Vec<f32>, nodata: Option<f32>) -> Result<Self, ConfigError> {
        let grid = Self { geometry, values, nodata };
        grid.validate()?;
        Ok(grid)
    }

    pub fn filled(geometry: GridGeometry, value: f32) -> Self {
        Self { values: vec![value; geometry.cell_count()], geometry, nodata: None }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        check_len("elevation", self.geometry.cell_count(), self.values.len())
    }

    /// Raw sample at `cell`, or `None` outside the raster or on nodata.
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<f32> {
        let v = *self.values.get(self.geometry.index(cell)?)?;
        match self.nodata {
            Some(nd) if v == nd || (nd.is_nan() && v.is_nan()) => None,
            _ => Some(v),
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.values[row * self.geometry.cols + col] = val;
    }

    /// Ensure this grid shares the flow grid's dimensions and georeference.
    pub fn check_matches(&self, flow: &GridGeometry) -> Result<(), ConfigError> {
        let e = &self.geometry;
        if e.rows != flow.rows || e.cols != flow.cols {
            return Err(ConfigError::DimensionMismatch {
                flow_rows: flow.rows,
                flow_cols: flow.cols,
                elevation_rows: e.rows,
                elevation_cols: e.cols,
            });
        }
        if !e.same_georeference(flow) {
            return Err(ConfigError::GeoreferenceMismatch { flow: *flow, elevation: *e });
        }
        Ok(())
    }
}

fn check_len(grid: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::DataLength { grid, expected, actual })
    }
}
