/// Raster georeferencing: (row, col) cell indices ↔ map coordinates.
/// All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Index origin baked into `cell_to_point`.  Cell centres are computed from
/// `col - CELL_INDEX_ORIGIN` and `row - CELL_INDEX_ORIGIN`, so the centre of
/// cell (0, 0) lies one cell west and one cell north of the raster's first
/// pixel centre.  This is a fixed offset inherited from the raster tooling
/// that produced the reference traces; it is not rounding.
pub const CELL_INDEX_ORIGIN: i64 = 1;

/// A point in the raster's coordinate reference system (map units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A raster cell address.  Signed so that a step off the top or left edge
/// is representable before the trace engine rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i64,
    pub col: i64,
}

impl Cell {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// The cell displaced by `(d_row, d_col)`.
    #[inline]
    pub fn offset(self, d_row: i64, d_col: i64) -> Self {
        Self { row: self.row + d_row, col: self.col + d_col }
    }
}

/// Dimensions, cell size and upper-left anchor of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub rows: usize,
    pub cols: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    /// Map coordinate of the raster's upper-left corner.
    pub upper_left: GeoPoint,
}

impl GridGeometry {
    pub fn new(rows: usize, cols: usize, cell_width: f64, cell_height: f64, upper_left: GeoPoint) -> Self {
        Self { rows, cols, cell_width, cell_height, upper_left }
    }

    /// Reject geometry that would make the coordinate math meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid { rows: self.rows, cols: self.cols });
        }
        if self.rows.checked_mul(self.cols).is_none() {
            return Err(ConfigError::TooManyCells { rows: self.rows, cols: self.cols });
        }
        for size in [self.cell_width, self.cell_height] {
            if !size.is_finite() || size <= 0.0 {
                return Err(ConfigError::InvalidCellSize {
                    width: self.cell_width,
                    height: self.cell_height,
                });
            }
        }
        if !self.upper_left.is_finite() {
            return Err(ConfigError::InvalidAnchor {
                x: self.upper_left.x,
                y: self.upper_left.y,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Map a point to the cell containing it.
    ///
    /// The offset from the anchor is truncated toward zero and then made
    /// absolute, so points west of or above the anchor fold back onto
    /// non-negative indices.  No bounds check: callers must tolerate a
    /// result outside the raster.
    pub fn point_to_cell(&self, point: GeoPoint) -> Cell {
        let col = ((self.upper_left.x - point.x) / self.cell_width).trunc().abs();
        let row = ((self.upper_left.y - point.y) / self.cell_height).trunc().abs();
        Cell::new(row as i64, col as i64)
    }

    /// Centre coordinate of `cell`, using the `CELL_INDEX_ORIGIN` offset.
    pub fn cell_to_point(&self, cell: Cell) -> GeoPoint {
        let col = (cell.col - CELL_INDEX_ORIGIN) as f64;
        let row = (cell.row - CELL_INDEX_ORIGIN) as f64;
        GeoPoint::new(
            self.upper_left.x + col * self.cell_width + self.cell_width / 2.0,
            self.upper_left.y - row * self.cell_height - self.cell_height / 2.0,
        )
    }

    /// True if `cell` addresses a stored pixel.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.col >= 0 && (cell.row as usize) < self.rows && (cell.col as usize) < self.cols
    }

    /// Row-major offset of `cell`, or `None` outside the raster.
    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row as usize * self.cols + cell.col as usize)
        } else {
            None
        }
    }

    /// Same dimensions, cell size and anchor.
    pub fn same_georeference(&self, other: &GridGeometry) -> bool {
        self == other
    }
}
