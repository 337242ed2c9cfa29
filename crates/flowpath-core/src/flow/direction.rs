//! D8 flow direction codes and the single-cell downstream step.
//!
//! ```text
//! | 32 | 64 | 128 |
//! | 16 |  X |   1 |
//! |  8 |  4 |   2 |
//! ```
use serde::{Deserialize, Serialize};

use crate::georef::Cell;
use crate::grid::FlowDirectionGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl FlowDirection {
    /// Clockwise from east, in code order.
    pub const ALL: [FlowDirection; 8] = [
        FlowDirection::East,
        FlowDirection::SouthEast,
        FlowDirection::South,
        FlowDirection::SouthWest,
        FlowDirection::West,
        FlowDirection::NorthWest,
        FlowDirection::North,
        FlowDirection::NorthEast,
    ];

    /// Decode a raster value.  `None` for sinks, nodata and anything that is
    /// not exactly one of the eight power-of-two codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::East),
            2 => Some(Self::SouthEast),
            4 => Some(Self::South),
            8 => Some(Self::SouthWest),
            16 => Some(Self::West),
            32 => Some(Self::NorthWest),
            64 => Some(Self::North),
            128 => Some(Self::NorthEast),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        1 << (self as u8)
    }

    /// (Δrow, Δcol); rows grow southward.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Self::East => (0, 1),
            Self::SouthEast => (1, 1),
            Self::South => (1, 0),
            Self::SouthWest => (1, -1),
            Self::West => (0, -1),
            Self::NorthWest => (-1, -1),
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
        }
    }
}

/// The downstream neighbour of `cell`, or `cell` itself when its code
/// names no direction.  The unchanged cell is the sink signal.
#[inline]
pub fn step(grid: &FlowDirectionGrid, cell: Cell) -> Cell {
    match FlowDirection::from_code(grid.code_at(cell)) {
        Some(dir) => {
            let (d_row, d_col) = dir.offset();
            cell.offset(d_row, d_col)
        }
        None => cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::georef::{GeoPoint, GridGeometry};

    fn grid_with_centre(code: u8) -> FlowDirectionGrid {
        let mut grid = FlowDirectionGrid::filled(
            GridGeometry::new(3, 3, 1.0, 1.0, GeoPoint::new(0.0, 3.0)),
            0,
        );
        grid.set(1, 1, code);
        grid
    }

    #[test]
    fn each_code_moves_one_cell() {
        let expected = [
            (1u8, (1, 2)),
            (2, (2, 2)),
            (4, (2, 1)),
            (8, (2, 0)),
            (16, (1, 0)),
            (32, (0, 0)),
            (64, (0, 1)),
            (128, (0, 2)),
        ];
        for (code, (row, col)) in expected {
            let next = step(&grid_with_centre(code), Cell::new(1, 1));
            assert_eq!(next, Cell::new(row, col), "code {code}");
        }
    }

    #[test]
    fn non_direction_codes_do_not_move() {
        for code in [0u8, 3, 5, 7, 12, 127, 129, 255] {
            let grid = grid_with_centre(code);
            let cell = Cell::new(1, 1);
            assert_eq!(step(&grid, cell), cell, "code {code}");
            assert_eq!(step(&grid, step(&grid, cell)), cell, "code {code}");
        }
    }

    #[test]
    fn codes_roundtrip_through_enum() {
        for dir in FlowDirection::ALL {
            assert_eq!(FlowDirection::from_code(dir.code()), Some(dir));
        }
        assert_eq!(FlowDirection::NorthEast.code(), 128);
    }
}
