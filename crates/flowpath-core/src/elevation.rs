/// Z lookup for trace vertices.
use crate::georef::Cell;
use crate::grid::ElevationGrid;

/// Z assigned when there is no surface to sample.
pub const DEFAULT_Z: f64 = 0.0;

/// Elevation at `cell`, or `DEFAULT_Z` when no surface was supplied, the
/// cell lies outside it, or the sample is nodata.
#[inline]
pub fn sample_z(cell: Cell, surface: Option<&ElevationGrid>) -> f64 {
    surface
        .and_then(|grid| grid.get(cell))
        .map_or(DEFAULT_Z, f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::georef::{GeoPoint, GridGeometry};

    #[test]
    fn samples_surface_or_falls_back_to_zero() {
        let geometry = GridGeometry::new(2, 2, 1.0, 1.0, GeoPoint::new(0.0, 2.0));
        let surface = ElevationGrid::new(geometry, vec![10.0, 11.5, -1.0, -9999.0], Some(-9999.0)).unwrap();

        assert_eq!(sample_z(Cell::new(0, 1), Some(&surface)), 11.5);
        assert_eq!(sample_z(Cell::new(1, 0), Some(&surface)), -1.0);
        assert_eq!(sample_z(Cell::new(1, 1), Some(&surface)), DEFAULT_Z);
        assert_eq!(sample_z(Cell::new(2, 1), Some(&surface)), DEFAULT_Z);
        assert_eq!(sample_z(Cell::new(-1, 0), Some(&surface)), DEFAULT_Z);
        assert_eq!(sample_z(Cell::new(0, 0), None), DEFAULT_Z);
    }
}
