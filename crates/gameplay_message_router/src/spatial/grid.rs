//! Uniform grid used to bucket spatial listeners.
//!
//! The world's XY plane is divided into square cells of a fixed edge length.
//! A cell is addressed by a 64-bit id holding the signed X cell coordinate in
//! the high 32 bits and the signed Y cell coordinate in the low 32 bits.
//! Height (Z) never influences cell membership.

use crate::types::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Cell sets of typical listeners fit inline.
pub type CellSet = SmallVec<[CellId; 9]>;

/// Packed identifier of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub i64);

impl CellId {
    /// Packs cell coordinates into an id.
    pub fn from_coords(x: i32, y: i32) -> Self {
        Self(((x as i64) << 32) | (y as u32 as i64))
    }

    /// Unpacks the `(x, y)` cell coordinates.
    pub fn coords(self) -> (i32, i32) {
        ((self.0 >> 32) as i32, self.0 as i32)
    }

    /// The cell containing `position`.
    pub fn containing(position: Vec3, cell_size: f64) -> Self {
        Self::from_coords(
            cell_coord(position.x, cell_size),
            cell_coord(position.y, cell_size),
        )
    }

    /// World-space center of the cell, at height 0.
    pub fn center(self, cell_size: f64) -> Vec3 {
        let (x, y) = self.coords();
        Vec3::new(
            (x as f64 + 0.5) * cell_size,
            (y as f64 + 0.5) * cell_size,
            0.0,
        )
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.coords();
        write!(f, "cell({x}, {y})")
    }
}

fn cell_coord(world: f64, cell_size: f64) -> i32 {
    (world / cell_size).floor() as i32
}

/// Every cell whose square overlaps the circle of `radius` around `center`.
///
/// A cell overlaps if the XY distance from `center` to the closest point of
/// the cell square is at most `radius`. Never empty: if nothing overlaps (a
/// degenerate radius), the cell containing `center` is returned.
pub fn cells_in_radius(center: Vec3, radius: f64, cell_size: f64) -> CellSet {
    let mut cells = CellSet::new();

    let min_x = cell_coord(center.x - radius, cell_size);
    let max_x = cell_coord(center.x + radius, cell_size);
    let min_y = cell_coord(center.y - radius, cell_size);
    let max_y = cell_coord(center.y + radius, cell_size);
    let radius_squared = radius * radius;

    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let cell_min_x = x as f64 * cell_size;
            let cell_min_y = y as f64 * cell_size;
            let closest_x = center.x.clamp(cell_min_x, cell_min_x + cell_size);
            let closest_y = center.y.clamp(cell_min_y, cell_min_y + cell_size);

            let dx = center.x - closest_x;
            let dy = center.y - closest_y;
            if dx * dx + dy * dy <= radius_squared {
                cells.push(CellId::from_coords(x, y));
            }
        }
    }

    if cells.is_empty() {
        cells.push(CellId::containing(center, cell_size));
    }

    cells
}
