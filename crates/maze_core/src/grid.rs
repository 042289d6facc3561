//! Grid dimensions and the world <-> grid coordinate mapping.
//!
//! ## Coordinate Systems
//!
//! - **World position** (`Vec3`): continuous, Y up.
//! - **Grid coordinate** (`IVec3`): `round(world / cell_size)` per component.
//!   Cell `k` is centred on `k * cell_size` and spans half a cell either side.
//! - **Raster coordinate** (`x, y`): the grid's `(x, z)`. Grid `y` selects a
//!   vertical layer.
//!
//! Rounding is half-up (`floor(v + 0.5)`), so a point exactly on a cell
//! boundary belongs to the upper cell on every axis, negative ones included.
//!
//! Positions must be finite. Non-finite input yields meaningless coordinates
//! rather than an error.

use bevy::math::{IVec3, Vec3};

/// Immutable grid description for one built level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Cells along world X (raster width).
    pub width: u32,
    /// Cells along world Z (raster height).
    pub height: u32,
    /// World-space size of one cell. May be anisotropic.
    pub cell_size: Vec3,
    /// Vertical subdivisions, at least 1.
    pub layer_count: usize,
}

impl Grid {
    pub fn new(width: u32, height: u32, cell_size: Vec3, layer_count: usize) -> Self {
        Self {
            width,
            height,
            cell_size,
            layer_count: layer_count.max(1),
        }
    }

    /// Grid coordinate of a world position.
    #[inline]
    pub fn world_to_cell(&self, position: Vec3) -> IVec3 {
        round_half_up(position / self.cell_size).as_ivec3()
    }

    /// World position of a cell centre.
    #[inline]
    pub fn cell_to_world(&self, cell: IVec3) -> Vec3 {
        cell.as_vec3() * self.cell_size
    }

    /// Axis-aligned box `(min, max)` of a cell in world space.
    pub fn cell_bounds(&self, cell: IVec3) -> (Vec3, Vec3) {
        let center = self.cell_to_world(cell);
        let half = self.cell_size * 0.5;
        (center - half, center + half)
    }

    /// Layer addressed by a vertical grid coordinate, clamped into range.
    #[inline]
    pub fn layer_for(&self, cell_y: i32) -> usize {
        cell_y.clamp(0, self.layer_count as i32 - 1) as usize
    }

    /// World-space extent of the whole grid, `(min, max)`.
    pub fn world_bounds(&self) -> (Vec3, Vec3) {
        let (min, _) = self.cell_bounds(IVec3::ZERO);
        let (_, max) = self.cell_bounds(IVec3::new(
            self.width as i32 - 1,
            self.layer_count as i32 - 1,
            self.height as i32 - 1,
        ));
        (min, max)
    }
}

/// Round half up, matching the level tooling's rounding of negative halves.
#[inline]
fn round_half_up(v: Vec3) -> Vec3 {
    (v + Vec3::splat(0.5)).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(8, 6, Vec3::new(2.0, 2.0, 2.0), 1)
    }

    #[test]
    fn test_world_to_cell_rounds() {
        let g = grid();
        assert_eq!(g.world_to_cell(Vec3::new(0.0, 0.0, 0.0)), IVec3::ZERO);
        assert_eq!(g.world_to_cell(Vec3::new(0.9, 0.0, 0.0)), IVec3::ZERO);
        assert_eq!(g.world_to_cell(Vec3::new(1.0, 0.0, 0.0)), IVec3::new(1, 0, 0));
        assert_eq!(g.world_to_cell(Vec3::new(4.2, 0.0, 5.1)), IVec3::new(2, 0, 3));
    }

    #[test]
    fn test_world_to_cell_half_rounds_up_when_negative() {
        let g = Grid::new(4, 4, Vec3::ONE, 1);
        assert_eq!(g.world_to_cell(Vec3::new(-0.5, 0.0, -1.5)), IVec3::new(0, 0, -1));
        assert_eq!(g.world_to_cell(Vec3::new(-0.6, 0.0, 0.0)), IVec3::new(-1, 0, 0));
    }

    #[test]
    fn test_anisotropic_cell_size() {
        let g = Grid::new(4, 4, Vec3::new(1.0, 3.0, 0.5), 2);
        assert_eq!(g.world_to_cell(Vec3::new(2.0, 3.0, 2.0)), IVec3::new(2, 1, 4));
        assert_eq!(g.cell_to_world(IVec3::new(2, 1, 4)), Vec3::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn test_cell_to_world_inverts_cell_centres() {
        let g = grid();
        for x in -2..10 {
            for z in -2..8 {
                let cell = IVec3::new(x, 0, z);
                assert_eq!(g.world_to_cell(g.cell_to_world(cell)), cell);
            }
        }
    }

    #[test]
    fn test_cell_bounds() {
        let g = grid();
        let (min, max) = g.cell_bounds(IVec3::new(1, 0, 2));
        assert_eq!(min, Vec3::new(1.0, -1.0, 3.0));
        assert_eq!(max, Vec3::new(3.0, 1.0, 5.0));
    }

    #[test]
    fn test_layer_for_clamps() {
        let g = Grid::new(2, 2, Vec3::ONE, 3);
        assert_eq!(g.layer_for(-4), 0);
        assert_eq!(g.layer_for(1), 1);
        assert_eq!(g.layer_for(9), 2);
        assert_eq!(Grid::new(2, 2, Vec3::ONE, 0).layer_count, 1);
    }
}
