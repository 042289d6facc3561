//! Grid line-trace collision with per-axis wall sliding.
//!
//! `line_trace` walks the supercover between two world points and stops at the
//! first blocking cell. Instead of a true box sweep it probes the two
//! horizontal neighbours of the last cell known to be open, one step in the
//! direction of travel:
//!
//! ```text
//!         probe z
//!            |
//!   safe --> X  blocked
//!    |
//!  probe x
//! ```
//!
//! Each axis whose probe is blocked is pinned to the origin's coordinate, the
//! other keeps the requested target. That is what lets the walker slide along
//! walls. Near corners the approximation can let the walker slightly into the
//! corner geometry.

use bevy::log::debug;
use bevy::math::Vec3;

use crate::level::Level;
use crate::traversal::Supercover;

/// Outcome of one trace. Built fresh per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// A blocking cell was found on the path.
    pub collided: bool,
    /// Where the mover may go: the requested end with blocked axes pinned.
    pub intersection: Vec3,
}

impl TraceResult {
    fn clear(to: Vec3) -> Self {
        Self {
            collided: false,
            intersection: to,
        }
    }
}

impl Level {
    /// Trace a straight move from `from` to `to` (world space) through the grid.
    ///
    /// Both points must be finite. The vertical grid coordinate of each cell
    /// selects the layer (clamped into range); the raster is read at the
    /// cell's `(x, z)`.
    pub fn line_trace(&self, from: Vec3, to: Vec3) -> TraceResult {
        let grid = self.grid();
        let from_cell = grid.world_to_cell(from);
        let to_cell = grid.world_to_cell(to);

        let mut result = TraceResult::clear(to);
        let mut last_safe = self.sample(from_cell.x, from_cell.z);

        // An origin outside the raster or inside a wall has no safe cell to
        // slide around, so the mover stays where it is.
        let from_layer = grid.layer_for(from_cell.y);
        if self.classify(last_safe.as_ref(), from_layer).is_blocking() {
            debug!("line_trace origin {:?} is blocked", from_cell);
            return TraceResult {
                collided: true,
                intersection: from,
            };
        }

        for cell in Supercover::between(from_cell, to_cell) {
            let layer = grid.layer_for(cell.y);
            let sample = self.sample(cell.x, cell.z);
            if !self.classify(sample.as_ref(), layer).is_blocking() {
                last_safe = sample;
                continue;
            }

            result.collided = true;
            let Some(safe) = last_safe else {
                result.intersection = from;
                break;
            };

            let probe_x = if from.x > to.x { safe.x - 1 } else { safe.x + 1 };
            let probe_z = if from.z > to.z { safe.y - 1 } else { safe.y + 1 };

            if self.is_wall(probe_x, safe.y, layer) {
                result.intersection.x = from.x;
            }
            if self.is_wall(safe.x, probe_z, layer) {
                result.intersection.z = from.z;
            }
            debug!(
                "line_trace blocked at {:?}, safe cell ({}, {}), intersection {:?}",
                cell, safe.x, safe.y, result.intersection
            );
            break;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::tests::level_from_rows;

    #[test]
    fn test_open_path_is_unchanged() {
        let level = level_from_rows(&[".....", ".....", "....."], Vec3::ONE);
        let to = Vec3::new(3.2, 0.0, 1.7);
        let result = level.line_trace(Vec3::new(1.0, 0.0, 1.0), to);
        assert!(!result.collided);
        assert_eq!(result.intersection, to);
    }

    #[test]
    fn test_wall_on_boundary_clamps_x() {
        // Wall column at x = 2 which is also the east edge of the raster.
        let level = level_from_rows(&["..#", "..#", "..#", "..#"], Vec3::ONE);
        let from = Vec3::new(1.5, 0.0, 1.5);
        let result = level.line_trace(from, Vec3::new(2.5, 0.0, 1.5));
        assert!(result.collided);
        assert_eq!(result.intersection.x, 1.5);
        assert_eq!(result.intersection.z, 1.5);
        assert_eq!(result.intersection.y, 0.0);
    }

    #[test]
    fn test_slides_along_wall() {
        // Vertical wall at x = 3.
        let level = level_from_rows(&["...#..", "...#..", "...#..", "...#.."], Vec3::ONE);
        let from = Vec3::new(2.0, 0.0, 1.0);
        let to = Vec3::new(3.2, 0.0, 1.4);
        let result = level.line_trace(from, to);
        assert!(result.collided);
        // X is pinned, Z keeps the requested motion.
        assert_eq!(result.intersection.x, from.x);
        assert_eq!(result.intersection.z, to.z);
    }

    #[test]
    fn test_slides_along_horizontal_wall() {
        let level = level_from_rows(&["....", "....", "####", "...."], Vec3::ONE);
        let from = Vec3::new(1.0, 0.0, 1.0);
        let to = Vec3::new(1.4, 0.0, 2.3);
        let result = level.line_trace(from, to);
        assert!(result.collided);
        assert_eq!(result.intersection.x, to.x);
        assert_eq!(result.intersection.z, from.z);
    }

    #[test]
    fn test_corner_pins_both_axes() {
        let level = level_from_rows(&["....", "..#.", ".##.", "...."], Vec3::ONE);
        let from = Vec3::new(1.0, 0.0, 1.0);
        let to = Vec3::new(2.1, 0.0, 2.1);
        let result = level.line_trace(from, to);
        assert!(result.collided);
        assert_eq!(result.intersection, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_origin_outside_raster_stays_put() {
        let level = level_from_rows(&["...", "..."], Vec3::ONE);
        let from = Vec3::new(-3.0, 0.0, 1.0);
        let result = level.line_trace(from, Vec3::new(1.0, 0.0, 1.0));
        assert!(result.collided);
        assert_eq!(result.intersection, from);
    }

    #[test]
    fn test_leaving_raster_collides() {
        let level = level_from_rows(&["...", "..."], Vec3::ONE);
        let from = Vec3::new(1.0, 0.0, 1.0);
        let result = level.line_trace(from, Vec3::new(1.2, 0.0, 2.6));
        assert!(result.collided);
        assert_eq!(result.intersection.z, from.z);
        assert_eq!(result.intersection.x, 1.2);
    }

    #[test]
    fn test_origin_in_wall_cell_stays_put() {
        // (1.5, 1.5) rounds into the wall column; x = 3 beyond it is open.
        let level = level_from_rows(&["..#..", "..#..", "..#..", "..#.."], Vec3::ONE);
        let from = Vec3::new(1.5, 0.0, 1.5);
        let result = level.line_trace(from, Vec3::new(2.5, 0.0, 1.5));
        assert!(result.collided);
        assert_eq!(result.intersection.x, 1.5);
        assert_eq!(result.intersection.z, 1.5);
    }

    #[test]
    fn test_first_blocking_cell_wins() {
        // Path cells: (0,0) (1,1) (2,1) (3,2) (4,2). The first wall at (2,1)
        // pins only x. Resolving around the second wall at (4,2) would also pin
        // z, because (3,3) is off the raster.
        let level = level_from_rows(&[".....", "..#..", "....#"], Vec3::ONE);
        let result = level.line_trace(Vec3::ZERO, Vec3::new(4.0, 0.0, 2.0));
        assert!(result.collided);
        assert_eq!(result.intersection, Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_cell_size_scales_lookup() {
        // Cells are 2 units wide, so x = 4.2 maps into the wall at cell 2.
        let level = level_from_rows(&["..#", "..#"], Vec3::splat(2.0));
        let from = Vec3::new(1.8, 0.0, 1.0);
        let blocked = level.line_trace(from, Vec3::new(4.2, 0.0, 1.0));
        assert!(blocked.collided);
        assert_eq!(blocked.intersection.x, from.x);

        let clear = level.line_trace(from, Vec3::new(2.6, 0.0, 1.0));
        assert!(!clear.collided);
    }

    #[test]
    fn test_stationary_in_open_cell() {
        let level = level_from_rows(&["#.#"], Vec3::ONE);
        let p = Vec3::new(1.0, 0.0, 0.0);
        let result = level.line_trace(p, p);
        assert!(!result.collided);
        assert_eq!(result.intersection, p);
    }
}
