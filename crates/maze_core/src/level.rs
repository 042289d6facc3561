//! The decoded maze: grid, raster and active cell encoding.
//!
//! Cells are not stored. Every query reads the raster pixel and runs it through
//! the level's [`CellEncoding`], so a `Level` is just the immutable inputs.
//! It is shared read-only by every actor once built.

use bevy::math::IVec3;
use bevy::prelude::Resource;

use crate::cell::{CellEncoding, CellType};
use crate::grid::Grid;
use crate::level_image::{LevelImage, PixelSample};

/// A built maze level.
#[derive(Resource, Debug, Clone)]
pub struct Level {
    grid: Grid,
    image: LevelImage,
    encoding: CellEncoding,
}

impl Level {
    pub fn new(grid: Grid, image: LevelImage, encoding: CellEncoding) -> Self {
        Self {
            grid,
            image,
            encoding,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn image(&self) -> &LevelImage {
        &self.image
    }

    pub fn encoding(&self) -> CellEncoding {
        self.encoding
    }

    /// Raster sample for a horizontal grid coordinate, `None` outside.
    #[inline]
    pub fn sample(&self, x: i32, z: i32) -> Option<PixelSample> {
        self.image.sample(x, z)
    }

    /// Decode a (possibly missing) sample for a layer.
    #[inline]
    pub fn classify(&self, sample: Option<&PixelSample>, layer: usize) -> CellType {
        self.encoding.decode(sample, layer)
    }

    /// Cell type at a horizontal grid coordinate and layer.
    #[inline]
    pub fn cell_type(&self, x: i32, z: i32, layer: usize) -> CellType {
        self.classify(self.sample(x, z).as_ref(), layer)
    }

    /// Cell type at a full grid coordinate; `cell.y` is clamped to a layer.
    #[inline]
    pub fn cell_type_at(&self, cell: IVec3) -> CellType {
        self.cell_type(cell.x, cell.z, self.grid.layer_for(cell.y))
    }

    /// Whether a horizontal grid coordinate blocks movement on a layer.
    #[inline]
    pub fn is_wall(&self, x: i32, z: i32, layer: usize) -> bool {
        self.cell_type(x, z, layer).is_blocking()
    }

    /// In-bounds cells (`x`, `layer`, `z`) that are solid blocks.
    pub fn blocking_cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        let layers = self.grid.layer_count;
        self.image.pixels().flat_map(move |px| {
            (0..layers).filter_map(move |layer| {
                self.classify(Some(&px), layer)
                    .is_blocking()
                    .then_some(IVec3::new(px.x, layer as i32, px.y))
            })
        })
    }

    /// Faces the mesh builder must emit for one cell.
    ///
    /// Blocking cells need nothing. An open cell needs a wall face toward
    /// every blocking horizontal neighbour (bounds included), a floor face
    /// when the layer below blocks or the cell has a FLOOR, and a ceiling face
    /// when the layer above blocks or the cell has a CEILING. Layers outside
    /// the grid count as bounds.
    pub fn needed_faces(&self, x: i32, z: i32, layer: usize) -> CellFaces {
        let cell = self.cell_type(x, z, layer);
        if cell.is_blocking() {
            return CellFaces::NONE;
        }

        let mut faces = CellFaces::NONE;
        let sides = [
            (CellFaces::EAST, x + 1, z),
            (CellFaces::WEST, x - 1, z),
            (CellFaces::SOUTH, x, z + 1),
            (CellFaces::NORTH, x, z - 1),
        ];
        for (face, nx, nz) in sides {
            if self.is_wall(nx, nz, layer) {
                faces |= face;
            }
        }

        let below_blocks = layer == 0 || self.is_wall(x, z, layer - 1);
        if below_blocks || cell.contains(CellType::FLOOR) {
            faces |= CellFaces::FLOOR;
        }
        let above_blocks = layer + 1 >= self.grid.layer_count || self.is_wall(x, z, layer + 1);
        if above_blocks || cell.contains(CellType::CEILING) {
            faces |= CellFaces::CEILING;
        }
        faces
    }
}

/// Bitset of cell faces handed to the mesh builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellFaces(pub u8);

impl CellFaces {
    pub const NONE: Self = Self(0);
    /// -Z
    pub const NORTH: Self = Self(1 << 0);
    /// +Z
    pub const SOUTH: Self = Self(1 << 1);
    /// +X
    pub const EAST: Self = Self(1 << 2);
    /// -X
    pub const WEST: Self = Self(1 << 3);
    /// -Y
    pub const FLOOR: Self = Self(1 << 4);
    /// +Y
    pub const CEILING: Self = Self(1 << 5);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl std::ops::BitOr for CellFaces {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CellFaces {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
