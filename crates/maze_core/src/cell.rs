//! Cell type flags and the raster channel encodings that produce them.
//!
//! A maze level is a raster where every pixel describes one grid column. Each
//! vertical layer of that column reads one color channel (R, G, B, A for layers
//! 0..3) and decodes it into a [`CellType`] bitset.
//!
//! ## Encodings
//!
//! Exactly one [`CellEncoding`] is active per level:
//!
//! ```text
//! Layered   255 = BLOCK, bit0 = FLOOR, bit1 = CEILING, >= 4 with both = MESH_NEEDED
//! Packed    0-7 flag bits (area/floor/ceil), 8-255 packed (area, floor, ceil) ids
//! Luminance R, G and B all < 128 = BLOCK, anything else is an open room
//! ```
//!
//! A missing sample (outside the raster) is always [`CellType::BOUNDS`].
//!
//! All functions here are pure and can be called from any thread.

use serde::{Deserialize, Serialize};

use crate::level_image::PixelSample;

/// Bitset describing what a single cell contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellType(pub u8);

impl CellType {
    /// Open space with no surfaces.
    pub const EMPTY: Self = Self(0);

    /// Full solid block (a wall).
    pub const BLOCK: Self = Self(1 << 0);

    /// Walkable floor surface at the bottom of the cell.
    pub const FLOOR: Self = Self(1 << 1);

    /// Ceiling surface at the top of the cell.
    pub const CEILING: Self = Self(1 << 2);

    /// Outside the raster. Behaves exactly like [`CellType::BLOCK`].
    pub const BOUNDS: Self = Self(1 << 3);

    /// Interior geometry must be generated by the mesh builder.
    pub const MESH_NEEDED: Self = Self(1 << 4);

    /// Check if all flags in `other` are set.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flag in `other` is set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Whether movement through this cell is blocked (wall or out of bounds).
    #[inline]
    pub fn is_blocking(self) -> bool {
        self.intersects(Self::BLOCK.union(Self::BOUNDS))
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CellType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for CellType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// How a level raster's channels map to cell types.
///
/// Chosen once per level; the decoders are never mixed within one raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellEncoding {
    /// One channel per layer, see [`decode_layered`].
    Layered,
    /// One channel per layer holding a packed (area, floor, ceil) byte, see [`decode_packed`].
    Packed,
    /// Dark pixels are walls, see [`decode_luminance`].
    #[default]
    Luminance,
}

impl CellEncoding {
    /// Number of layers this encoding can address in a single RGBA raster.
    pub fn max_layers(self) -> usize {
        match self {
            CellEncoding::Layered | CellEncoding::Packed => 4,
            // Every layer reads the same pixel.
            CellEncoding::Luminance => usize::MAX,
        }
    }

    /// Decode a raster sample for the given layer.
    pub fn decode(self, sample: Option<&PixelSample>, layer: usize) -> CellType {
        let Some(sample) = sample else {
            return CellType::BOUNDS;
        };
        match self {
            CellEncoding::Layered => decode_layered(sample.channel(layer)),
            CellEncoding::Packed => decode_packed(sample.channel(layer)).cell_type(),
            CellEncoding::Luminance => decode_luminance(sample),
        }
    }
}

// =============================================================================
// Layered encoding
// =============================================================================

/// Channel value reserved for a full block.
pub const LAYERED_BLOCK: u8 = 255;

const LAYERED_FLOOR_BIT: u8 = 1 << 0;
const LAYERED_CEILING_BIT: u8 = 1 << 1;

/// Values below this only carry the floor/ceiling flags.
pub const LAYERED_FLAG_SPACE: u8 = 4;

/// Decode one channel of the layered encoding.
///
/// A full block short-circuits: it never also reports floor or ceiling.
pub fn decode_layered(value: u8) -> CellType {
    if value == LAYERED_BLOCK {
        return CellType::BLOCK;
    }

    let mut cell = CellType::EMPTY;
    if value & LAYERED_FLOOR_BIT != 0 {
        cell |= CellType::FLOOR;
    }
    if value & LAYERED_CEILING_BIT != 0 {
        cell |= CellType::CEILING;
    }
    if value >= LAYERED_FLAG_SPACE && cell.contains(CellType::FLOOR | CellType::CEILING) {
        cell |= CellType::MESH_NEEDED;
    }
    cell
}

/// Encode a cell type into one channel of the layered encoding.
///
/// `MESH_NEEDED` is only representable together with both FLOOR and CEILING;
/// `BOUNDS` is never stored in a raster. Returns `None` for those inputs.
pub fn encode_layered(cell: CellType) -> Option<u8> {
    if cell.contains(CellType::BOUNDS) {
        return None;
    }
    if cell.contains(CellType::BLOCK) {
        return (cell == CellType::BLOCK).then_some(LAYERED_BLOCK);
    }

    let mut value = 0;
    if cell.contains(CellType::FLOOR) {
        value |= LAYERED_FLOOR_BIT;
    }
    if cell.contains(CellType::CEILING) {
        value |= LAYERED_CEILING_BIT;
    }
    if cell.contains(CellType::MESH_NEEDED) {
        if value != LAYERED_FLOOR_BIT | LAYERED_CEILING_BIT {
            return None;
        }
        value += LAYERED_FLAG_SPACE;
    }
    Some(value)
}

// =============================================================================
// Packed (legacy) encoding
// =============================================================================

/// First value of the packed tile region. Values below are single flag bits.
pub const PACKED_TILE_BASE: u8 = 8;

/// Area id that marks a wall.
pub const PACKED_AREA_WALL: u8 = 1;

/// Decoded form of a packed byte: area (wall), floor and ceiling ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedCell {
    /// Area id, 0-15 (0 none, 1 wall, higher ids are special volumes).
    pub wall: u8,
    /// Floor id, 0-7.
    pub floor: u8,
    /// Ceiling id, 0-1 in the tile region.
    pub ceil: u8,
}

impl PackedCell {
    pub fn new(wall: u8, floor: u8, ceil: u8) -> Self {
        Self { wall, floor, ceil }
    }

    /// Collapse the ids into cell type flags.
    pub fn cell_type(self) -> CellType {
        if self.wall == PACKED_AREA_WALL {
            return CellType::BLOCK;
        }

        let mut cell = CellType::EMPTY;
        if self.floor > 0 {
            cell |= CellType::FLOOR;
        }
        if self.ceil > 0 {
            cell |= CellType::CEILING;
        }
        if self.wall > 1 || self.floor > 1 || self.ceil > 1 {
            cell |= CellType::MESH_NEEDED;
        }
        cell
    }
}

/// Decode a packed byte.
pub fn decode_packed(value: u8) -> PackedCell {
    if value < PACKED_TILE_BASE {
        return PackedCell {
            wall: value & 1,
            floor: (value >> 1) & 1,
            ceil: (value >> 2) & 1,
        };
    }

    let v = value - PACKED_TILE_BASE;
    PackedCell {
        wall: v % 16,
        floor: (v / 16) % 8,
        ceil: v / 128,
    }
}

/// Encode ids into a packed byte.
///
/// Triples whose ids are all 0 or 1 use the flag region; anything else goes
/// through the tile region. Returns `None` when the triple does not fit in a
/// byte (wall >= 16, floor >= 8, or the tile value overflows 255).
pub fn encode_packed(cell: PackedCell) -> Option<u8> {
    let PackedCell { wall, floor, ceil } = cell;
    if wall <= 1 && floor <= 1 && ceil <= 1 {
        return Some(wall | (floor << 1) | (ceil << 2));
    }
    if wall >= 16 || floor >= 8 {
        return None;
    }

    let value = PACKED_TILE_BASE as u32 + wall as u32 + floor as u32 * 16 + ceil as u32 * 128;
    u8::try_from(value).ok()
}

// =============================================================================
// Luminance encoding
// =============================================================================

/// Channels below this value on all of R, G and B mark a wall.
pub const LUMINANCE_WALL_THRESHOLD: u8 = 128;

/// Decode a pixel where dark means wall and anything else is an open room.
pub fn decode_luminance(sample: &PixelSample) -> CellType {
    let dark = sample.r < LUMINANCE_WALL_THRESHOLD
        && sample.g < LUMINANCE_WALL_THRESHOLD
        && sample.b < LUMINANCE_WALL_THRESHOLD;
    if dark {
        CellType::BLOCK
    } else {
        CellType::FLOOR | CellType::CEILING
    }
}
