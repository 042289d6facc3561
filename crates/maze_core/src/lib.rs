//! Grid world model and movement kernel for the maze walker.
//!
//! This crate provides:
//! - Cell codecs turning raster channels into cell type flags
//! - Grid dimensions and world <-> grid mapping
//! - 3D line supercover traversal
//! - Line-trace collision with per-axis wall sliding
//! - A contact-driven movement controller
//! - Level and game configuration loading

pub mod cell;
pub mod collision;
pub mod grid;
pub mod level;
pub mod level_image;
pub mod level_io;
pub mod movement;
pub mod traversal;

pub use cell::{
    decode_layered, decode_luminance, decode_packed, encode_layered, encode_packed, CellEncoding,
    CellType, PackedCell,
};
pub use collision::TraceResult;
pub use grid::Grid;
pub use level::{CellFaces, Level};
pub use level_image::{LevelImage, PixelSample};
pub use level_io::{
    build_level, load_game_config, load_level, GameConfig, LevelConfig, LevelError, LevelResult,
    PhysicsConfig, PlayerConfig,
};
pub use movement::{BodyId, ContactEvent, MovementConfig, MovementController, PhysicsBody};
pub use traversal::{trace_cells, Supercover};
