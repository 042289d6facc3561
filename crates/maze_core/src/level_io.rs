//! Level and game configuration loading.
//!
//! A game is described by a JSON file:
//!
//! ```json
//! {
//!   "level": { "image": "maze.png", "cell_size": [2.0, 2.0, 2.0], "layer_count": 1, "encoding": "luminance" },
//!   "movement": { "max_speed": 5.0, "acceleration": 1.0 },
//!   "player": { "spawn_cell": [1, 1] },
//!   "physics": { "gravity": [0.0, -9.82, 0.0] }
//! }
//! ```
//!
//! Every section and field is optional. Relative image paths resolve against
//! the directory holding the config file.
//!
//! # Example
//!
//! ```ignore
//! use maze_core::{load_game_config, load_level};
//!
//! let config = load_game_config("assets/maze.json")?;
//! let level = load_level(&config.level)?;
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::cell::CellEncoding;
use crate::grid::Grid;
use crate::level::Level;
use crate::level_image::LevelImage;
use crate::movement::MovementConfig;

/// Errors that can occur while loading a level or its configuration.
#[derive(Debug)]
pub enum LevelError {
    /// File system error
    Io(std::io::Error),
    /// Image decoding error
    Image(image::ImageError),
    /// JSON deserialization error
    Json(serde_json::Error),
    /// Raster with a zero dimension
    InvalidDimensions { width: u32, height: u32 },
    /// Raw buffer length does not match width * height * 4
    BufferSize { expected: usize, actual: usize },
    /// More layers than the encoding can address
    LayerCount {
        requested: usize,
        encoding: CellEncoding,
    },
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelError::Io(e) => write!(f, "IO error: {}", e),
            LevelError::Image(e) => write!(f, "Image error: {}", e),
            LevelError::Json(e) => write!(f, "JSON error: {}", e),
            LevelError::InvalidDimensions { width, height } => {
                write!(f, "Invalid raster dimensions: {}x{}", width, height)
            }
            LevelError::BufferSize { expected, actual } => write!(
                f,
                "Raster buffer has {} bytes, expected {}",
                actual, expected
            ),
            LevelError::LayerCount {
                requested,
                encoding,
            } => write!(
                f,
                "{} layers requested but {:?} encoding supports at most {}",
                requested,
                encoding,
                encoding.max_layers()
            ),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::Io(e)
    }
}

impl From<image::ImageError> for LevelError {
    fn from(e: image::ImageError) -> Self {
        LevelError::Image(e)
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Json(e)
    }
}

/// Result type for level loading.
pub type LevelResult<T> = Result<T, LevelError>;

/// How a level is built from its raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Path of the source raster.
    pub image: PathBuf,
    /// World-space size of one cell.
    pub cell_size: [f32; 3],
    /// Vertical layers, each read from one channel.
    pub layer_count: usize,
    /// Channel encoding used by this level.
    pub encoding: CellEncoding,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from("maze.png"),
            cell_size: [2.0, 2.0, 2.0],
            layer_count: 1,
            encoding: CellEncoding::default(),
        }
    }
}

impl LevelConfig {
    pub fn cell_size(&self) -> Vec3 {
        Vec3::from_array(self.cell_size)
    }
}

/// Player actor shape and spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Raster cell `(x, y)` the player starts in.
    pub spawn_cell: [i32; 2],
    /// Capsule radius.
    pub radius: f32,
    /// Capsule cylinder height (excluding the caps).
    pub height: f32,
    /// Body mass in kg.
    pub mass: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn_cell: [1, 1],
            radius: 0.25,
            height: 0.5,
            mass: 60.0,
        }
    }
}

/// World physics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
        }
    }
}

impl PhysicsConfig {
    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}

/// Top-level game configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub level: LevelConfig,
    pub movement: MovementConfig,
    pub player: PlayerConfig,
    pub physics: PhysicsConfig,
}

/// Load a game configuration from a JSON file.
///
/// A relative `level.image` is rewritten to be relative to the config file.
pub fn load_game_config<P: AsRef<Path>>(path: P) -> LevelResult<GameConfig> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut config: GameConfig = serde_json::from_reader(reader)?;

    if config.level.image.is_relative() {
        if let Some(dir) = path.parent() {
            config.level.image = dir.join(&config.level.image);
        }
    }
    Ok(config)
}

/// Decode the configured raster and build a level from it.
pub fn load_level(config: &LevelConfig) -> LevelResult<Level> {
    let image = LevelImage::open(&config.image)?;
    let level = build_level(config, image)?;
    info!(
        "Loaded level {} ({}x{}, {} layer(s), {:?}, {} blocking cells)",
        config.image.display(),
        level.grid().width,
        level.grid().height,
        level.grid().layer_count,
        level.encoding(),
        level.blocking_cells().count()
    );
    Ok(level)
}

/// Build a level from an already decoded raster.
pub fn build_level(config: &LevelConfig, image: LevelImage) -> LevelResult<Level> {
    let encoding = config.encoding;
    if config.layer_count > encoding.max_layers() {
        return Err(LevelError::LayerCount {
            requested: config.layer_count,
            encoding,
        });
    }
    if encoding == CellEncoding::Luminance && config.layer_count > 1 {
        warn!(
            "Luminance encoding reads the same pixel for all {} layers",
            config.layer_count
        );
    }

    let grid = Grid::new(
        image.width(),
        image.height(),
        config.cell_size(),
        config.layer_count,
    );
    Ok(Level::new(grid, image, encoding))
}
