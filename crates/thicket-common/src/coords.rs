//! Coordinate types for pixel and tile positions.
//!
//! World positions are `glam::Vec2` in pixels. Tiles are square and addressed
//! by integer column/row; the tile size is a property of the map.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tile coordinate (column, row) in a tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile containing a pixel position.
    ///
    /// Negative positions map to negative tiles (floor division), so a pixel
    /// just left of the map lands outside it rather than in column 0.
    #[must_use]
    pub fn containing(pixel: Vec2, tile_size: f32) -> Self {
        Self {
            x: (pixel.x / tile_size).floor() as i32,
            y: (pixel.y / tile_size).floor() as i32,
        }
    }
}

/// Converts a pixel length into tile units.
#[must_use]
pub fn pixels_to_tiles(pixels: f32, tile_size: f32) -> f32 {
    pixels / tile_size
}
