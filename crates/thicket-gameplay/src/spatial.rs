//! Spatial queries: distances, ranges, and the tile collision oracle.
//!
//! Positions are top-left corners of an entity's footprint, in pixels.
//! The collision oracle answers whether a footprint placed at a position
//! overlaps only walkable tiles. Anything outside the map counts as solid.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thicket_common::TileCoord;
use thiserror::Error;

/// Errors produced while building a tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// The layout has no rows or an empty first row
    #[error("layout is empty")]
    Empty,
    /// A row's length differs from the first row
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Row index
        row: usize,
        /// Columns in the first row
        expected: usize,
        /// Columns in this row
        found: usize,
    },
    /// Unknown tile glyph
    #[error("unknown tile glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph {
        /// The glyph
        glyph: char,
        /// Column
        x: usize,
        /// Row
        y: usize,
    },
    /// Tile size must be positive and finite
    #[error("invalid tile size {0}")]
    InvalidTileSize(f32),
}

/// Width and height of an entity's collision box, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Footprint {
    /// Creates a new footprint.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the footprint as a vector.
    #[must_use]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Collision oracle over a tile map.
///
/// The engine only ever reads from the map.
pub trait CollisionMap {
    /// Returns whether a `width` x `height` box with its top-left corner at
    /// `(x, y)` fits entirely on walkable tiles.
    fn can_move_to(&self, x: f32, y: f32, width: f32, height: f32) -> bool;

    /// Map width in pixels.
    fn width(&self) -> f32;

    /// Map height in pixels.
    fn height(&self) -> f32;

    /// Edge length of one tile in pixels.
    fn tile_size(&self) -> f32;

    /// Convenience wrapper over [`CollisionMap::can_move_to`].
    fn allows(&self, position: Vec2, footprint: Footprint) -> bool {
        self.can_move_to(position.x, position.y, footprint.width, footprint.height)
    }
}

/// Euclidean distance between two positions in pixels.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Distance between two positions in tile units.
#[must_use]
pub fn tile_distance(a: Vec2, b: Vec2, tile_size: f32) -> f32 {
    thicket_common::pixels_to_tiles(distance(a, b), tile_size)
}

/// Returns whether `b` lies within `range` pixels of `a` (inclusive).
#[must_use]
pub fn within_range(a: Vec2, b: Vec2, range: f32) -> bool {
    distance(a, b) <= range
}

/// Rectangular grid of solid/open tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_size: f32,
    solid: Vec<bool>,
}

impl TileGrid {
    /// Glyph for a solid tile in text layouts.
    pub const WALL: char = '#';
    /// Glyph for a walkable tile in text layouts.
    pub const FLOOR: char = '.';

    /// Creates a grid with every tile walkable.
    pub fn open(columns: u32, rows: u32, tile_size: f32) -> Result<Self, LayoutError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(LayoutError::InvalidTileSize(tile_size));
        }
        if columns == 0 || rows == 0 {
            return Err(LayoutError::Empty);
        }
        Ok(Self {
            columns,
            rows,
            tile_size,
            solid: vec![false; columns as usize * rows as usize],
        })
    }

    /// Builds a grid from text rows using `#` for walls and `.` for floor.
    pub fn from_layout<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, LayoutError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(LayoutError::InvalidTileSize(tile_size));
        }
        let expected = rows.first().map_or(0, |r| r.as_ref().chars().count());
        if expected == 0 {
            return Err(LayoutError::Empty);
        }

        let mut solid = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row: y,
                    expected,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                match glyph {
                    Self::WALL => solid.push(true),
                    Self::FLOOR => solid.push(false),
                    _ => return Err(LayoutError::UnknownGlyph { glyph, x, y }),
                }
            }
        }

        Ok(Self {
            columns: expected as u32,
            rows: rows.len() as u32,
            tile_size,
            solid,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let in_bounds = tile.x >= 0
            && tile.y >= 0
            && (tile.x as u32) < self.columns
            && (tile.y as u32) < self.rows;
        in_bounds.then(|| tile.y as usize * self.columns as usize + tile.x as usize)
    }

    /// Marks a tile as solid. Out-of-bounds tiles are ignored.
    pub fn set_solid(&mut self, tile: TileCoord, solid: bool) {
        if let Some(i) = self.index(tile) {
            self.solid[i] = solid;
        }
    }

    /// Returns whether a tile is solid. Tiles outside the grid are solid.
    #[must_use]
    pub fn is_solid(&self, tile: TileCoord) -> bool {
        self.index(tile).map_or(true, |i| self.solid[i])
    }
}

impl CollisionMap for TileGrid {
    fn can_move_to(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return false;
        }
        if x < 0.0 || y < 0.0 || x + width > self.width() || y + height > self.height() {
            return false;
        }

        let first = TileCoord::containing(Vec2::new(x, y), self.tile_size);
        // A box whose right edge sits exactly on a tile boundary does not
        // touch the next tile.
        let last_x = (((x + width) / self.tile_size).ceil() as i32 - 1).max(first.x);
        let last_y = (((y + height) / self.tile_size).ceil() as i32 - 1).max(first.y);

        (first.y..=last_y)
            .all(|ty| (first.x..=last_x).all(|tx| !self.is_solid(TileCoord::new(tx, ty))))
    }

    fn width(&self) -> f32 {
        self.columns as f32 * self.tile_size
    }

    fn height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }
}
