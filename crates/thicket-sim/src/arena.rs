//! The built-in arena: a walled room with two pillars and a center block.

use glam::Vec2;
use thicket_gameplay::{LayoutError, NpcManager, NpcResult, Species, TileGrid};
use thicket_common::EntityId;

/// Tile edge length in pixels.
pub const TILE_SIZE: f32 = 16.0;

/// Arena layout, `#` wall and `.` floor.
pub const LAYOUT: [&str; 14] = [
    "########################",
    "#......................#",
    "#......................#",
    "#...####........####...#",
    "#...#..............#...#",
    "#...#..............#...#",
    "#.........######.......#",
    "#.........######.......#",
    "#...#..............#...#",
    "#...#..............#...#",
    "#...####........####...#",
    "#......................#",
    "#......................#",
    "########################",
];

/// One creature per corner.
pub const SPAWNS: [(Species, Vec2); 4] = [
    (Species::Wolf, Vec2::new(32.0, 16.0)),
    (Species::Bear, Vec2::new(320.0, 16.0)),
    (Species::Snake, Vec2::new(32.0, 192.0)),
    (Species::Beetle, Vec2::new(320.0, 192.0)),
];

/// Loop the player walks, inside the pillars.
pub const PATROL: [Vec2; 4] = [
    Vec2::new(88.0, 72.0),
    Vec2::new(280.0, 72.0),
    Vec2::new(280.0, 136.0),
    Vec2::new(88.0, 136.0),
];

/// Builds the collision map.
pub fn build_map() -> Result<TileGrid, LayoutError> {
    TileGrid::from_layout(&LAYOUT, TILE_SIZE)
}

/// Spawns every creature at its corner.
pub fn populate(npcs: &mut NpcManager, map: &TileGrid) -> NpcResult<Vec<EntityId>> {
    SPAWNS
        .iter()
        .map(|&(species, position)| npcs.spawn_checked(species, position, map))
        .collect()
}
