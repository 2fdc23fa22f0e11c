// Character-grid map loading
//
// Row index is y, column index is x, everything lands on floor 0.

use crate::error::WorldError;
use crate::utility::GridPosition;
use crate::world::prefabs::names;
use crate::world::World;

/// The built-in 7x7 starting room
pub const DEMO_MAP: [&str; 7] = [
    "1111110",
    "1000010",
    "1000r10",
    "1000010",
    "10p0010",
    "1111110",
    "0000000",
];

/// Prefab spawned for a map character
pub fn prefab_for(tile: char) -> Option<&'static str> {
    match tile {
        '0' => Some(names::EMPTY_TILE),
        '1' => Some(names::WALL_TILE),
        'p' => Some(names::PLAYER),
        'r' => Some(names::ENEMY_RAT),
        'i' => Some(names::ITEM_SWORD),
        _ => None,
    }
}

/// Spawn one object per recognised character. Returns the number spawned.
pub fn load_char_map<S: AsRef<str>>(world: &mut World, rows: &[S]) -> Result<usize, WorldError> {
    let mut spawned = 0;
    for (y, row) in rows.iter().enumerate() {
        for (x, tile) in row.as_ref().chars().enumerate() {
            let Some(prefab) = prefab_for(tile) else {
                tracing::warn!(%tile, x, y, "unknown map character");
                continue;
            };
            world.spawn(prefab, GridPosition::new(x as i32, y as i32, 0))?;
            spawned += 1;
        }
    }
    tracing::info!(spawned, rows = rows.len(), "map loaded");
    Ok(spawned)
}
