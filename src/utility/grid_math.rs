/// Integer grid coordinates and the distance helpers shared by the
/// spatial index, the pathfinder and the AI.
///
/// World space is unbounded: positions are signed and never wrap. A
/// `GridPosition` is a single cell (x, y, z) where z selects the floor.
/// A `ChunkCoord` is the coarse bucket a position falls into.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Planar part of the position (pathfinding works per floor)
    #[inline]
    pub fn xy(&self) -> GridPos2 {
        GridPos2::new(self.x, self.y)
    }

    /// Same floor, shifted by a planar step
    #[inline]
    pub fn offset(&self, step: GridPos2) -> Self {
        Self::new(self.x + step.x, self.y + step.y, self.z)
    }

    #[inline]
    pub fn with_z(&self, z: i32) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Build a position on floor `z` from a planar coordinate
    #[inline]
    pub fn from_xy(pos: GridPos2, z: i32) -> Self {
        Self::new(pos.x, pos.y, z)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Planar cell coordinate, also used for single-step directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos2 {
    pub x: i32,
    pub y: i32,
}

impl GridPos2 {
    pub const ZERO: GridPos2 = GridPos2 { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    #[inline]
    pub fn offset(&self, step: GridPos2) -> GridPos2 {
        GridPos2::new(self.x + step.x, self.y + step.y)
    }

    #[inline]
    pub fn delta_to(&self, other: GridPos2) -> GridPos2 {
        GridPos2::new(other.x - self.x, other.y - self.y)
    }

    /// The four axis-aligned neighbours, in the order the pathfinder expands them
    #[inline]
    pub fn neighbors4(&self) -> [GridPos2; 4] {
        [
            GridPos2::new(self.x + 1, self.y),
            GridPos2::new(self.x - 1, self.y),
            GridPos2::new(self.x, self.y + 1),
            GridPos2::new(self.x, self.y - 1),
        ]
    }
}

impl fmt::Display for GridPos2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Coarse bucket coordinate (one chunk per coordinate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Convert a cell position to the chunk containing it.
///
/// Every axis is floor-divided, so x = -1 with a chunk size of 16 lands in
/// chunk -1, not 0.
#[inline]
pub fn chunk_coord_of(pos: GridPosition, chunk_size: i32) -> ChunkCoord {
    ChunkCoord {
        x: pos.x.div_euclid(chunk_size),
        y: pos.y.div_euclid(chunk_size),
        z: pos.z.div_euclid(chunk_size),
    }
}

/// Manhattan distance |dx| + |dy|
#[inline]
pub fn manhattan(a: GridPos2, b: GridPos2) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Squared Euclidean distance in cells
#[inline]
pub fn distance_squared(a: GridPos2, b: GridPos2) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Euclidean distance truncated toward zero (used for attack range)
#[inline]
pub fn distance_truncated(a: GridPos2, b: GridPos2) -> i32 {
    (distance_squared(a, b) as f64).sqrt() as i32
}

/// Whether `pos` lies inside the circle of `radius` cells around `center`
#[inline]
pub fn is_in_grid_radius(center: GridPos2, pos: GridPos2, radius: i32) -> bool {
    let r = radius.max(0) as i64;
    distance_squared(center, pos) <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_floors_negative_positions() {
        assert_eq!(chunk_coord_of(GridPosition::new(-1, 0, 0), 16), ChunkCoord::new(-1, 0, 0));
        assert_eq!(chunk_coord_of(GridPosition::new(-16, -17, 0), 16), ChunkCoord::new(-1, -2, 0));
        assert_eq!(chunk_coord_of(GridPosition::new(15, 16, -1), 16), ChunkCoord::new(0, 1, -1));
    }

    #[test]
    fn test_chunk_coord_matches_floor_division() {
        for p in -40..40 {
            let expected = (p as f64 / 16.0).floor() as i32;
            let coord = chunk_coord_of(GridPosition::new(p, p, p), 16);
            assert_eq!(coord, ChunkCoord::new(expected, expected, expected), "p = {}", p);
        }
    }

    #[test]
    fn test_distances() {
        let a = GridPos2::new(0, 0);
        let b = GridPos2::new(3, -4);
        assert_eq!(manhattan(a, b), 7);
        assert_eq!(distance_squared(a, b), 25);
        assert_eq!(distance_truncated(a, b), 5);
        assert_eq!(distance_truncated(a, GridPos2::new(1, 1)), 1);
    }

    #[test]
    fn test_grid_radius() {
        let origin = GridPos2::new(2, 2);
        assert!(is_in_grid_radius(origin, GridPos2::new(5, 2), 3));
        assert!(!is_in_grid_radius(origin, GridPos2::new(5, 3), 3));
        assert!(is_in_grid_radius(origin, origin, 0));
    }
}
