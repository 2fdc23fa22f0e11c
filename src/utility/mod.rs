// Shared helpers: grid math and simulation timing

pub mod grid_math;
pub mod stopwatch;

pub use grid_math::{
    chunk_coord_of, distance_squared, distance_truncated, is_in_grid_radius, manhattan, ChunkCoord,
    GridPos2, GridPosition,
};
pub use stopwatch::{SimClock, Stopwatch};
