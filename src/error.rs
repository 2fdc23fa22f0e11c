// Error types for the world model
//
// Nothing here is fatal to the simulation. The tick loop logs these and
// skips the object for the tick.

use thiserror::Error;

use crate::utility::ChunkCoord;

/// Spatial index and object lifecycle failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("chunk pool is full ({capacity} chunks)")]
    ChunkPoolFull { capacity: usize },

    #[error("chunk {coord} is full ({capacity} objects)")]
    ChunkFull { coord: ChunkCoord, capacity: usize },

    #[error("object store is full ({capacity} objects)")]
    StoreFull { capacity: usize },

    #[error("object handle is stale or unknown")]
    ObjectNotFound,

    #[error("object {id} is not in any chunk")]
    NotInChunk { id: i32 },

    #[error("unknown prefab '{0}'")]
    UnknownPrefab(String),

    #[error("object {id} is not {expected}")]
    WrongVariant { id: i32, expected: &'static str },

    #[error("world has no player")]
    NoPlayer,

    #[error("inventory is full")]
    InventoryFull,

    #[error("inventory slot {0} is empty or out of range")]
    EmptySlot(usize),

    #[error("position is {distance} cells away, limit is {limit}")]
    OutOfReach { distance: u32, limit: u32 },

    #[error("target cell is blocked")]
    Blocked,
}

/// Pathfinder failures. Callers treat both as "no move this tick".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("no path to goal")]
    NoPath,

    #[error("node budget of {max_nodes} exhausted")]
    BudgetExhausted { max_nodes: usize },
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
