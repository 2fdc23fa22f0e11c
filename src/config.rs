/// Centralized configuration for the world simulation
///
/// Compile-time limits live in the constant modules below. They size the
/// fixed-capacity pools and the persisted chunk record, so changing one is
/// a save-format change.
///
/// `WorldConfig` carries the values a host may tune at startup. It is read
/// from JSON and falls back to the constants for anything left out.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Map and chunk limits
pub mod map {
    /// Chunk edge length in cells
    pub const CHUNK_SIZE: i32 = 16;

    /// Object references a single chunk can hold
    pub const CHUNK_MAX_OBJECTS: usize = 256;

    /// Chunks in the pool (16 x 16 chunks)
    pub const MAX_CHUNKS: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize; // 256

    /// Most objects returned for a single cell query
    pub const MAX_LAYERS: usize = 8;

    /// Objects alive at once across the whole world
    pub const MAX_OBJECTS: usize = 4096;

    /// Visible window around the camera chunk
    pub const VISIBLE_CHUNKS_X: i32 = 2;
    pub const VISIBLE_CHUNKS_Y: i32 = 1;
}

/// Pathfinding configuration constants
pub mod pathfinding {
    /// Node budget for a single search
    pub const MAX_NODES: usize = 256;

    /// Longest path `full_path` callers normally ask for
    pub const MAX_PATH_LENGTH: usize = 64;
}

/// AI and cadence tuning
pub mod ai {
    /// Movement delay at speed 0
    pub const BASE_MOVEMENT_DELAY_MS: u64 = 1000;

    /// Floor for the movement delay of very fast entities
    pub const MIN_MOVEMENT_DELAY_MS: u64 = 50;

    /// Chasers drop the target beyond this many cells
    pub const GIVE_UP_DISTANCE: i32 = 5;

    /// Extra cells a chaser may stray past its patrol radius
    pub const PATROL_MARGIN: i32 = 2;

    /// Each 10 points of dexterity shave this much off the attack delay
    pub const DEXTERITY_REDUCTION_STEP: f32 = 0.05;

    /// Attack delay never drops below this fraction of attack speed
    pub const MIN_ATTACK_REDUCTION: f32 = 0.5;
}

/// Player inventory and interaction
pub mod player {
    /// Inventory slots
    pub const MAX_ITEMS: usize = 8;

    /// Manhattan distance for picking up or dropping items
    pub const ITEM_PICKUP_RANGE: u32 = 5;
}

/// Render contract limits
pub mod render {
    /// Sprites queued per tick
    pub const SPRITE_MAX_COUNT: usize = 256;
}

/// Runtime-tunable world settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub chunk_size: i32,
    pub max_chunks: usize,
    pub chunk_max_objects: usize,
    pub max_objects: usize,
    pub path_max_nodes: usize,
    pub base_movement_delay_ms: u64,
    pub min_movement_delay_ms: u64,
    pub give_up_distance: i32,
    pub patrol_margin: i32,
    pub visible_chunks_x: i32,
    pub visible_chunks_y: i32,
    pub sprite_capacity: usize,
    pub item_pickup_range: u32,
    /// Seed for patrol randomness. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    pub save_path: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: map::CHUNK_SIZE,
            max_chunks: map::MAX_CHUNKS,
            chunk_max_objects: map::CHUNK_MAX_OBJECTS,
            max_objects: map::MAX_OBJECTS,
            path_max_nodes: pathfinding::MAX_NODES,
            base_movement_delay_ms: ai::BASE_MOVEMENT_DELAY_MS,
            min_movement_delay_ms: ai::MIN_MOVEMENT_DELAY_MS,
            give_up_distance: ai::GIVE_UP_DISTANCE,
            patrol_margin: ai::PATROL_MARGIN,
            visible_chunks_x: map::VISIBLE_CHUNKS_X,
            visible_chunks_y: map::VISIBLE_CHUNKS_Y,
            sprite_capacity: render::SPRITE_MAX_COUNT,
            item_pickup_range: player::ITEM_PICKUP_RANGE,
            rng_seed: None,
            save_path: "chunks.bin".to_string(),
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "world config loaded");
        Ok(config)
    }

    /// Reject values the fixed-capacity pools cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }
        if self.max_chunks == 0 || self.max_chunks > u16::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "max_chunks must be in 1..={}, got {}",
                u16::MAX,
                self.max_chunks
            )));
        }
        // Chunk records are persisted with a fixed object array
        if self.chunk_max_objects == 0 || self.chunk_max_objects > map::CHUNK_MAX_OBJECTS {
            return Err(ConfigError::Invalid(format!(
                "chunk_max_objects must be in 1..={}, got {}",
                map::CHUNK_MAX_OBJECTS,
                self.chunk_max_objects
            )));
        }
        if self.max_objects == 0 {
            return Err(ConfigError::Invalid("max_objects must be non-zero".to_string()));
        }
        if self.path_max_nodes == 0 {
            return Err(ConfigError::Invalid("path_max_nodes must be non-zero".to_string()));
        }
        if self.min_movement_delay_ms > self.base_movement_delay_ms {
            return Err(ConfigError::Invalid(
                "min_movement_delay_ms exceeds base_movement_delay_ms".to_string(),
            ));
        }
        if self.visible_chunks_x < 0 || self.visible_chunks_y < 0 {
            return Err(ConfigError::Invalid("visible chunk radius must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.path_max_nodes, 256);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json_str(r#"{ "rng_seed": 7, "give_up_distance": 8 }"#).unwrap();
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.give_up_distance, 8);
        assert_eq!(config.chunk_max_objects, map::CHUNK_MAX_OBJECTS);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "chunk_size": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "chunk_max_objects": 1000 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(WorldConfig::from_json_str("{ nope"), Err(ConfigError::Json(_))));
    }
}
