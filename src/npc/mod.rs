pub mod entity;  // Entity data, stats and cadence formulas
pub mod pathfinding;  // Bounded A*
pub mod spawn_manager;  // Spawn, despawn, id assignment
pub mod enemy_ai;  // Patrol / chase / go back
pub mod player;  // Player movement, interaction, inventory

pub use entity::{EntityData, EntityKind, EntityState, EntityStats};
pub use pathfinding::Pathfinder;
