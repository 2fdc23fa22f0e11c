// Combat module
// Melee resolution, projectiles and the distance checks behind aggro

pub mod combat_system;
pub mod target_finder;
pub mod range_calculator;

pub use combat_system::{strike, AttackOutcome};
