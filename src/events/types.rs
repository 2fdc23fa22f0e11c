// Events emitted by the world for renderers, audio and UI collaborators

use crate::npc::entity::EntityState;
use crate::utility::GridPosition;
use crate::world::object::ObjectTag;

/// World events, drained with `World::pop_event`
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    // === Lifecycle ===
    ObjectSpawned {
        id: i32,
        tag: ObjectTag,
        position: GridPosition,
    },
    ObjectDespawned {
        id: i32,
    },

    // === AI ===
    StateChanged {
        id: i32,
        from: EntityState,
        to: EntityState,
    },

    // === Combat ===
    DamageDealt {
        attacker_id: i32,
        target_id: i32,
        damage: i32,
        remaining_health: i32,
    },
    EntityDied {
        id: i32,
        killer_id: Option<i32>,
    },
    ExperienceGained {
        id: i32,
        amount: i32,
        total: i32,
    },
    PlayerDied {
        id: i32,
    },

    // === Player actions ===
    ItemPickedUp {
        item_id: i32,
        slot: usize,
    },
    ItemDropped {
        item_id: i32,
        position: GridPosition,
    },
    InteractiveToggled {
        id: i32,
        is_open: bool,
    },
    FloorChanged {
        id: i32,
        z: i32,
    },
}
