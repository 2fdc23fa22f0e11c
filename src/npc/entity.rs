use serde::{Deserialize, Serialize};

use crate::config::{ai, player};
use crate::storage::ObjectKey;
use crate::utility::{GridPos2, Stopwatch};

/// Which controller drives an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EntityKind {
    Player = 0,
    Enemy = 1,
}

impl EntityKind {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(EntityKind::Player),
            1 => Some(EntityKind::Enemy),
            _ => None,
        }
    }

    /// Enemies only hunt players
    #[inline]
    pub fn is_hostile_to(&self, other: EntityKind) -> bool {
        matches!((self, other), (EntityKind::Enemy, EntityKind::Player))
    }
}

/// Enemy behaviour loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum EntityState {
    #[default]
    Patrolling = 0,
    Chasing = 1,
    GoingBack = 2,
}

impl EntityState {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(EntityState::Patrolling),
            1 => Some(EntityState::Chasing),
            2 => Some(EntityState::GoingBack),
            _ => None,
        }
    }
}

/// Integer stat block shared by players and enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityStats {
    pub health: i32,
    pub experience: i32,
    pub level: i32,
    pub speed: i32,
    pub damage: i32,
    pub attack_speed: i32,
    /// Attack reach in cells (truncated Euclidean distance)
    pub range: i32,
    pub armor: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub vitality: i32,
    pub energy: i32,
}

impl EntityStats {
    /// Check if entity is alive
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Entity payload of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub kind: EntityKind,
    pub stats: EntityStats,
    #[serde(default)]
    pub state: EntityState,
    #[serde(default)]
    pub patrol_radius: i32,
    #[serde(default)]
    pub chase_radius: i32,

    // Runtime state below is rebuilt on spawn and never persisted as-is.
    /// Spawn cell the enemy patrols around
    #[serde(skip)]
    pub origin: GridPos2,
    /// Generational handle; resolves to nothing once the target is despawned
    #[serde(skip)]
    pub target: Option<ObjectKey>,
    /// Last step taken (sprite interpolation)
    #[serde(skip)]
    pub facing: GridPos2,
    #[serde(skip)]
    pub movement_timer: Stopwatch,
    #[serde(skip)]
    pub attack_timer: Stopwatch,
    /// Carried items; the item objects stay in the store but leave the index
    #[serde(skip)]
    pub items: [Option<ObjectKey>; player::MAX_ITEMS],
}

impl EntityData {
    pub fn new(kind: EntityKind, stats: EntityStats) -> Self {
        Self {
            kind,
            stats,
            state: EntityState::Patrolling,
            patrol_radius: 0,
            chase_radius: 0,
            origin: GridPos2::ZERO,
            target: None,
            facing: GridPos2::ZERO,
            movement_timer: Stopwatch::new(),
            attack_timer: Stopwatch::new(),
            items: [None; player::MAX_ITEMS],
        }
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Reset timers and target, anchor the patrol origin
    pub fn reset_runtime(&mut self, origin: GridPos2) {
        self.origin = origin;
        self.target = None;
        self.facing = GridPos2::ZERO;
        self.movement_timer.stop();
        self.attack_timer.stop();
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        self.items.iter().position(|slot| slot.is_none())
    }
}

/// Delay between steps: `base - speed`, clamped to `[min, base]`.
/// Speed 0 (or less) waits the full base delay.
pub fn movement_delay_ms(speed: i32, base_ms: u64, min_ms: u64) -> u64 {
    if speed <= 0 {
        return base_ms;
    }
    base_ms.saturating_sub(speed as u64).max(min_ms)
}

/// Delay between attacks: `attack_speed * max(1 - 0.05 * (dexterity / 10), 0.5)`.
/// The dexterity division is integer, so only whole tens count.
pub fn attack_delay_ms(attack_speed: i32, dexterity: i32) -> u64 {
    let dexterity_factor = (dexterity.max(0) / 10) as f32;
    let reduction = (1.0 - dexterity_factor * ai::DEXTERITY_REDUCTION_STEP).max(ai::MIN_ATTACK_REDUCTION);
    (attack_speed.max(0) as f32 * reduction) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_delay() {
        assert_eq!(movement_delay_ms(0, 1000, 50), 1000);
        assert_eq!(movement_delay_ms(100, 1000, 50), 900);
        assert_eq!(movement_delay_ms(80, 1000, 50), 920);
        assert_eq!(movement_delay_ms(990, 1000, 50), 50);
        assert_eq!(movement_delay_ms(5000, 1000, 50), 50);
    }

    #[test]
    fn test_attack_delay() {
        assert_eq!(attack_delay_ms(1000, 10), 950);
        assert_eq!(attack_delay_ms(1000, 19), 950);
        assert_eq!(attack_delay_ms(1500, 5), 1500);
        // Clamped at half the attack speed
        assert_eq!(attack_delay_ms(1000, 200), 500);
    }

    #[test]
    fn test_hostility() {
        assert!(EntityKind::Enemy.is_hostile_to(EntityKind::Player));
        assert!(!EntityKind::Enemy.is_hostile_to(EntityKind::Enemy));
        assert!(!EntityKind::Player.is_hostile_to(EntityKind::Enemy));
    }

    #[test]
    fn test_inventory_slots() {
        let mut data = EntityData::new(EntityKind::Player, EntityStats::default());
        assert_eq!(data.first_free_slot(), Some(0));
        data.items = [Some(ObjectKey::default()); player::MAX_ITEMS];
        assert_eq!(data.first_free_slot(), None);
    }
}
