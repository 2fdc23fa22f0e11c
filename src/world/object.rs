use serde::{Deserialize, Serialize};

use crate::npc::entity::EntityData;
use crate::storage::ChunkIndex;
use crate::utility::{GridPos2, GridPosition, Stopwatch};

/// Variant tag, matches the persisted `tag` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ObjectTag {
    Tile = 0,
    Entity = 1,
    Projectile = 2,
    Effect = 3,
    Interactive = 4,
    Item = 5,
}

impl ObjectTag {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(ObjectTag::Tile),
            1 => Some(ObjectTag::Entity),
            2 => Some(ObjectTag::Projectile),
            3 => Some(ObjectTag::Effect),
            4 => Some(ObjectTag::Interactive),
            5 => Some(ObjectTag::Item),
            _ => None,
        }
    }
}

/// Straight-line mover that damages the first entity it enters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileData {
    /// Unit step per move
    pub direction: GridPos2,
    /// Milliseconds between steps
    pub step_delay_ms: u32,
    /// Cells travelled before it expires
    pub range: i32,
    #[serde(default)]
    pub travelled: i32,
    pub damage: i32,
    #[serde(skip)]
    pub step_timer: Stopwatch,
}

/// Timed visual left in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    pub effect_type: i32,
    pub duration_ms: u32,
    #[serde(skip)]
    pub timer: Stopwatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum InteractiveKind {
    Chest = 0,
    Door = 1,
    StairsUp = 2,
    StairsDown = 3,
}

impl InteractiveKind {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(InteractiveKind::Chest),
            1 => Some(InteractiveKind::Door),
            2 => Some(InteractiveKind::StairsUp),
            3 => Some(InteractiveKind::StairsDown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveData {
    pub kind: InteractiveKind,
    #[serde(default)]
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    pub item_id: i32,
}

/// Variant payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Tile,
    Entity(EntityData),
    Projectile(ProjectileData),
    Effect(EffectData),
    Interactive(InteractiveData),
    Item(ItemData),
}

impl ObjectKind {
    pub fn tag(&self) -> ObjectTag {
        match self {
            ObjectKind::Tile => ObjectTag::Tile,
            ObjectKind::Entity(_) => ObjectTag::Entity,
            ObjectKind::Projectile(_) => ObjectTag::Projectile,
            ObjectKind::Effect(_) => ObjectTag::Effect,
            ObjectKind::Interactive(_) => ObjectTag::Interactive,
            ObjectKind::Item(_) => ObjectTag::Item,
        }
    }
}

/// A game object stored in the arena and bucketed by the spatial index
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub id: i32,
    /// Draw order; the highest layer is the topmost object in a cell
    pub layer: i32,
    pub texture_id: u32,
    pub collidable: bool,
    pub position: GridPosition,
    /// Owning chunk. Only the spatial index writes this.
    pub(crate) chunk: Option<ChunkIndex>,
    pub kind: ObjectKind,
}

impl Object {
    pub fn new(id: i32, position: GridPosition, kind: ObjectKind) -> Self {
        Self {
            id,
            layer: 0,
            texture_id: 0,
            collidable: false,
            position,
            chunk: None,
            kind,
        }
    }

    #[inline]
    pub fn tag(&self) -> ObjectTag {
        self.kind.tag()
    }

    /// Chunk the object is currently bucketed in, if any
    #[inline]
    pub fn chunk(&self) -> Option<ChunkIndex> {
        self.chunk
    }

    pub fn as_entity(&self) -> Option<&EntityData> {
        match &self.kind {
            ObjectKind::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut EntityData> {
        match &mut self.kind {
            ObjectKind::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_interactive_mut(&mut self) -> Option<&mut InteractiveData> {
        match &mut self.kind {
            ObjectKind::Interactive(interactive) => Some(interactive),
            _ => None,
        }
    }

    /// Entity with health left
    pub fn is_living_entity(&self) -> bool {
        self.as_entity().is_some_and(|entity| entity.stats.is_alive())
    }
}
