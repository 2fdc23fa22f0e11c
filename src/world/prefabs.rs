// Prefab templates
// New objects are deep copies of a named template with a fresh id and position

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::npc::entity::{EntityData, EntityKind, EntityStats};
use crate::utility::{GridPos2, GridPosition};
use crate::world::object::{
    EffectData, InteractiveData, InteractiveKind, ItemData, Object, ObjectKind, ProjectileData,
};

/// Built-in prefab names
pub mod names {
    pub const EMPTY_TILE: &str = "empty_tile";
    pub const WALL_TILE: &str = "wall_tile";
    pub const PLAYER: &str = "player";
    pub const ENEMY_RAT: &str = "enemy_rat";
    pub const ITEM_SWORD: &str = "item_sword";
    pub const DOOR: &str = "door";
    pub const CHEST: &str = "chest";
    pub const STAIRS_UP: &str = "stairs_up";
    pub const STAIRS_DOWN: &str = "stairs_down";
    pub const ARROW: &str = "arrow";
    pub const HIT_EFFECT: &str = "hit_effect";
}

/// Texture ids in the sprite sheet
pub mod textures {
    pub const EMPTY_TILE: u32 = 3;
    pub const PLAYER: u32 = 4;
    pub const ENEMY_RAT: u32 = 5;
    pub const ITEM_SWORD: u32 = 47;
    pub const CHEST: u32 = 60;
    pub const DOOR: u32 = 61;
    pub const STAIRS_UP: u32 = 62;
    pub const STAIRS_DOWN: u32 = 63;
    pub const ARROW: u32 = 90;
    pub const HIT_EFFECT: u32 = 120;
    pub const WALL_TILE: u32 = 180;
}

/// Draw layers for the built-in prefabs
pub mod layers {
    pub const FLOOR: i32 = 0;
    pub const ITEM: i32 = 1;
    pub const ENTITY: i32 = 2;
    pub const EFFECT: i32 = 3;
}

/// Named object template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    #[serde(default)]
    pub layer: i32,
    pub texture_id: u32,
    #[serde(default)]
    pub collidable: bool,
    pub kind: ObjectKind,
}

impl Prefab {
    /// Deep copy into a new object at `position`. Entities anchor their
    /// patrol origin there and start with stopped timers and no target.
    pub fn instantiate(&self, id: i32, position: GridPosition) -> Object {
        let mut object = Object::new(id, position, self.kind.clone());
        object.layer = self.layer;
        object.texture_id = self.texture_id;
        object.collidable = self.collidable;
        if let ObjectKind::Entity(entity) = &mut object.kind {
            entity.reset_runtime(position.xy());
        }
        object
    }
}

/// Prefab lookup by name
#[derive(Debug, Clone, Default)]
pub struct PrefabRegistry {
    prefabs: HashMap<String, Prefab>,
}

impl PrefabRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in prefabs
    pub fn with_defaults() -> Self {
        DEFAULT_PREFABS.clone()
    }

    /// Register a prefab, replacing one with the same name
    pub fn register(&mut self, prefab: Prefab) {
        self.prefabs.insert(prefab.name.clone(), prefab);
    }

    pub fn get(&self, name: &str) -> Option<&Prefab> {
        self.prefabs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prefabs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    /// Register every prefab of a JSON array. Returns how many were read.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let prefabs: Vec<Prefab> = serde_json::from_str(json)?;
        let count = prefabs.len();
        for prefab in prefabs {
            self.register(prefab);
        }
        tracing::info!(count, "prefabs loaded from json");
        Ok(count)
    }

    /// Register all built-in prefabs
    fn register_default_prefabs(&mut self) {
        self.register(Prefab {
            name: names::EMPTY_TILE.to_string(),
            layer: layers::FLOOR,
            texture_id: textures::EMPTY_TILE,
            collidable: false,
            kind: ObjectKind::Tile,
        });

        self.register(Prefab {
            name: names::WALL_TILE.to_string(),
            layer: layers::FLOOR,
            texture_id: textures::WALL_TILE,
            collidable: true,
            kind: ObjectKind::Tile,
        });

        self.register(Prefab {
            name: names::PLAYER.to_string(),
            layer: layers::ENTITY,
            texture_id: textures::PLAYER,
            collidable: true,
            kind: ObjectKind::Entity(EntityData::new(
                EntityKind::Player,
                EntityStats {
                    health: 100,
                    experience: 0,
                    level: 1,
                    speed: 100,
                    damage: 10,
                    attack_speed: 1000,
                    range: 1,
                    armor: 0,
                    strength: 10,
                    dexterity: 10,
                    vitality: 10,
                    energy: 10,
                },
            )),
        });

        // Rats wander 4 cells from home and notice players within 3
        let mut rat = EntityData::new(
            EntityKind::Enemy,
            EntityStats {
                health: 50,
                experience: 10,
                level: 1,
                speed: 80,
                damage: 5,
                attack_speed: 1500,
                range: 1,
                armor: 0,
                strength: 5,
                dexterity: 5,
                vitality: 5,
                energy: 5,
            },
        );
        rat.patrol_radius = 4;
        rat.chase_radius = 3;
        self.register(Prefab {
            name: names::ENEMY_RAT.to_string(),
            layer: layers::ENTITY,
            texture_id: textures::ENEMY_RAT,
            collidable: true,
            kind: ObjectKind::Entity(rat),
        });

        self.register(Prefab {
            name: names::ITEM_SWORD.to_string(),
            layer: layers::ITEM,
            texture_id: textures::ITEM_SWORD,
            collidable: false,
            kind: ObjectKind::Item(ItemData { item_id: 1 }),
        });

        // Closed doors block movement until opened
        self.register(Prefab {
            name: names::DOOR.to_string(),
            layer: layers::ITEM,
            texture_id: textures::DOOR,
            collidable: true,
            kind: ObjectKind::Interactive(InteractiveData {
                kind: InteractiveKind::Door,
                is_open: false,
            }),
        });

        self.register(Prefab {
            name: names::CHEST.to_string(),
            layer: layers::ITEM,
            texture_id: textures::CHEST,
            collidable: true,
            kind: ObjectKind::Interactive(InteractiveData {
                kind: InteractiveKind::Chest,
                is_open: false,
            }),
        });

        self.register(Prefab {
            name: names::STAIRS_UP.to_string(),
            layer: layers::ITEM,
            texture_id: textures::STAIRS_UP,
            collidable: false,
            kind: ObjectKind::Interactive(InteractiveData {
                kind: InteractiveKind::StairsUp,
                is_open: false,
            }),
        });

        self.register(Prefab {
            name: names::STAIRS_DOWN.to_string(),
            layer: layers::ITEM,
            texture_id: textures::STAIRS_DOWN,
            collidable: false,
            kind: ObjectKind::Interactive(InteractiveData {
                kind: InteractiveKind::StairsDown,
                is_open: false,
            }),
        });

        self.register(Prefab {
            name: names::ARROW.to_string(),
            layer: layers::EFFECT,
            texture_id: textures::ARROW,
            collidable: false,
            kind: ObjectKind::Projectile(ProjectileData {
                direction: GridPos2::new(1, 0),
                step_delay_ms: 100,
                range: 6,
                travelled: 0,
                damage: 8,
                step_timer: Default::default(),
            }),
        });

        self.register(Prefab {
            name: names::HIT_EFFECT.to_string(),
            layer: layers::EFFECT,
            texture_id: textures::HIT_EFFECT,
            collidable: false,
            kind: ObjectKind::Effect(EffectData {
                effect_type: 0,
                duration_ms: 300,
                timer: Default::default(),
            }),
        });
    }
}

/// Built-in prefabs, built once
pub static DEFAULT_PREFABS: Lazy<PrefabRegistry> = Lazy::new(|| {
    let mut registry = PrefabRegistry::new();
    registry.register_default_prefabs();
    registry
});
