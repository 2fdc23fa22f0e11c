/// The world context
///
/// `World` owns everything the simulation mutates: the object arena, the
/// chunked spatial index, the pathfinder scratch pool, the clock, the
/// patrol RNG, the sprite queue and the event queue. There are no globals;
/// a host builds one `World` and drives it with `tick`.
///
/// Behaviour is split across modules as `impl World` blocks:
/// - `npc::spawn_manager`: spawn, despawn, id assignment
/// - `npc::enemy_ai`: the patrol / chase / return state machine
/// - `npc::player`: player movement, items and interaction
/// - `combat::combat_system`: attacks, projectiles
/// - `world::editor`: editor commands
///
/// Tick order:
/// 1. clear the sprite queue
/// 2. apply queued editor commands
/// 3. collect the chunks around the camera
/// 4. update every object of those chunks (iterating a snapshot of their
///    membership) and rebucket it if it changed chunk
/// 5. despawn objects scheduled for removal during the update
/// 6. move the camera to the player

pub mod editor;
pub mod map_loader;
pub mod object;
pub mod prefabs;
pub mod render;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

use crate::combat::target_finder::find_closest_entity;
use crate::config::WorldConfig;
use crate::error::ConfigError;
use crate::events::{EventQueue, WorldEvent};
use crate::input::InputState;
use crate::npc::entity::EntityState;
use crate::npc::pathfinding::Pathfinder;
use crate::storage::{CellQuery, ChunkList, ObjectKey, ObjectStore, SpatialIndex};
use crate::utility::{manhattan, GridPos2, GridPosition, SimClock};

use editor::EditorCommand;
use object::{Object, ObjectKind, ObjectTag};
use prefabs::PrefabRegistry;
use render::{RenderQueue, SpriteDraw};

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub now_ms: u64,
    pub visible_chunks: usize,
    pub updated: usize,
    pub despawned: usize,
    pub sprites: usize,
    pub game_over: bool,
}

pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) clock: SimClock,
    pub(crate) rng: StdRng,
    pub(crate) prefabs: PrefabRegistry,
    pub(crate) objects: ObjectStore,
    pub(crate) index: SpatialIndex,
    pub(crate) pathfinder: Pathfinder,
    pub(crate) render: RenderQueue,
    pub(crate) events: EventQueue,
    pub(crate) editor_queue: VecDeque<EditorCommand>,
    pub(crate) camera: GridPosition,
    pub(crate) current_z: i32,
    pub(crate) player: Option<ObjectKey>,
    pub(crate) game_over: bool,
    /// Chunk membership copied before the update pass
    snapshot: Vec<ObjectKey>,
    pub(crate) pending_despawn: Vec<ObjectKey>,
}

impl World {
    /// Empty world with the built-in prefabs
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::with_prefabs(config, PrefabRegistry::with_defaults())
    }

    pub fn with_prefabs(config: WorldConfig, prefabs: PrefabRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let max_objects = config.max_objects;

        let world = Self {
            objects: ObjectStore::with_capacity(max_objects),
            index: SpatialIndex::new(&config),
            pathfinder: Pathfinder::new(config.path_max_nodes),
            render: RenderQueue::with_capacity(config.sprite_capacity),
            events: EventQueue::new(),
            editor_queue: VecDeque::new(),
            clock: SimClock::new(),
            camera: GridPosition::default(),
            current_z: 0,
            player: None,
            game_over: false,
            snapshot: Vec::with_capacity(max_objects),
            pending_despawn: Vec::new(),
            rng,
            prefabs,
            config,
        };
        tracing::info!(
            chunk_size = world.config.chunk_size,
            max_chunks = world.config.max_chunks,
            max_objects,
            "world created"
        );
        Ok(world)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn object(&self, key: ObjectKey) -> Option<&Object> {
        self.objects.get(key)
    }

    /// Mutable access for hosts and tests. Changing `position` takes
    /// effect in the index at the object's next rebucket.
    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut Object> {
        self.objects.get_mut(key)
    }

    pub fn player(&self) -> Option<ObjectKey> {
        self.player
    }

    pub fn player_object(&self) -> Option<&Object> {
        self.player.and_then(|key| self.objects.get(key))
    }

    pub fn camera(&self) -> GridPosition {
        self.camera
    }

    pub fn set_camera(&mut self, camera: GridPosition) {
        self.camera = camera;
    }

    pub fn current_z(&self) -> i32 {
        self.current_z
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn prefabs(&self) -> &PrefabRegistry {
        &self.prefabs
    }

    pub fn prefabs_mut(&mut self) -> &mut PrefabRegistry {
        &mut self.prefabs
    }

    /// Sprites queued by the last tick
    pub fn sprites(&self) -> &[SpriteDraw] {
        self.render.sprites()
    }

    /// Handle to the event queue for consumers on other threads
    pub fn event_queue(&self) -> EventQueue {
        self.events.clone()
    }

    /// Get next world event from queue
    pub fn pop_event(&self) -> Option<WorldEvent> {
        self.events.pop()
    }

    #[inline]
    pub(crate) fn emit(&self, event: WorldEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Objects at exactly `pos`, at most `MAX_LAYERS`
    pub fn query_objects_at(&self, pos: GridPosition) -> CellQuery {
        self.index.query_at(&self.objects, pos)
    }

    /// Closest other entity strictly within `radius` cells of `source`
    pub fn query_closest_entity_in_radius(&self, source: ObjectKey, radius: i32) -> Option<ObjectKey> {
        find_closest_entity(source, &self.objects, &self.index, radius, |_| true)
    }

    /// Any collidable object at `pos`
    pub fn is_blocked(&self, pos: GridPosition) -> bool {
        self.index.is_blocked(&self.objects, pos)
    }

    /// Highest-layer object at `pos`; the later one wins a tie
    pub fn topmost_at(&self, pos: GridPosition) -> Option<ObjectKey> {
        let cell = self.query_objects_at(pos);
        let mut best: Option<(ObjectKey, i32)> = None;
        for key in cell.iter() {
            let Some(object) = self.objects.get(key) else {
                continue;
            };
            match best {
                Some((_, layer)) if object.layer < layer => {}
                _ => best = Some((key, object.layer)),
            }
        }
        best.map(|(key, _)| key)
    }

    /// Chunks inside the camera window on the current floor
    pub fn visible_chunks(&self) -> ChunkList {
        let center = self.index.chunk_coord_of(self.camera.with_z(self.current_z));
        self.index
            .chunks_around(center, self.config.visible_chunks_x, self.config.visible_chunks_y)
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance the simulation by `dt_ms` and run one update pass
    pub fn tick(&mut self, dt_ms: u64, input: &InputState) -> TickReport {
        if self.game_over {
            return TickReport {
                now_ms: self.now_ms(),
                game_over: true,
                ..Default::default()
            };
        }
        let now_ms = self.clock.advance(dt_ms);

        // 1. per-frame sprite state
        self.render.clear();

        // 2. editor input
        self.process_editor_commands();

        // 3. visible chunks
        let visible = self.visible_chunks();

        // 4. update a stable copy of the membership, rebucketing as we go
        let mut snapshot = std::mem::take(&mut self.snapshot);
        self.index.snapshot_into(&visible, &mut snapshot);
        let mut updated = 0;
        for &key in &snapshot {
            if !self.objects.contains(key) || self.pending_despawn.contains(&key) {
                continue;
            }
            self.update_object(key, input);
            self.rebucket_object(key);
            updated += 1;
        }
        snapshot.clear();
        self.snapshot = snapshot;

        // 5. deferred removals
        let despawned = self.flush_despawns();

        // 6. camera follows the player
        if let Some(pos) = self.player_object().map(|player| player.position) {
            self.camera = GridPosition::new(pos.x, pos.y, self.camera.z);
        }

        TickReport {
            now_ms,
            visible_chunks: visible.len(),
            updated,
            despawned,
            sprites: self.render.len(),
            game_over: self.game_over,
        }
    }

    fn update_object(&mut self, key: ObjectKey, input: &InputState) {
        let Some(object) = self.objects.get(key) else {
            return;
        };
        match &object.kind {
            ObjectKind::Entity(entity) if entity.is_player() => self.update_player(key, input),
            ObjectKind::Entity(_) => self.update_enemy(key),
            ObjectKind::Projectile(_) => self.update_projectile(key),
            ObjectKind::Effect(_) => self.update_effect(key),
            ObjectKind::Tile | ObjectKind::Interactive(_) | ObjectKind::Item(_) => {}
        }
        self.queue_sprite(key);
    }

    /// Effects disappear once their duration runs out
    fn update_effect(&mut self, key: ObjectKey) {
        let now = self.now_ms();
        let expired = match self.objects.get_mut(key).map(|o| &mut o.kind) {
            Some(ObjectKind::Effect(effect)) => {
                if !effect.timer.is_running() {
                    effect.timer.start(now, effect.duration_ms as u64);
                }
                effect.timer.is_elapsed(now)
            }
            _ => false,
        };
        if expired {
            self.schedule_despawn(key);
        }
    }

    fn queue_sprite(&mut self, key: ObjectKey) {
        let now = self.now_ms();
        let Some(object) = self.objects.get(key) else {
            return;
        };
        if object.position.z != self.current_z || self.pending_despawn.contains(&key) {
            return;
        }
        let offset = match object.as_entity() {
            Some(entity) if !entity.movement_timer.is_zero(now) => {
                let remaining = entity.movement_timer.percent_remaining(now);
                (
                    -(entity.facing.x as f32) * remaining,
                    -(entity.facing.y as f32) * remaining,
                )
            }
            _ => (0.0, 0.0),
        };
        let sprite = SpriteDraw {
            texture_id: object.texture_id,
            position: object.position,
            layer: object.layer,
            offset,
        };
        self.render.push(sprite);
    }

    pub(crate) fn rebucket_object(&mut self, key: ObjectKey) {
        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        if object.chunk().is_none() {
            return;
        }
        if let Err(err) = self.index.rebucket(key, object) {
            tracing::warn!(id = object.id, %err, "rebucket failed");
        }
    }

    /// Remove `key` after the current update pass
    pub(crate) fn schedule_despawn(&mut self, key: ObjectKey) {
        if !self.pending_despawn.contains(&key) {
            self.pending_despawn.push(key);
        }
    }

    fn flush_despawns(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_despawn);
        let mut count = 0;
        for key in pending {
            if self.despawn(key).is_ok() {
                count += 1;
            }
        }
        count
    }

    // ========================================================================
    // MOVEMENT HELPERS
    // ========================================================================

    /// First A* step from `from` toward `goal` on the same floor.
    ///
    /// Collidable cells are closed except the goal itself, so a chaser can
    /// path up to an occupied target cell.
    pub(crate) fn path_step(&mut self, from: GridPosition, goal: GridPos2) -> GridPos2 {
        let z = from.z;
        let max_nodes = self.config.path_max_nodes;
        let store = &self.objects;
        let index = &self.index;
        self.pathfinder.move_direction(from.xy(), goal, max_nodes, |pos| {
            if pos != goal && index.is_blocked(store, GridPosition::from_xy(pos, z)) {
                None
            } else {
                Some(manhattan(pos, goal))
            }
        })
    }

    /// Move an entity one cell and restart its movement countdown
    pub(crate) fn step_entity(&mut self, key: ObjectKey, step: GridPos2) {
        let now = self.now_ms();
        let base = self.config.base_movement_delay_ms;
        let min = self.config.min_movement_delay_ms;
        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        object.position = object.position.offset(step);
        if let Some(entity) = object.as_entity_mut() {
            entity.facing = step;
            let delay = crate::npc::entity::movement_delay_ms(entity.stats.speed, base, min);
            entity.movement_timer.start(now, delay);
        }
        debug_log!("object {} stepped to {}", object.id, object.position);
    }

    /// Change an entity's AI state, emitting an event when it differs
    pub(crate) fn transition(&mut self, key: ObjectKey, to: EntityState) {
        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        let id = object.id;
        let Some(entity) = object.as_entity_mut() else {
            return;
        };
        let from = entity.state;
        if from == to {
            return;
        }
        entity.state = to;
        debug_log!("entity {} state {:?} -> {:?}", id, from, to);
        self.emit(WorldEvent::StateChanged { id, from, to });
    }

    /// Objects of a given variant (diagnostics and tests)
    pub fn count_tagged(&self, tag: ObjectTag) -> usize {
        self.objects.iter().filter(|(_, o)| o.tag() == tag).count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Deterministic world for tests
    pub fn test_world() -> World {
        let config = WorldConfig {
            rng_seed: Some(42),
            ..WorldConfig::default()
        };
        World::new(config).unwrap()
    }

    /// Lay a floor of empty tiles over the inclusive rectangle
    pub fn floor(world: &mut World, from: (i32, i32), to: (i32, i32)) {
        for y in from.1..=to.1 {
            for x in from.0..=to.0 {
                world
                    .spawn(prefabs::names::EMPTY_TILE, GridPosition::new(x, y, 0))
                    .unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::input::Keys;
    use crate::utility::ChunkCoord;
    use crate::world::prefabs::{names, Prefab};

    #[test]
    fn test_topmost_prefers_highest_layer() {
        let mut world = test_world();
        let pos = GridPosition::new(1, 1, 0);
        world.spawn(names::EMPTY_TILE, pos).unwrap();
        let sword = world.spawn(names::ITEM_SWORD, pos).unwrap();
        assert_eq!(world.topmost_at(pos), Some(sword));
        assert_eq!(world.topmost_at(GridPosition::new(9, 9, 0)), None);
    }

    #[test]
    fn test_tick_queues_sprites_for_visible_floor() {
        let mut world = test_world();
        floor(&mut world, (0, 0), (2, 2));
        world.spawn(names::EMPTY_TILE, GridPosition::new(0, 0, 1)).unwrap();
        // Far outside the camera window
        world.spawn(names::EMPTY_TILE, GridPosition::new(500, 0, 0)).unwrap();

        let report = world.tick(16, &InputState::new());
        assert_eq!(report.sprites, 9);
        assert_eq!(report.visible_chunks, 1);
        assert_eq!(report.updated, 10);
        assert_eq!(world.sprites().len(), 9);
    }

    #[test]
    fn test_effect_expires_after_duration() {
        let mut world = test_world();
        let effect = world.spawn(names::HIT_EFFECT, GridPosition::new(0, 0, 0)).unwrap();

        world.tick(16, &InputState::new());
        assert!(world.object(effect).is_some());

        let report = world.tick(400, &InputState::new());
        assert_eq!(report.despawned, 1);
        assert!(world.object(effect).is_none());
        assert!(world.query_objects_at(GridPosition::new(0, 0, 0)).is_empty());
    }

    #[test]
    fn test_object_crossing_chunks_is_updated_once() {
        let mut world = test_world();
        floor(&mut world, (14, 0), (16, 0));
        let player = world.spawn(names::PLAYER, GridPosition::new(15, 0, 0)).unwrap();
        assert_eq!(world.index().chunks().len(), 2);

        let report = world.tick(16, &InputState::holding(Keys::RIGHT));
        assert_eq!(report.updated, world.objects().len());
        assert_eq!(report.updated, 4);

        // One step, even though the player now sits in a chunk visited later
        let moved = world.object(player).unwrap();
        assert_eq!(moved.position, GridPosition::new(16, 0, 0));
        let chunk = world.index().chunk(moved.chunk().unwrap()).unwrap();
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 0, 0));
        assert_eq!(chunk.objects().iter().filter(|&&key| key == player).count(), 1);
    }

    #[test]
    fn test_camera_selects_visible_window() {
        let mut world = test_world();
        world.prefabs_mut().register(Prefab {
            name: "lantern".to_string(),
            layer: 1,
            texture_id: 77,
            collidable: false,
            kind: ObjectKind::Tile,
        });
        world.spawn(names::EMPTY_TILE, GridPosition::new(0, 0, 0)).unwrap();
        world.spawn("lantern", GridPosition::new(500, 0, 0)).unwrap();
        assert_eq!(world.count_tagged(ObjectTag::Tile), 2);
        assert_eq!(world.count_tagged(ObjectTag::Entity), 0);

        let report = world.tick(16, &InputState::new());
        assert_eq!(report.updated, 1);
        assert_ne!(world.sprites()[0].texture_id, 77);

        world.set_camera(GridPosition::new(500, 0, 0));
        let report = world.tick(16, &InputState::new());
        assert_eq!(report.updated, 1);
        assert_eq!(world.sprites().len(), 1);
        assert_eq!(world.sprites()[0].texture_id, 77);
        assert_eq!(world.sprites()[0].layer, 1);
    }

    #[test]
    fn test_query_closest_entity_in_radius() {
        let mut world = test_world();
        let player = world.spawn(names::PLAYER, GridPosition::new(0, 0, 0)).unwrap();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(2, 0, 0)).unwrap();
        world.spawn(names::ENEMY_RAT, GridPosition::new(9, 0, 0)).unwrap();

        assert_eq!(world.query_closest_entity_in_radius(player, 4), Some(rat));
        assert_eq!(world.query_closest_entity_in_radius(player, 2), None);
    }
}
