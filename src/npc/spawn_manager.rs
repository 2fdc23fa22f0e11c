// Object spawning and despawning
//
// Ids are "highest id in any populated chunk + 1", recomputed on every
// spawn. Ids are for display and persistence; runtime references use
// generational `ObjectKey`s.

use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::storage::ObjectKey;
use crate::utility::GridPosition;
use crate::world::object::{Object, ObjectKind};
use crate::world::World;

impl World {
    /// Next id: max id across populated chunks + 1, or 0 for an empty world
    pub fn next_object_id(&self) -> i32 {
        self.index
            .chunks()
            .iter()
            .flat_map(|chunk| chunk.objects().iter())
            .filter_map(|&key| self.objects.get(key))
            .map(|object| object.id)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Copy the named prefab to `position` and bucket it
    pub fn spawn(&mut self, prefab: &str, position: GridPosition) -> Result<ObjectKey, WorldError> {
        let Some(template) = self.prefabs.get(prefab) else {
            tracing::warn!(prefab, "spawn: unknown prefab");
            return Err(WorldError::UnknownPrefab(prefab.to_string()));
        };
        let id = self.next_object_id();
        let object = template.instantiate(id, position);
        self.insert_object(object)
    }

    /// Store and bucket a fully built object, keeping its id.
    /// The first player entity inserted becomes the world's player.
    pub fn insert_object(&mut self, object: Object) -> Result<ObjectKey, WorldError> {
        let (id, tag, position) = (object.id, object.tag(), object.position);
        let is_player = object.as_entity().is_some_and(|entity| entity.is_player());

        let key = self.objects.insert(object)?;
        let bucketed = match self.objects.get_mut(key) {
            Some(object) => self.index.insert(key, object),
            None => Err(WorldError::ObjectNotFound),
        };
        if let Err(err) = bucketed {
            self.objects.remove(key);
            return Err(err);
        }

        if is_player && self.player.is_none() {
            self.player = Some(key);
            self.camera = GridPosition::new(position.x, position.y, self.camera.z);
            self.current_z = position.z;
        }
        debug_log!("spawned object {} ({:?}) at {}", id, tag, position);
        self.emit(WorldEvent::ObjectSpawned { id, tag, position });
        Ok(key)
    }

    /// Remove an object from the index and the store.
    ///
    /// Items carried by a despawned entity go with it. Handles held
    /// elsewhere stop resolving.
    pub fn despawn(&mut self, key: ObjectKey) -> Result<Object, WorldError> {
        let Some(object) = self.objects.get_mut(key) else {
            tracing::warn!("despawn: stale object handle");
            return Err(WorldError::ObjectNotFound);
        };
        if object.chunk().is_some() {
            self.index.remove(key, object);
        }
        let Some(object) = self.objects.remove(key) else {
            return Err(WorldError::ObjectNotFound);
        };

        if let ObjectKind::Entity(entity) = &object.kind {
            for item in entity.items.iter().flatten() {
                self.objects.remove(*item);
            }
        }
        if self.player == Some(key) {
            self.player = None;
        }

        debug_log!("despawned object {}", object.id);
        self.emit(WorldEvent::ObjectDespawned { id: object.id });
        Ok(object)
    }

    /// Drop every object and chunk
    pub fn clear(&mut self) {
        self.objects.clear();
        self.index.clear();
        self.player = None;
        self.pending_despawn.clear();
        self.game_over = false;
    }
}

#[cfg(test)]
mod tests {
    use crate::error::WorldError;
    use crate::events::WorldEvent;
    use crate::utility::GridPosition;
    use crate::world::prefabs::names;
    use crate::world::test_support::test_world;

    #[test]
    fn test_ids_are_max_plus_one() {
        let mut world = test_world();
        assert_eq!(world.next_object_id(), 0);

        let a = world.spawn(names::EMPTY_TILE, GridPosition::new(0, 0, 0)).unwrap();
        let b = world.spawn(names::EMPTY_TILE, GridPosition::new(1, 0, 0)).unwrap();
        let c = world.spawn(names::EMPTY_TILE, GridPosition::new(2, 0, 0)).unwrap();
        assert_eq!(world.object(c).unwrap().id, 2);

        // Removing a lower id does not free it
        world.despawn(a).unwrap();
        assert_eq!(world.next_object_id(), 3);

        // Removing the max does
        world.despawn(c).unwrap();
        assert_eq!(world.next_object_id(), 2);
        assert_eq!(world.object(b).unwrap().id, 1);
    }

    #[test]
    fn test_unknown_prefab() {
        let mut world = test_world();
        assert_eq!(
            world.spawn("dragon", GridPosition::new(0, 0, 0)),
            Err(WorldError::UnknownPrefab("dragon".to_string()))
        );
    }

    #[test]
    fn test_first_player_becomes_world_player() {
        let mut world = test_world();
        let first = world.spawn(names::PLAYER, GridPosition::new(3, 4, 0)).unwrap();
        world.spawn(names::PLAYER, GridPosition::new(5, 5, 0)).unwrap();
        assert_eq!(world.player(), Some(first));
        assert_eq!(world.camera(), GridPosition::new(3, 4, 0));
    }

    #[test]
    fn test_despawn_invalidates_handle_and_unbuckets() {
        let mut world = test_world();
        let pos = GridPosition::new(1, 1, 0);
        let key = world.spawn(names::ENEMY_RAT, pos).unwrap();
        while world.pop_event().is_some() {}

        let removed = world.despawn(key).unwrap();
        assert_eq!(removed.id, 0);
        assert!(world.object(key).is_none());
        assert!(world.query_objects_at(pos).is_empty());
        assert_eq!(world.pop_event(), Some(WorldEvent::ObjectDespawned { id: 0 }));
        assert_eq!(world.despawn(key), Err(WorldError::ObjectNotFound));
    }
}
