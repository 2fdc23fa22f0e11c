/// Fixed-capacity arena of game objects
///
/// Slots are reused after a despawn, but every slot carries a generation
/// counter. A handle kept past its object's despawn (an enemy's target, an
/// inventory slot) no longer resolves, even after the slot is refilled.

use slotmap::SlotMap;

use crate::error::WorldError;
use crate::world::object::Object;

slotmap::new_key_type! {
    /// Generational handle to an object in the store
    pub struct ObjectKey;
}

pub struct ObjectStore {
    objects: SlotMap<ObjectKey, Object>,
    capacity: usize,
}

impl ObjectStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: SlotMap::with_capacity_and_key(capacity),
            capacity,
        }
    }

    /// Store an object. Fails without allocating once the arena is full.
    pub fn insert(&mut self, object: Object) -> Result<ObjectKey, WorldError> {
        if self.objects.len() >= self.capacity {
            tracing::error!(capacity = self.capacity, id = object.id, "object store full");
            return Err(WorldError::StoreFull { capacity: self.capacity });
        }
        Ok(self.objects.insert(object))
    }

    pub fn remove(&mut self, key: ObjectKey) -> Option<Object> {
        self.objects.remove(key)
    }

    #[inline]
    pub fn get(&self, key: ObjectKey) -> Option<&Object> {
        self.objects.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut Object> {
        self.objects.get_mut(key)
    }

    #[inline]
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &Object)> {
        self.objects.iter()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
