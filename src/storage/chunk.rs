use crate::storage::ObjectKey;
use crate::utility::ChunkCoord;

/// Position of a chunk in the pool. Chunks are never freed during a
/// session, so an index stays valid for the life of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkIndex(pub(crate) usize);

impl ChunkIndex {
    #[inline]
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Fixed-capacity bucket of object handles in insertion order
#[derive(Debug, Clone)]
pub struct Chunk {
    coord: ChunkCoord,
    objects: Vec<ObjectKey>,
    capacity: usize,
}

impl Chunk {
    /// Reserve the full capacity up front; pushes never reallocate
    pub fn new(coord: ChunkCoord, capacity: usize) -> Self {
        Self {
            coord,
            objects: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn objects(&self) -> &[ObjectKey] {
        &self.objects
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.objects.len() >= self.capacity
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains(&key)
    }

    /// Append unless full
    pub(crate) fn push(&mut self, key: ObjectKey) -> bool {
        if self.is_full() {
            return false;
        }
        self.objects.push(key);
        true
    }

    /// Swap-with-last removal
    pub(crate) fn swap_remove(&mut self, key: ObjectKey) -> bool {
        match self.objects.iter().position(|&k| k == key) {
            Some(slot) => {
                self.objects.swap_remove(slot);
                true
            }
            None => false,
        }
    }
}
