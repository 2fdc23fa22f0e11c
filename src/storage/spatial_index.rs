/// Chunked spatial index over the object store
///
/// World space is cut into square chunks of `chunk_size` cells per axis.
/// Each chunk holds the handles of the objects whose position falls inside
/// it. Proximity queries only scan the chunks they touch.
///
/// Chunks come from a bounded pool and are looked up by a linear scan over
/// the active ones. Active counts stay in the tens, so the scan beats a hash
/// map here and never allocates. A chunk is created on the first insert at
/// an unseen coordinate and lives for the rest of the session, even when
/// empty.

use smallvec::SmallVec;

use crate::config::{map, WorldConfig};
use crate::error::WorldError;
use crate::storage::chunk::{Chunk, ChunkIndex};
use crate::storage::object_store::{ObjectKey, ObjectStore};
use crate::utility::{chunk_coord_of, ChunkCoord, GridPosition};
use crate::world::object::Object;

/// Objects found in one cell, at most `MAX_LAYERS` of them
#[derive(Debug, Clone, Default)]
pub struct CellQuery {
    pub objects: SmallVec<[ObjectKey; map::MAX_LAYERS]>,
    /// Matches dropped because the result was full
    pub overflow: usize,
}

impl CellQuery {
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflow > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.objects.iter().copied()
    }
}

/// Visible chunk window around the camera
pub type ChunkList = SmallVec<[ChunkIndex; 16]>;

pub struct SpatialIndex {
    chunks: Vec<Chunk>,
    chunk_size: i32,
    max_chunks: usize,
    chunk_capacity: usize,
}

impl SpatialIndex {
    pub fn new(config: &WorldConfig) -> Self {
        Self::with_limits(config.chunk_size, config.max_chunks, config.chunk_max_objects)
    }

    pub fn with_limits(chunk_size: i32, max_chunks: usize, chunk_capacity: usize) -> Self {
        Self {
            chunks: Vec::with_capacity(max_chunks),
            chunk_size: chunk_size.max(1),
            max_chunks,
            chunk_capacity,
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    #[inline]
    pub fn chunk_coord_of(&self, pos: GridPosition) -> ChunkCoord {
        chunk_coord_of(pos, self.chunk_size)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, index: ChunkIndex) -> Option<&Chunk> {
        self.chunks.get(index.0)
    }

    /// Linear scan of the active pool
    pub fn find_chunk(&self, coord: ChunkCoord) -> Option<ChunkIndex> {
        self.chunks
            .iter()
            .position(|chunk| chunk.coord() == coord)
            .map(ChunkIndex)
    }

    /// Find or allocate the chunk at `coord`
    pub fn ensure_chunk(&mut self, coord: ChunkCoord) -> Result<ChunkIndex, WorldError> {
        if let Some(index) = self.find_chunk(coord) {
            return Ok(index);
        }
        if self.chunks.len() >= self.max_chunks {
            tracing::error!(%coord, capacity = self.max_chunks, "chunk pool full");
            return Err(WorldError::ChunkPoolFull { capacity: self.max_chunks });
        }
        self.chunks.push(Chunk::new(coord, self.chunk_capacity));
        tracing::debug!(%coord, count = self.chunks.len(), "chunk created");
        Ok(ChunkIndex(self.chunks.len() - 1))
    }

    /// Bucket an object by its current position and record the owning chunk
    pub fn insert(&mut self, key: ObjectKey, object: &mut Object) -> Result<ChunkIndex, WorldError> {
        let coord = self.chunk_coord_of(object.position);
        let index = self.ensure_chunk(coord)?;
        let chunk = &mut self.chunks[index.0];
        if !chunk.push(key) {
            tracing::error!(%coord, id = object.id, capacity = self.chunk_capacity, "chunk full");
            return Err(WorldError::ChunkFull { coord, capacity: self.chunk_capacity });
        }
        object.chunk = Some(index);
        debug_log!("object {} added to chunk {}", object.id, coord);
        Ok(index)
    }

    /// Unbucket an object and clear its chunk back-reference.
    /// Returns false (and warns) when the object is not in any chunk.
    pub fn remove(&mut self, key: ObjectKey, object: &mut Object) -> bool {
        let Some(index) = object.chunk.take() else {
            tracing::warn!(id = object.id, "remove: object has no chunk");
            return false;
        };
        let removed = self
            .chunks
            .get_mut(index.0)
            .is_some_and(|chunk| chunk.swap_remove(key));
        if !removed {
            tracing::warn!(id = object.id, chunk = index.0, "remove: object missing from its chunk");
        }
        removed
    }

    /// Move an object to the chunk matching its position if it changed.
    ///
    /// Returns `Ok(true)` when the object moved. On failure the object stays
    /// in its old chunk so it is still iterated, and the move is retried on
    /// the next call.
    pub fn rebucket(&mut self, key: ObjectKey, object: &mut Object) -> Result<bool, WorldError> {
        let coord = self.chunk_coord_of(object.position);
        let current = object.chunk.and_then(|index| self.chunks.get(index.0));
        if current.is_some_and(|chunk| chunk.coord() == coord) {
            return Ok(false);
        }

        // Make sure the destination has room before leaving the old chunk
        let target = self.ensure_chunk(coord)?;
        if self.chunks[target.0].is_full() {
            tracing::error!(%coord, id = object.id, "rebucket: destination chunk full");
            return Err(WorldError::ChunkFull { coord, capacity: self.chunk_capacity });
        }

        if object.chunk.is_some() {
            self.remove(key, object);
        }
        self.insert(key, object)?;
        Ok(true)
    }

    /// Objects at exactly `pos`, in chunk order, capped at `MAX_LAYERS`.
    /// Extra matches are counted in `overflow` and logged.
    pub fn query_at(&self, store: &ObjectStore, pos: GridPosition) -> CellQuery {
        let mut result = CellQuery::default();
        let Some(index) = self.find_chunk(self.chunk_coord_of(pos)) else {
            return result;
        };

        for &key in self.chunks[index.0].objects() {
            let Some(object) = store.get(key) else {
                continue;
            };
            if object.position != pos {
                continue;
            }
            if result.objects.len() < map::MAX_LAYERS {
                result.objects.push(key);
            } else {
                result.overflow += 1;
            }
        }

        if result.overflowed() {
            tracing::error!(%pos, dropped = result.overflow, "max layers reached in cell query");
        }
        result
    }

    /// Whether any collidable object occupies `pos`
    pub fn is_blocked(&self, store: &ObjectStore, pos: GridPosition) -> bool {
        let Some(index) = self.find_chunk(self.chunk_coord_of(pos)) else {
            return false;
        };
        self.chunks[index.0]
            .objects()
            .iter()
            .filter_map(|&key| store.get(key))
            .any(|object| object.collidable && object.position == pos)
    }

    /// Chunks within `radius_x` / `radius_y` chunks of `center` on the same z
    pub fn chunks_around(&self, center: ChunkCoord, radius_x: i32, radius_y: i32) -> ChunkList {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| {
                let c = chunk.coord();
                c.z == center.z
                    && (c.x - center.x).abs() <= radius_x
                    && (c.y - center.y).abs() <= radius_y
            })
            .map(|(i, _)| ChunkIndex(i))
            .collect()
    }

    /// Copy the membership of `chunks` into `out` (cleared first).
    /// The tick loop iterates this copy while the live chunks change.
    pub fn snapshot_into(&self, chunks: &[ChunkIndex], out: &mut Vec<ObjectKey>) {
        out.clear();
        for index in chunks {
            if let Some(chunk) = self.chunks.get(index.0) {
                out.extend_from_slice(chunk.objects());
            }
        }
    }

    /// Drop every chunk (world reload)
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
