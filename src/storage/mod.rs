// World storage: object arena and the chunked spatial index over it

pub mod chunk;
pub mod object_store;
pub mod spatial_index;

pub use chunk::{Chunk, ChunkIndex};
pub use object_store::{ObjectKey, ObjectStore};
pub use spatial_index::{CellQuery, ChunkList, SpatialIndex};
