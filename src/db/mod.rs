/// World persistence
///
/// Chunks are stored in a flat binary file: a 16-bit chunk count followed by
/// fixed-size chunk records in pool order. There is no version field and no
/// checksum, so any change to the record layout breaks existing saves.

pub mod chunk_file;

pub use chunk_file::{load_chunks, save_chunks, ChunkRecord, ObjectRecord};

use thiserror::Error;

/// Save and load failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("chunk file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode chunk file: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode chunk file: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("chunk file holds {count} chunks, pool capacity is {capacity}")]
    TooManyChunks { count: usize, capacity: usize },

    #[error("chunk {coord:?} holds {count} objects, record capacity is {capacity}")]
    RecordOverflow { coord: [i32; 3], count: usize, capacity: usize },

    #[error("object {id} has unknown {field} value {value}")]
    InvalidRecord { id: i32, field: &'static str, value: i32 },

    #[error(transparent)]
    World(#[from] crate::error::WorldError),
}
