macro_rules! debug_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "debug_logs") {
            tracing::debug!($($arg)*);
        }
    };
}

pub mod config;  // Centralized configuration constants
pub mod error;
pub mod logging;
pub mod input;
pub mod shared;
pub mod utility;
pub mod storage;  // Object arena and chunked spatial index
pub mod npc;
pub mod combat;
pub mod events;  // World event queue
pub mod world;
pub mod db;  // Chunk file persistence

pub use config::WorldConfig;
pub use error::{ConfigError, PathError, WorldError};
pub use input::{InputState, Keys};
pub use shared::SharedWorld;
pub use storage::ObjectKey;
pub use utility::{GridPos2, GridPosition};
pub use world::{TickReport, World};
