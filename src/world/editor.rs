// Editor commands, applied at the start of a tick

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::storage::ObjectKey;
use crate::utility::GridPosition;
use crate::world::World;

/// Debug/editor input queued by the host between ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Place a prefab, replacing whatever sits on the same layer
    PlacePrefab {
        prefab: String,
        position: GridPosition,
        layer: i32,
    },
    /// Remove the highest-layer object at a cell
    DeleteTopmost { position: GridPosition },
    LayerUp,
    LayerDown,
}

impl World {
    pub fn queue_editor_command(&mut self, command: EditorCommand) {
        self.editor_queue.push_back(command);
    }

    pub fn pending_editor_commands(&self) -> usize {
        self.editor_queue.len()
    }

    /// Apply every queued command in order. Failures are logged and skipped.
    pub(crate) fn process_editor_commands(&mut self) {
        while let Some(command) = self.editor_queue.pop_front() {
            if let Err(err) = self.apply_editor_command(&command) {
                tracing::warn!(?command, %err, "editor command failed");
            }
        }
    }

    /// Apply a single command immediately
    pub fn apply_editor_command(&mut self, command: &EditorCommand) -> Result<Option<ObjectKey>, WorldError> {
        match command {
            EditorCommand::PlacePrefab { prefab, position, layer } => {
                self.place_prefab(prefab, *position, *layer).map(Some)
            }
            EditorCommand::DeleteTopmost { position } => {
                let Some(key) = self.topmost_at(*position) else {
                    return Ok(None);
                };
                self.despawn(key)?;
                Ok(None)
            }
            EditorCommand::LayerUp => {
                self.current_z += 1;
                tracing::info!(z = self.current_z, "editor layer up");
                Ok(None)
            }
            EditorCommand::LayerDown => {
                self.current_z -= 1;
                tracing::info!(z = self.current_z, "editor layer down");
                Ok(None)
            }
        }
    }

    fn place_prefab(&mut self, prefab: &str, position: GridPosition, layer: i32) -> Result<ObjectKey, WorldError> {
        if !self.prefabs.contains(prefab) {
            return Err(WorldError::UnknownPrefab(prefab.to_string()));
        }

        let existing = self
            .query_objects_at(position)
            .iter()
            .find(|&key| self.objects.get(key).is_some_and(|o| o.layer == layer));
        if let Some(existing) = existing {
            let replaced = self.despawn(existing)?;
            debug_log!("editor replaced object {} at {}", replaced.id, position);
        }

        let key = self.spawn(prefab, position)?;
        if let Some(object) = self.objects.get_mut(key) {
            object.layer = layer;
        }
        Ok(key)
    }
}
