// Thread-shareable world handle
//
// Every mutation goes through one lock, held for a whole tick. The event
// queue is lock-free and can be drained without taking the world lock.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::events::EventQueue;
use crate::input::InputState;
use crate::world::editor::EditorCommand;
use crate::world::{TickReport, World};

#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
    events: EventQueue,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        let events = world.event_queue();
        Self {
            inner: Arc::new(Mutex::new(world)),
            events,
        }
    }

    /// Run one tick under the lock
    pub fn tick(&self, dt_ms: u64, input: &InputState) -> TickReport {
        self.inner.lock().tick(dt_ms, input)
    }

    pub fn read<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Queue an editor command for the next tick
    pub fn queue_editor_command(&self, command: EditorCommand) {
        self.inner.lock().queue_editor_command(command);
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WorldEvent;
    use crate::utility::GridPosition;
    use crate::world::prefabs::names;
    use crate::world::test_support::test_world;

    #[test]
    fn test_commands_from_other_threads() {
        let shared = SharedWorld::new(test_world());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.queue_editor_command(EditorCommand::PlacePrefab {
                        prefab: names::EMPTY_TILE.to_string(),
                        position: GridPosition::new(i, 0, 0),
                        layer: 0,
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.tick(16, &InputState::new());
        assert_eq!(shared.read(|world| world.objects().len()), 4);

        let spawned = std::iter::from_fn(|| shared.events().pop())
            .filter(|event| matches!(event, WorldEvent::ObjectSpawned { .. }))
            .count();
        assert_eq!(spawned, 4);
    }
}
