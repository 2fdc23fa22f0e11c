// World event queue
//
// The simulation pushes events while it ticks; collaborators drain them
// afterwards. The queue is lock-free so a host may drain from another
// thread without holding the world lock.

pub mod types;

use crossbeam_queue::SegQueue;
use std::sync::Arc;

pub use types::WorldEvent;

/// Shared handle to the event queue
#[derive(Clone, Default)]
pub struct EventQueue {
    queue: Arc<SegQueue<WorldEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: WorldEvent) {
        self.queue.push(event);
    }

    /// Get next event from queue
    pub fn pop(&self) -> Option<WorldEvent> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pop everything currently queued
    pub fn drain(&self) -> Vec<WorldEvent> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo_and_shared() {
        let queue = EventQueue::new();
        let reader = queue.clone();
        queue.push(WorldEvent::ObjectDespawned { id: 1 });
        queue.push(WorldEvent::ObjectDespawned { id: 2 });

        assert_eq!(reader.len(), 2);
        assert_eq!(reader.pop(), Some(WorldEvent::ObjectDespawned { id: 1 }));
        assert_eq!(reader.drain(), vec![WorldEvent::ObjectDespawned { id: 2 }]);
        assert!(queue.is_empty());
    }
}
