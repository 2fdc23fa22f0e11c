// Per-tick sprite queue handed to the renderer

use crate::utility::GridPosition;

/// One sprite to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub texture_id: u32,
    pub position: GridPosition,
    pub layer: i32,
    /// Fractional cell offset while a step animation is in flight
    pub offset: (f32, f32),
}

/// Bounded sprite queue, cleared at the start of every tick
pub struct RenderQueue {
    sprites: Vec<SpriteDraw>,
    capacity: usize,
    dropped: usize,
}

impl RenderQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sprites: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.dropped = 0;
    }

    /// Queue a sprite; drops it once the frame budget is used up
    pub fn push(&mut self, sprite: SpriteDraw) -> bool {
        if self.sprites.len() >= self.capacity {
            if self.dropped == 0 {
                tracing::error!(capacity = self.capacity, "sprite queue full");
            }
            self.dropped += 1;
            return false;
        }
        self.sprites.push(sprite);
        true
    }

    pub fn sprites(&self) -> &[SpriteDraw] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Sprites dropped this tick
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
