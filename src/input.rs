// Input snapshot polled once per tick
//
// The window layer fills this in; the world only reads it.

use bitflags::bitflags;

bitflags! {
    /// Keys the simulation reacts to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Keys: u16 {
        const UP       = 0b0000_0001;
        const DOWN     = 0b0000_0010;
        const LEFT     = 0b0000_0100;
        const RIGHT    = 0b0000_1000;
        const INTERACT = 0b0001_0000;
    }
}

/// Keys held down and keys pressed this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub down: Keys,
    pub pressed: Keys,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys held down (and newly pressed)
    pub fn holding(keys: Keys) -> Self {
        Self { down: keys, pressed: keys }
    }

    #[inline]
    pub fn is_down(&self, key: Keys) -> bool {
        self.down.contains(key)
    }

    #[inline]
    pub fn is_pressed(&self, key: Keys) -> bool {
        self.pressed.contains(key)
    }

    /// Movement axis: x = right - left, y = down - up
    pub fn axis(&self) -> (i32, i32) {
        let x = self.is_down(Keys::RIGHT) as i32 - self.is_down(Keys::LEFT) as i32;
        let y = self.is_down(Keys::DOWN) as i32 - self.is_down(Keys::UP) as i32;
        (x, y)
    }
}
