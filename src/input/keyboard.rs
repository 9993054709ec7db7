use std::collections::HashSet;
use std::hash::Hash;

use winit::event::{DeviceEvent, ElementState, RawKeyEvent};
use winit::keyboard::PhysicalKey;

/// Keys currently held. A key counts once per press; OS auto-repeat
/// re-sends the press without a release and is ignored.
#[derive(Debug)]
pub struct HeldKeys<K> {
    held: HashSet<K>,
}

impl<K> Default for HeldKeys<K> {
    fn default() -> Self {
        Self {
            held: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> HeldKeys<K> {
    /// Returns true for a fresh press.
    pub fn press(&mut self, key: K) -> bool {
        self.held.insert(key)
    }

    pub fn release(&mut self, key: &K) {
        self.held.remove(key);
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

pub type KeyTracker = HeldKeys<PhysicalKey>;

impl KeyTracker {
    /// Feed a raw key event. True when it is a new press.
    pub fn handle(&mut self, event: &RawKeyEvent) -> bool {
        match event.state {
            ElementState::Pressed => self.press(event.physical_key),
            ElementState::Released => {
                self.release(&event.physical_key);
                false
            }
        }
    }
}

/// Every mouse button press counts, repeated or not.
pub fn is_mouse_press(event: &DeviceEvent) -> bool {
    matches!(
        event,
        DeviceEvent::Button {
            state: ElementState::Pressed,
            ..
        }
    )
}
