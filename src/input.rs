//! Logical input state
//!
//! Event handlers write, the frame tick reads. Pointer deltas accumulate
//! between ticks and are drained by the controller that consumes them.

use std::collections::HashSet;

/// Logical keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
    ZoomIn,
    ZoomOut,
    Digit(u8),
    ToggleColors,
    TogglePanel,
    ToggleMode,
    /// Back to the start pose
    Home,
}

impl Key {
    /// Keys whose held state drives a controller
    pub fn is_motion(self) -> bool {
        !matches!(
            self,
            Key::Digit(_) | Key::ToggleColors | Key::TogglePanel | Key::ToggleMode | Key::Home
        )
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pointer_down: bool,
    drag_delta: [f64; 2],
    scroll_delta: f64,
}

impl InputState {
    /// Record a key press; returns true on the press edge (key was not already held)
    pub fn press(&mut self, key: Key) -> bool {
        self.held.insert(key)
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn set_pointer_down(&mut self, down: bool) {
        self.pointer_down = down;
    }

    pub fn add_drag(&mut self, dx: f64, dy: f64) {
        if self.pointer_down {
            self.drag_delta[0] += dx;
            self.drag_delta[1] += dy;
        }
    }

    pub fn add_scroll(&mut self, delta: f64) {
        self.scroll_delta += delta;
    }

    /// Take the accumulated drag and scroll, resetting both
    pub fn drain_pointer(&mut self) -> ([f64; 2], f64) {
        let drag = std::mem::take(&mut self.drag_delta);
        let scroll = std::mem::take(&mut self.scroll_delta);
        (drag, scroll)
    }

    /// Anything that should advance the active controller this frame
    pub fn is_active(&self) -> bool {
        self.held.iter().any(|k| k.is_motion())
            || self.pointer_down
            || self.scroll_delta != 0.0
            || self.drag_delta != [0.0, 0.0]
    }

    /// -1, 0 or +1 from a pair of opposing keys
    pub fn axis(&self, positive: Key, negative: Key) -> f64 {
        let mut v = 0.0;
        if self.is_held(positive) {
            v += 1.0;
        }
        if self.is_held(negative) {
            v -= 1.0;
        }
        v
    }

    /// Forget everything held, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.held.clear();
        self.pointer_down = false;
        self.drag_delta = [0.0, 0.0];
        self.scroll_delta = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edge() {
        let mut input = InputState::default();
        assert!(input.press(Key::ToggleMode));
        assert!(!input.press(Key::ToggleMode));
        input.release(Key::ToggleMode);
        assert!(input.press(Key::ToggleMode));
    }

    #[test]
    fn test_toggles_do_not_count_as_motion() {
        let mut input = InputState::default();
        input.press(Key::ToggleColors);
        input.press(Key::Digit(4));
        assert!(!input.is_active());
        input.press(Key::Forward);
        assert!(input.is_active());
    }

    #[test]
    fn test_drag_only_while_pointer_down() {
        let mut input = InputState::default();
        input.add_drag(5.0, 5.0);
        assert_eq!(input.drain_pointer(), ([0.0, 0.0], 0.0));
        input.set_pointer_down(true);
        input.add_drag(3.0, -1.0);
        input.add_scroll(2.0);
        assert_eq!(input.drain_pointer(), ([3.0, -1.0], 2.0));
        assert_eq!(input.drain_pointer(), ([0.0, 0.0], 0.0));
    }

    #[test]
    fn test_axis() {
        let mut input = InputState::default();
        input.press(Key::Forward);
        assert_eq!(input.axis(Key::Forward, Key::Back), 1.0);
        input.press(Key::Back);
        assert_eq!(input.axis(Key::Forward, Key::Back), 0.0);
    }
}
