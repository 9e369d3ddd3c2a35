//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Used for continuous actions like player movement.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()`. Used for toggles
//!   (camera mode, lighting and grading hotkeys) so a held key fires once.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    W,
    A,
    S,
    D,
    F,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Digit0,
    Escape,
}

impl Key {
    pub const ALL: &'static [Key] = &[
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::F,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
        Key::Digit9,
        Key::Digit0,
        Key::Escape,
    ];
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Make exactly `keys` held, producing press/release edges for the
    /// difference with the current state.
    pub fn set_held(&mut self, keys: &HashSet<Key>) {
        for &key in Key::ALL {
            if keys.contains(&key) {
                self.key_down(key);
            } else {
                self.key_up(key);
            }
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    /// -1, 0 or 1 from a negative/positive key pair. Both held cancel out.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut value = 0.0;
        if self.is_held(negative) {
            value -= 1.0;
        }
        if self.is_held(positive) {
            value += 1.0;
        }
        value
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        assert!(input.is_held(Key::A));
        assert!(input.is_just_pressed(Key::A));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        input.key_up(Key::A);
        assert!(!input.is_held(Key::A));
        assert!(input.is_just_released(Key::A));
    }

    #[test]
    fn test_key_down_repeat_does_not_refire_after_end_frame() {
        let mut input = InputState::new();
        input.key_down(Key::F);
        input.end_frame();
        // OS key repeat delivers another press while the key is still held.
        input.key_down(Key::F);
        assert!(input.is_held(Key::F));
        assert!(!input.is_just_pressed(Key::F));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::A);
        assert!(!input.is_just_released(Key::A));
        assert!(!input.is_held(Key::A));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.key_down(Key::Digit8);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::W));
        assert!(!input.is_just_pressed(Key::Digit8));
        // Held state persists across frames.
        assert!(input.is_held(Key::W));
        assert!(input.is_held(Key::Digit8));
    }

    #[test]
    fn test_axis_combines_key_pair() {
        let mut input = InputState::new();
        assert_eq!(input.axis(Key::A, Key::D), 0.0);
        input.key_down(Key::A);
        assert_eq!(input.axis(Key::A, Key::D), -1.0);
        input.key_down(Key::D);
        assert_eq!(input.axis(Key::A, Key::D), 0.0);
        input.key_up(Key::A);
        assert_eq!(input.axis(Key::A, Key::D), 1.0);
    }

    #[test]
    fn test_set_held_generates_edges() {
        let mut input = InputState::new();
        input.set_held(&HashSet::from([Key::W, Key::F]));
        assert!(input.is_just_pressed(Key::W));
        assert!(input.is_just_pressed(Key::F));
        input.end_frame();

        input.set_held(&HashSet::from([Key::W]));
        assert!(input.is_held(Key::W));
        assert!(!input.is_just_pressed(Key::W));
        assert!(input.is_just_released(Key::F));
    }

    #[test]
    fn test_key_names_deserialize_snake_case() {
        let keys: Vec<Key> = serde_json::from_str(r#"["w", "digit0", "escape"]"#)
            .expect("key names should parse");
        assert_eq!(keys, vec![Key::W, Key::Digit0, Key::Escape]);
    }
}
