use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

impl KeyCode {
    pub const W: Self = Self::Character('W');
    pub const A: Self = Self::Character('A');
    pub const S: Self = Self::Character('S');
    pub const D: Self = Self::Character('D');

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            _ => None,
        }
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Escape" | "Esc" => Escape,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" => LeftCtrl,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-character keys the samples react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Escape,
    LeftShift,
    RightShift,
    LeftCtrl,
    Up,
    Down,
    Left,
    Right,
}

/// Input gathered by the host between two frames.
///
/// Mouse and scroll deltas accumulate until the frame consumes them with
/// [`InputState::take_mouse_delta`] and [`InputState::take_scroll`].
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    focused: bool,
    mouse_delta: Vec2,
    scroll: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
            focused: true,
            mouse_delta: Vec2::ZERO,
            scroll: 0.0,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Records a focus change. Losing focus releases every key and drops
    /// pending mouse movement so the view does not jerk when focus returns.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.keys.clear();
            self.mouse_delta = Vec2::ZERO;
        }
    }

    /// Adds a relative mouse movement in pixels, as reported by raw device
    /// motion.
    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    /// Adds a scroll wheel movement. Positive values scroll up.
    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }

    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }
}
