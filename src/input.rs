use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    /// Parses a physical key code as reported by the browser (`KeyboardEvent.code`),
    /// e.g. `KeyW`, `Space`, `ArrowLeft`, `Digit3` or `F5`.
    pub fn from_code(code: &str) -> Option<Self> {
        if let Some(letter) = code.strip_prefix("Key") {
            let mut chars = letter.chars();
            return match (chars.next(), chars.next()) {
                (Some(ch), None) if ch.is_ascii_alphabetic() => {
                    Some(Self::Character(ch.to_ascii_uppercase()))
                }
                _ => None,
            };
        }
        if let Some(digit) = code.strip_prefix("Digit") {
            return match digit.parse::<u8>() {
                Ok(value) if value <= 9 => Some(Self::Digit(value)),
                _ => None,
            };
        }
        if let Some(key) = parse_named_key(code) {
            return Some(key);
        }
        if let Some(function) = code.strip_prefix('F') {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=24).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }

    /// Parses a loose, human friendly key name (`W`, `space`, `Left`) in
    /// addition to everything [`KeyCode::from_code`] accepts.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = Self::from_code(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if let Some(digit) = ch.to_digit(10) {
                return Some(Self::Digit(digit as u8));
            }
        }
        match name.to_ascii_lowercase().as_str() {
            "space" => Some(Self::Named(NamedKey::Space)),
            "left" => Some(Self::Named(NamedKey::Left)),
            "right" => Some(Self::Named(NamedKey::Right)),
            "up" => Some(Self::Named(NamedKey::Up)),
            "down" => Some(Self::Named(NamedKey::Down)),
            "escape" | "esc" => Some(Self::Named(NamedKey::Escape)),
            _ => None,
        }
    }
}

fn parse_named_key(code: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match code {
        "Space" => Space,
        "Enter" | "NumpadEnter" => Enter,
        "Tab" => Tab,
        "ArrowLeft" => Left,
        "ArrowRight" => Right,
        "ArrowUp" => Up,
        "ArrowDown" => Down,
        "Escape" => Escape,
        "Backspace" => Backspace,
        "ShiftLeft" => LeftShift,
        "ShiftRight" => RightShift,
        "ControlLeft" => LeftCtrl,
        "ControlRight" => RightCtrl,
        "AltLeft" => LeftAlt,
        "AltRight" => RightAlt,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-character keys the demos care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

/// A key press as delivered by the host event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    /// Set when the platform generated the event from a held key.
    pub repeat: bool,
}

impl KeyEvent {
    pub fn press(code: KeyCode) -> Self {
        Self {
            code,
            repeat: false,
        }
    }

    pub fn repeat(code: KeyCode) -> Self {
        Self { code, repeat: true }
    }
}

/// Sign of a movement key along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Positive => 1.0,
        }
    }
}

/// What a bound key does to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveX(Direction),
    MoveZ(Direction),
    Jump,
}

/// Maps physical keys to player actions.
#[derive(Debug, Clone)]
pub struct ControlBindings {
    actions: HashMap<KeyCode, Action>,
}

impl ControlBindings {
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn bind(mut self, code: KeyCode, action: Action) -> Self {
        self.actions.insert(code, action);
        self
    }

    pub fn action(&self, code: KeyCode) -> Option<Action> {
        self.actions.get(&code).copied()
    }
}

impl Default for ControlBindings {
    /// `W`/`S` move along -z/+z, `A`/`D` along -x/+x, `Space` jumps.
    fn default() -> Self {
        Self::empty()
            .bind(KeyCode::Character('W'), Action::MoveZ(Direction::Negative))
            .bind(KeyCode::Character('S'), Action::MoveZ(Direction::Positive))
            .bind(KeyCode::Character('A'), Action::MoveX(Direction::Negative))
            .bind(KeyCode::Character('D'), Action::MoveX(Direction::Positive))
            .bind(KeyCode::Named(NamedKey::Space), Action::Jump)
    }
}

/// Movement intent and jump latch of the controlled player.
///
/// Only the controller's key handlers write to it; the frame loop reads
/// it once per step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub(crate) move_x: f32,
    pub(crate) move_z: f32,
    pub(crate) airborne: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commanded velocity along x: `-speed`, `0` or `+speed`.
    pub fn move_x(&self) -> f32 {
        self.move_x
    }

    /// Commanded velocity along z: `-speed`, `0` or `+speed`.
    pub fn move_z(&self) -> f32 {
        self.move_z
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn is_idle(&self) -> bool {
        self.move_x == 0.0 && self.move_z == 0.0
    }
}
