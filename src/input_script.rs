//! Scripted key timelines used to drive demos without a window.
//!
//! A script is a list of `frame:state:Code` entries separated by commas
//! or whitespace, for example `0:down:KeyD 90:up:KeyD 100:down:Space`.
//! Events scheduled for a frame are delivered before that frame runs.

use std::str::FromStr;

use crate::error::ScriptError;
use crate::input::{KeyCode, KeyEvent};

/// Whether a scripted key goes down, repeats or comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Down(KeyEvent),
    Up(KeyCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedKey {
    pub frame: u64,
    pub transition: KeyTransition,
}

/// Key events ordered by frame; entries on the same frame keep script order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    events: Vec<ScriptedKey>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Events to deliver before `frame` is simulated.
    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = &ScriptedKey> {
        self.events.iter().filter(move |event| event.frame == frame)
    }

    /// Last frame that carries an event.
    pub fn last_frame(&self) -> Option<u64> {
        self.events.last().map(|event| event.frame)
    }
}

impl FromStr for InputScript {
    type Err = ScriptError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut events = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|entry| !entry.is_empty())
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by_key(|event| event.frame);
        Ok(Self { events })
    }
}

fn parse_entry(entry: &str) -> Result<ScriptedKey, ScriptError> {
    let mut parts = entry.splitn(3, ':');
    let (Some(frame), Some(state), Some(code)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ScriptError::Malformed(entry.to_string()));
    };
    let frame = frame
        .parse::<u64>()
        .map_err(|_| ScriptError::InvalidFrame {
            entry: entry.to_string(),
        })?;
    let key = KeyCode::from_name(code).ok_or_else(|| ScriptError::UnknownKey {
        entry: entry.to_string(),
        code: code.to_string(),
    })?;
    let transition = match state.to_ascii_lowercase().as_str() {
        "down" | "press" => KeyTransition::Down(KeyEvent::press(key)),
        "repeat" => KeyTransition::Down(KeyEvent::repeat(key)),
        "up" | "release" => KeyTransition::Up(key),
        _ => {
            return Err(ScriptError::UnknownState {
                entry: entry.to_string(),
                state: state.to_string(),
            })
        }
    };
    Ok(ScriptedKey { frame, transition })
}
