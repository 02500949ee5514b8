use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::controller::Arena;
use crate::error::DemoError;

/// Which of the two demos a scene runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    /// A cube over a floor that follows it; no physics, no controls.
    #[default]
    Static,
    /// A keyboard-driven box in a walled arena under gravity.
    Physics,
}

impl FromStr for DemoKind {
    type Err = DemoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" | "cube" => Ok(Self::Static),
            "physics" | "arena" => Ok(Self::Physics),
            other => Err(DemoError::UnknownDemo(other.to_string())),
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Physics => "physics",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSettings {
    pub half_extent: f32,
    pub border: f32,
    pub wall_height: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            half_extent: 20.0,
            border: 1.0,
            wall_height: 2.0,
        }
    }
}

impl ArenaSettings {
    pub fn arena(&self) -> Arena {
        Arena::new(self.half_extent, self.border)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub speed: f32,
    pub jump_impulse: f32,
    pub mass: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            jump_impulse: 5.0,
            mass: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    /// Fixed simulation step taken once per rendered frame, in seconds.
    pub timestep: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            timestep: 1.0 / 60.0,
        }
    }
}

/// Tuning values read from a scene's `<settings>` block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemoSettings {
    pub demo: DemoKind,
    /// Clear colour, linear 0..1.
    pub background: Vec3,
    pub arena: ArenaSettings,
    pub player: PlayerSettings,
    pub physics: PhysicsSettings,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            demo: DemoKind::default(),
            background: Vec3::new(135.0 / 255.0, 206.0 / 255.0, 235.0 / 255.0),
            arena: ArenaSettings::default(),
            player: PlayerSettings::default(),
            physics: PhysicsSettings::default(),
        }
    }
}

impl DemoSettings {
    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), DemoError> {
        let positive = |name: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DemoError::InvalidSetting {
                    name,
                    reason: format!("expected a positive number, got {value}"),
                })
            }
        };
        positive("arena.half_extent", self.arena.half_extent)?;
        positive("arena.wall_height", self.arena.wall_height)?;
        positive("player.mass", self.player.mass)?;
        positive("physics.timestep", self.physics.timestep)?;
        if !(self.arena.border >= 0.0 && self.arena.border < self.arena.half_extent) {
            return Err(DemoError::InvalidSetting {
                name: "arena.border",
                reason: format!(
                    "must be in [0, {}), got {}",
                    self.arena.half_extent, self.arena.border
                ),
            });
        }
        if !self.player.speed.is_finite() || !self.player.jump_impulse.is_finite() {
            return Err(DemoError::InvalidSetting {
                name: "player",
                reason: "speed and jump_impulse must be finite".to_string(),
            });
        }
        Ok(())
    }
}
