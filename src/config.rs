//! Player-facing configuration: difficulty tiers and ship loadout

use serde::{Deserialize, Serialize};

/// Difficulty tier selected at game start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Cadet,
    #[default]
    Pilot,
    Ace,
}

impl Difficulty {
    /// Score multiplier applied to every enemy reward
    pub fn score_modifier(self) -> f32 {
        match self {
            Difficulty::Cadet => 0.5,
            Difficulty::Pilot => 0.75,
            Difficulty::Ace => 1.0,
        }
    }

    /// Extra delay added to every enemy pattern's cadence, ms
    pub fn pattern_delay_bonus_ms(self) -> u64 {
        match self {
            Difficulty::Cadet => 500,
            Difficulty::Pilot => 250,
            Difficulty::Ace => 0,
        }
    }
}

/// The player ship's starting equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    pub plane: String,
    pub lives: u32,
    /// Movement speed, pixels per tick
    pub speed: f32,
    pub bombs: u32,
    pub shot_delay_ms: u64,
    pub bullet_type: String,
    pub bomb_type: String,
    pub bullets_per_shot: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            plane: "f16".to_string(),
            lives: 10,
            speed: 4.0,
            bombs: 12,
            shot_delay_ms: 100,
            bullet_type: "playerbullet_green".to_string(),
            bomb_type: "bomb_ring_green".to_string(),
            bullets_per_shot: 5,
        }
    }
}
