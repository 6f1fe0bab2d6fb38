//! Tunable gameplay numbers.
//!
//! Defaults reproduce the classic balance. A `config.json` in the user's
//! data directory can override any subset of fields.

use std::{fs, path::PathBuf, time::Duration};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<SessionConfig>();
    app.insert_resource(SessionConfig::load());
}

/// Gameplay tunables shared by the spawner, scoring and session.
#[derive(Resource, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct SessionConfig {
    /// Length of a round before bonus time, in seconds.
    pub round_seconds: u32,
    /// Seconds added by a bonus-time bubble.
    pub bonus_bubble_seconds: u32,
    /// Seconds added on every level-up.
    pub level_up_seconds: u32,
    /// Score lost when a bubble reaches the ceiling.
    pub ceiling_penalty: u32,
    /// Height of the ceiling band at the top of the field.
    pub ceiling_height: f32,
    /// Points needed per level.
    pub points_per_level: u32,
    /// Base spawn interval at level 1, in milliseconds.
    pub initial_spawn_interval_ms: u64,
    /// Max concurrent bubbles at level 1.
    pub initial_max_bubbles: usize,
    /// Level formula: `max(min, start - step * level)`.
    pub level_interval_start_ms: u64,
    pub level_interval_step_ms: u64,
    pub level_interval_min_ms: u64,
    /// Level formula: `min(cap, initial + step * level)`.
    pub max_bubbles_step: usize,
    pub max_bubbles_cap: usize,
    /// Floor for the accelerated spawn interval.
    pub min_spawn_interval_ms: u64,
    /// Bubbles seeded on start and restart.
    pub initial_batch: usize,
    /// Cumulative probability bands on a single uniform draw.
    pub slow_chance: f32,
    pub bomb_chance: f32,
    pub bonus_time_chance: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60,
            bonus_bubble_seconds: 10,
            level_up_seconds: 10,
            ceiling_penalty: 5,
            ceiling_height: 30.0,
            points_per_level: 500,
            initial_spawn_interval_ms: 600,
            initial_max_bubbles: 12,
            level_interval_start_ms: 800,
            level_interval_step_ms: 80,
            level_interval_min_ms: 400,
            max_bubbles_step: 1,
            max_bubbles_cap: 20,
            min_spawn_interval_ms: 300,
            initial_batch: 5,
            slow_chance: 0.05,
            bomb_chance: 0.05,
            bonus_time_chance: 0.10,
        }
    }
}

impl SessionConfig {
    /// Base spawn interval for a level reached through level-ups.
    pub fn spawn_interval_for_level(&self, level: u32) -> Duration {
        let step = self.level_interval_step_ms.saturating_mul(u64::from(level));
        let ms = self
            .level_interval_start_ms
            .saturating_sub(step)
            .max(self.level_interval_min_ms);
        Duration::from_millis(ms)
    }

    /// Max concurrent bubbles for a level reached through level-ups.
    pub fn max_bubbles_for_level(&self, level: u32) -> usize {
        (self.initial_max_bubbles + self.max_bubbles_step * level as usize)
            .min(self.max_bubbles_cap)
    }

    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("bubble-pop").join("config.json"))
    }

    /// Load overrides from disk, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded session config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse session config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read session config: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_formulas_respect_floor_and_cap() {
        let config = SessionConfig::default();
        assert_eq!(config.spawn_interval_for_level(2), Duration::from_millis(640));
        assert_eq!(config.spawn_interval_for_level(5), Duration::from_millis(400));
        assert_eq!(config.spawn_interval_for_level(40), Duration::from_millis(400));
        assert_eq!(config.max_bubbles_for_level(2), 14);
        assert_eq!(config.max_bubbles_for_level(8), 20);
        assert_eq!(config.max_bubbles_for_level(100), 20);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "round_seconds": 90 }"#).unwrap();
        assert_eq!(config.round_seconds, 90);
        assert_eq!(config.initial_max_bubbles, 12);
    }
}
