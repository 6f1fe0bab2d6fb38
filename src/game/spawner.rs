//! Adaptive bubble spawning.
//!
//! Three tiers keep the field from feeling empty or crowded:
//! - the spawn interval halves when under the target density and
//!   stretches when near capacity
//! - a quick retry follows a spawn made while the field was almost empty
//! - an empty field that has waited too long spawns regardless of interval

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::{config::SessionConfig, field::PlayField};

/// Delay before the follow-up spawn on a nearly empty field.
pub const BURST_RETRY_DELAY: Duration = Duration::from_millis(150);

/// An empty field waiting longer than this always gets a bubble.
pub const STARVATION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Pacing state, level-dependent.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Spawner {
    pub base_interval: Duration,
    pub min_interval: Duration,
    pub max_bubbles: usize,
    pub last_spawn: Duration,
    /// Due time of a pending follow-up spawn.
    pub burst_due: Option<Duration>,
}

impl Spawner {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            base_interval: Duration::from_millis(config.initial_spawn_interval_ms),
            min_interval: Duration::from_millis(config.min_spawn_interval_ms),
            max_bubbles: config.initial_max_bubbles,
            last_spawn: Duration::ZERO,
            burst_due: None,
        }
    }

    /// Bubble count the spawner tries to keep on screen.
    pub fn target_density(&self) -> f32 {
        (0.4 * self.max_bubbles as f32).max(4.0)
    }

    /// Spawn interval for the current bubble count.
    pub fn dynamic_interval(&self, count: usize) -> Duration {
        let count = count as f32;
        if count < self.target_density() {
            (self.base_interval / 2).max(self.min_interval)
        } else if count > self.max_bubbles as f32 * 0.8 {
            self.base_interval.mul_f32(1.5)
        } else {
            self.base_interval
        }
    }

    /// Add one bubble if the field has room. Returns whether one was added.
    pub fn spawn(
        &self,
        field: &mut PlayField,
        level: u32,
        config: &SessionConfig,
        rng: &mut impl Rng,
    ) -> bool {
        if field.len() >= self.max_bubbles {
            return false;
        }
        field.spawn_random(level, config, rng);
        true
    }

    /// Run the pacing policy for one tick. Returns the number of bubbles added.
    pub fn tick(
        &mut self,
        field: &mut PlayField,
        level: u32,
        now: Duration,
        config: &SessionConfig,
        rng: &mut impl Rng,
    ) -> usize {
        let mut spawned = 0;

        if let Some(due) = self.burst_due
            && now >= due
        {
            self.burst_due = None;
            if (field.len() as f32) < self.target_density() && self.spawn(field, level, config, rng) {
                spawned += 1;
            }
        }

        let since = now.saturating_sub(self.last_spawn);
        let count = field.len();

        if count == 0 && since > STARVATION_TIMEOUT {
            debug!("Field starved for {:?}, forcing a spawn", since);
            if self.spawn(field, level, config, rng) {
                spawned += 1;
            }
            self.last_spawn = now;
        } else if since > self.dynamic_interval(count) {
            if self.spawn(field, level, config, rng) {
                spawned += 1;
            }
            self.last_spawn = now;
            if count < 2 {
                self.burst_due = Some(now + BURST_RETRY_DELAY);
            }
        }

        spawned
    }

    /// Apply the level formulas for `level`.
    pub fn apply_level(&mut self, level: u32, config: &SessionConfig) {
        self.base_interval = config.spawn_interval_for_level(level);
        self.max_bubbles = config.max_bubbles_for_level(level);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn setup() -> (Spawner, PlayField, SessionConfig, StdRng) {
        let config = SessionConfig::default();
        (
            Spawner::new(&config),
            PlayField::new(800.0, 600.0),
            config,
            StdRng::seed_from_u64(5),
        )
    }

    #[test]
    fn interval_adapts_to_density() {
        let (spawner, ..) = setup();
        // max 12: target 4.8, crowded above 9.6
        assert_eq!(spawner.dynamic_interval(2), Duration::from_millis(300));
        assert_eq!(spawner.dynamic_interval(6), Duration::from_millis(600));
        assert_eq!(spawner.dynamic_interval(10), Duration::from_millis(900));
    }

    #[test]
    fn halved_interval_respects_floor() {
        let (mut spawner, ..) = setup();
        spawner.base_interval = Duration::from_millis(400);
        assert_eq!(spawner.dynamic_interval(0), Duration::from_millis(300));
    }

    #[test]
    fn starvation_guard_spawns_exactly_one() {
        let (mut spawner, mut field, config, mut rng) = setup();
        spawner.last_spawn = Duration::ZERO;

        let spawned = spawner.tick(&mut field, 1, Duration::from_millis(2100), &config, &mut rng);

        assert_eq!(spawned, 1);
        assert_eq!(field.len(), 1);
        assert_eq!(spawner.last_spawn, Duration::from_millis(2100));
    }

    #[test]
    fn no_spawn_before_interval() {
        let (mut spawner, mut field, config, mut rng) = setup();
        for _ in 0..6 {
            field.spawn_random(1, &config, &mut rng);
        }
        spawner.last_spawn = Duration::from_millis(1000);

        let spawned = spawner.tick(&mut field, 1, Duration::from_millis(1500), &config, &mut rng);
        assert_eq!(spawned, 0);
        assert_eq!(field.len(), 6);
    }

    #[test]
    fn burst_retry_follows_sparse_spawn() {
        let (mut spawner, mut field, config, mut rng) = setup();
        field.spawn_random(1, &config, &mut rng);
        spawner.last_spawn = Duration::ZERO;

        let now = Duration::from_millis(400);
        assert_eq!(spawner.tick(&mut field, 1, now, &config, &mut rng), 1);
        assert_eq!(spawner.burst_due, Some(now + BURST_RETRY_DELAY));

        let later = now + BURST_RETRY_DELAY;
        assert_eq!(spawner.tick(&mut field, 1, later, &config, &mut rng), 1);
        assert_eq!(spawner.burst_due, None);
        assert_eq!(field.len(), 3);
    }

    #[test]
    fn full_field_blocks_spawns() {
        let (mut spawner, mut field, config, mut rng) = setup();
        for _ in 0..spawner.max_bubbles {
            field.spawn_random(1, &config, &mut rng);
        }
        let spawned = spawner.tick(&mut field, 1, Duration::from_secs(10), &config, &mut rng);
        assert_eq!(spawned, 0);
        assert_eq!(field.len(), spawner.max_bubbles);
    }

    #[test]
    fn level_formulas_applied_repeatedly() {
        let (mut spawner, _, config, _) = setup();
        for level in 2..=10 {
            spawner.apply_level(level, &config);
            assert_eq!(spawner.base_interval, config.spawn_interval_for_level(level));
            assert_eq!(spawner.max_bubbles, config.max_bubbles_for_level(level));
        }
        assert_eq!(spawner.base_interval, Duration::from_millis(400));
        assert_eq!(spawner.max_bubbles, 20);
    }
}
