//! Power-ups granted by special bubbles.
//!
//! Slow motion is the only timed power-up. Popping another slow bubble
//! while it is active restarts the timer instead of extending it.

use std::time::Duration;

use bevy::prelude::*;

/// How long slow motion lasts after a slow bubble is popped.
pub const SLOW_MOTION_DURATION: Duration = Duration::from_secs(5);

/// Fraction of normal speed while slowed.
pub const SLOW_MOTION_MULTIPLIER: f32 = 0.3;

/// Slow-motion state, timed against the session clock.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct SlowMotion {
    pub active: bool,
    pub expires_at: Duration,
    pub duration: Duration,
    pub speed_multiplier: f32,
}

impl Default for SlowMotion {
    fn default() -> Self {
        Self {
            active: false,
            expires_at: Duration::ZERO,
            duration: SLOW_MOTION_DURATION,
            speed_multiplier: SLOW_MOTION_MULTIPLIER,
        }
    }
}

impl SlowMotion {
    /// Start (or restart) slow motion at `now`.
    pub fn activate(&mut self, now: Duration) {
        self.active = true;
        self.expires_at = now + self.duration;
        info!("Slow motion until {:.1}s", self.expires_at.as_secs_f32());
    }

    /// Deactivate once the expiry has passed.
    pub fn update(&mut self, now: Duration) {
        if self.active && now > self.expires_at {
            self.active = false;
            info!("Slow motion expired");
        }
    }

    /// Multiplier applied to every bubble's speed this tick.
    pub fn speed_factor(&self) -> f32 {
        if self.active {
            self.speed_multiplier
        } else {
            1.0
        }
    }

    /// Fraction of the slow-motion window still remaining (for the HUD bar).
    pub fn remaining_fraction(&self, now: Duration) -> f32 {
        if !self.active || self.duration.is_zero() {
            return 0.0;
        }
        let left = self.expires_at.saturating_sub(now);
        (left.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactivation_resets_instead_of_stacking() {
        let mut slow = SlowMotion::default();
        slow.activate(Duration::from_secs(1));
        slow.activate(Duration::from_secs(3));
        assert_eq!(slow.expires_at, Duration::from_secs(3) + SLOW_MOTION_DURATION);
    }

    #[test]
    fn expires_after_deadline() {
        let mut slow = SlowMotion::default();
        slow.activate(Duration::ZERO);
        assert_eq!(slow.speed_factor(), SLOW_MOTION_MULTIPLIER);

        slow.update(SLOW_MOTION_DURATION);
        assert!(slow.active);

        slow.update(SLOW_MOTION_DURATION + Duration::from_millis(1));
        assert!(!slow.active);
        assert_eq!(slow.speed_factor(), 1.0);
    }

    #[test]
    fn remaining_fraction_counts_down() {
        let mut slow = SlowMotion::default();
        slow.activate(Duration::ZERO);
        let half = slow.remaining_fraction(SLOW_MOTION_DURATION / 2);
        assert!((half - 0.5).abs() < 1e-4);
        assert_eq!(SlowMotion::default().remaining_fraction(Duration::ZERO), 0.0);
    }
}
