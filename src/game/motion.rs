//! Bubble motion and ceiling collision.

use std::time::Duration;

use bevy::prelude::*;

use super::{
    bubble::{Bubble, CeilingPin},
    field::PlayField,
    powerups::SlowMotion,
};

/// Speeds are tuned in units per frame at this rate.
pub const REFERENCE_FPS: f32 = 60.0;

/// Horizontal wobble amplitude per frame.
const WOBBLE_AMPLITUDE: f32 = 0.5;

/// Move every bubble up and remove those that touched the ceiling.
///
/// Each escaped bubble leaves a pin at its last x position. Returns the
/// escaped bubbles so the caller can apply penalties.
pub fn advance(
    field: &mut PlayField,
    slow_motion: &SlowMotion,
    ceiling_height: f32,
    now: Duration,
    frame_scale: f32,
) -> Vec<Bubble> {
    let factor = slow_motion.speed_factor();

    for bubble in field.bubbles_mut() {
        bubble.position.y -= bubble.speed * factor * frame_scale;
        bubble.wobble += bubble.wobble_speed * frame_scale;
        bubble.position.x += bubble.wobble.sin() * WOBBLE_AMPLITUDE * frame_scale;
    }

    let escaped = field.drain_where(|bubble| bubble.position.y - bubble.radius() <= ceiling_height);
    for bubble in &escaped {
        field.push_pin(CeilingPin {
            x: bubble.position.x,
            color: bubble.color,
            created_at_secs: now.as_secs_f32(),
        });
        debug!("Bubble {} hit the ceiling at x={:.0}", bubble.id, bubble.position.x);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::config::SessionConfig;

    fn field_with(positions: &[(f32, f32)]) -> PlayField {
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(21);
        let mut field = PlayField::new(800.0, 600.0);
        for &(x, y) in positions {
            let mut bubble = Bubble::random(0, 1, 800.0, 600.0, &config, &mut rng);
            bubble.position = Vec2::new(x, y);
            bubble.speed = 2.0;
            field.insert(bubble);
        }
        field
    }

    #[test]
    fn bubbles_rise_by_their_speed() {
        let mut field = field_with(&[(400.0, 500.0)]);
        advance(&mut field, &SlowMotion::default(), 30.0, Duration::ZERO, 1.0);
        assert!((field.bubbles()[0].position.y - 498.0).abs() < 1e-4);
    }

    #[test]
    fn slow_motion_scales_vertical_speed() {
        let mut field = field_with(&[(400.0, 500.0), (100.0, 400.0)]);
        let mut slow = SlowMotion::default();
        slow.activate(Duration::ZERO);

        advance(&mut field, &slow, 30.0, Duration::ZERO, 1.0);

        let expected = 2.0 * slow.speed_multiplier;
        assert!((field.bubbles()[0].position.y - (500.0 - expected)).abs() < 1e-4);
        assert!((field.bubbles()[1].position.y - (400.0 - expected)).abs() < 1e-4);
    }

    #[test]
    fn ceiling_contact_removes_one_and_pins_one() {
        let mut field = field_with(&[(300.0, 200.0), (150.0, 31.0)]);
        let escaped = advance(&mut field, &SlowMotion::default(), 30.0, Duration::ZERO, 1.0);

        assert_eq!(escaped.len(), 1);
        assert_eq!(field.len(), 1);
        assert_eq!(field.pin_count(), 1);
        let pin = field.pins().next().unwrap();
        assert_eq!(pin.x, escaped[0].position.x);
        assert_eq!(pin.color, escaped[0].color);
    }
}
