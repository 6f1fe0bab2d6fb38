//! Points for popped bubbles.
//!
//! A pop is worth the bubble's stored points, compounded by:
//! - a linear combo for same-colored neighbours (`1 + 0.5 * count`)
//! - the size precision bonus (small x1.5, extra-large x0.8)
//! - a height bonus up to x1.3 for bubbles caught near the bottom

use bevy::prelude::*;

use super::{bubble::Bubble, field::PlayField};

/// Same-colored bubbles closer than this count toward a combo.
pub const COMBO_RADIUS: f32 = 100.0;

/// Extra multiplier per combo neighbour.
pub const COMBO_STEP: f32 = 0.5;

/// Height bonus at the very bottom of the field.
pub const MAX_HEIGHT_BONUS: f32 = 0.3;

/// Bomb blast radius relative to the bomb's own radius.
pub const BOMB_RADIUS_FACTOR: f32 = 3.5;

/// Share of stored points awarded to bubbles caught in a blast.
pub const BLAST_POINTS_FACTOR: f32 = 0.8;

/// Breakdown of a single pop's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsBreakdown {
    pub points: u32,
    /// Same-colored neighbours that fed the combo.
    pub combo: usize,
}

/// Number of other bubbles near `field.bubbles()[index]` sharing its color.
pub fn combo_count(field: &PlayField, index: usize) -> usize {
    let target = &field.bubbles()[index];
    field
        .bubbles()
        .iter()
        .enumerate()
        .filter(|(i, other)| {
            *i != index
                && other.color == target.color
                && other.position.distance(target.position) < COMBO_RADIUS
        })
        .count()
}

/// Multiplier for popping at `y` on a field `height` tall.
pub fn height_multiplier(y: f32, height: f32) -> f32 {
    if height <= 0.0 {
        return 1.0;
    }
    1.0 + MAX_HEIGHT_BONUS * (y / height).clamp(0.0, 1.0)
}

/// Score the bubble at `index` while it is still on the field.
pub fn calculate_points(field: &PlayField, index: usize) -> PointsBreakdown {
    let bubble = &field.bubbles()[index];
    let combo = combo_count(field, index);

    let mut points = bubble.points as f32;
    if combo > 0 {
        points *= 1.0 + COMBO_STEP * combo as f32;
    }
    points *= bubble.size.pop_multiplier();
    points *= height_multiplier(bubble.position.y, field.height);

    PointsBreakdown {
        points: points.floor().max(0.0) as u32,
        combo,
    }
}

/// Points for a bubble caught in a bomb blast.
pub fn blast_points(bubble: &Bubble) -> u32 {
    (bubble.points as f32 * BLAST_POINTS_FACTOR).floor() as u32
}

/// Upper bound for one pop with `max_bubbles` on the field.
pub fn max_pop_points(max_bubbles: usize) -> u32 {
    use super::bubble::{BubbleColor, BubbleSize};

    let best_stored = BubbleColor::ALL
        .iter()
        .flat_map(|color| {
            BubbleSize::ALL
                .iter()
                .map(move |size| (color.base_points() as f32 * size.value_multiplier()).floor())
        })
        .fold(0.0_f32, f32::max);
    let best_size = BubbleSize::ALL
        .iter()
        .map(|size| size.pop_multiplier())
        .fold(0.0_f32, f32::max);
    let best_combo = 1.0 + COMBO_STEP * max_bubbles.saturating_sub(1) as f32;

    (best_stored * best_combo * best_size * (1.0 + MAX_HEIGHT_BONUS)).floor() as u32
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::{
        bubble::{BubbleColor, BubbleSize, SpecialKind},
        config::SessionConfig,
    };

    fn bubble(x: f32, y: f32, color: BubbleColor, size: BubbleSize, points: u32) -> Bubble {
        Bubble {
            id: 0,
            position: Vec2::new(x, y),
            color,
            size,
            kind: SpecialKind::Normal,
            points,
            speed: 1.0,
            wobble: 0.0,
            wobble_speed: 0.0,
            alpha: 1.0,
        }
    }

    #[test]
    fn small_red_combo_near_bottom() {
        let mut field = PlayField::new(800.0, 600.0);
        field.insert(bubble(400.0, 590.0, BubbleColor::Red, BubbleSize::Small, 10));
        field.insert(bubble(450.0, 590.0, BubbleColor::Red, BubbleSize::Large, 10));

        let result = calculate_points(&field, 0);
        assert_eq!(result.combo, 1);
        // 10 * 1.5 combo * 1.5 size * ~1.295 height
        assert_eq!(result.points, 29);
    }

    #[test]
    fn combo_ignores_other_colors_and_far_bubbles() {
        let mut field = PlayField::new(800.0, 600.0);
        field.insert(bubble(400.0, 300.0, BubbleColor::Teal, BubbleSize::Large, 15));
        field.insert(bubble(420.0, 300.0, BubbleColor::Red, BubbleSize::Large, 10));
        field.insert(bubble(500.0, 300.0, BubbleColor::Teal, BubbleSize::Large, 15));
        field.insert(bubble(430.0, 330.0, BubbleColor::Teal, BubbleSize::Large, 15));

        assert_eq!(combo_count(&field, 0), 1);
    }

    #[test]
    fn height_bonus_decays_toward_top() {
        assert!((height_multiplier(600.0, 600.0) - 1.3).abs() < 1e-6);
        assert!((height_multiplier(0.0, 600.0) - 1.0).abs() < 1e-6);
        assert!((height_multiplier(700.0, 600.0) - 1.3).abs() < 1e-6);
        assert!(height_multiplier(450.0, 600.0) > height_multiplier(150.0, 600.0));
    }

    #[test]
    fn extra_large_is_discounted() {
        let mut field = PlayField::new(800.0, 600.0);
        field.insert(bubble(400.0, 0.0, BubbleColor::Orange, BubbleSize::ExtraLarge, 20));
        assert_eq!(calculate_points(&field, 0).points, 16);
    }

    #[test]
    fn points_never_exceed_bound() {
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        let bound = max_pop_points(config.max_bubbles_cap);

        for _ in 0..200 {
            let mut field = PlayField::new(800.0, 600.0);
            let count = rng.random_range(1..=config.max_bubbles_cap);
            for _ in 0..count {
                let id = field.spawn_random(rng.random_range(1..8), &config, &mut rng);
                let last = field.len() - 1;
                assert_eq!(field.bubbles()[last].id, id);
                field.bubbles_mut()[last].position.y = rng.random_range(0.0..700.0);
            }
            let index = rng.random_range(0..field.len());
            assert!(calculate_points(&field, index).points <= bound);
        }
    }

    #[test]
    fn blast_points_are_floored() {
        let b = bubble(0.0, 0.0, BubbleColor::Teal, BubbleSize::Large, 15);
        assert_eq!(blast_points(&b), 12);
    }
}
