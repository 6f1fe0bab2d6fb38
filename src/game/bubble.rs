//! Bubbles - the rising targets the player pops.
//!
//! Color and size are drawn once from fixed tables at spawn time and never
//! change. Position and wobble phase are advanced by the motion updater.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use super::config::SessionConfig;

/// Palette of bubble colors, ordered by base value.
/// Higher levels unlock the more valuable end of the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default)]
pub enum BubbleColor {
    #[default]
    Red,
    Teal,
    Sky,
    Green,
    Yellow,
    Plum,
    Orange,
}

impl BubbleColor {
    pub const ALL: [BubbleColor; 7] = [
        BubbleColor::Red,
        BubbleColor::Teal,
        BubbleColor::Sky,
        BubbleColor::Green,
        BubbleColor::Yellow,
        BubbleColor::Plum,
        BubbleColor::Orange,
    ];

    /// Base points before the size multiplier.
    pub fn base_points(self) -> u32 {
        match self {
            BubbleColor::Red => 10,
            BubbleColor::Teal => 15,
            BubbleColor::Sky => 20,
            BubbleColor::Green => 25,
            BubbleColor::Yellow => 30,
            BubbleColor::Plum => 35,
            BubbleColor::Orange => 40,
        }
    }

    /// Get the actual color for rendering.
    pub fn to_color(self) -> Color {
        match self {
            BubbleColor::Red => Color::srgb_u8(0xFF, 0x6B, 0x6B),
            BubbleColor::Teal => Color::srgb_u8(0x4E, 0xCD, 0xC4),
            BubbleColor::Sky => Color::srgb_u8(0x45, 0xB7, 0xD1),
            BubbleColor::Green => Color::srgb_u8(0x96, 0xCE, 0xB4),
            BubbleColor::Yellow => Color::srgb_u8(0xFF, 0xEA, 0xA7),
            BubbleColor::Plum => Color::srgb_u8(0xDD, 0xA0, 0xDD),
            BubbleColor::Orange => Color::srgb_u8(0xFF, 0xB3, 0x47),
        }
    }

    /// Number of palette entries available at a level.
    pub fn unlocked_at(level: u32) -> usize {
        (3 + level as usize).min(Self::ALL.len())
    }

    /// Uniform pick among the colors unlocked at `level`.
    pub fn random_for_level(level: u32, rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::unlocked_at(level))]
    }
}

/// Fixed size table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default)]
pub enum BubbleSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl BubbleSize {
    pub const ALL: [BubbleSize; 4] = [
        BubbleSize::Small,
        BubbleSize::Medium,
        BubbleSize::Large,
        BubbleSize::ExtraLarge,
    ];

    pub fn radius(self) -> f32 {
        match self {
            BubbleSize::Small => 20.0,
            BubbleSize::Medium => 35.0,
            BubbleSize::Large => 50.0,
            BubbleSize::ExtraLarge => 65.0,
        }
    }

    /// Multiplier baked into the stored point value at spawn.
    pub fn value_multiplier(self) -> f32 {
        match self {
            BubbleSize::Small => 2.0,
            BubbleSize::Medium => 1.5,
            BubbleSize::Large => 1.0,
            BubbleSize::ExtraLarge => 0.5,
        }
    }

    /// Precision bonus applied when the bubble is popped.
    pub fn pop_multiplier(self) -> f32 {
        match self {
            BubbleSize::Small => 1.5,
            BubbleSize::ExtraLarge => 0.8,
            BubbleSize::Medium | BubbleSize::Large => 1.0,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Behavior attached to a bubble on top of its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default)]
pub enum SpecialKind {
    #[default]
    Normal,
    /// Slows every bubble down for a few seconds.
    Slow,
    /// Pops everything around it.
    Bomb,
    /// Adds seconds to the countdown.
    BonusTime,
}

impl SpecialKind {
    /// Partition a single uniform draw into cumulative probability bands.
    pub fn from_draw(draw: f32, config: &SessionConfig) -> Self {
        let slow = config.slow_chance;
        let bomb = slow + config.bomb_chance;
        let bonus = bomb + config.bonus_time_chance;
        if draw < slow {
            SpecialKind::Slow
        } else if draw < bomb {
            SpecialKind::Bomb
        } else if draw < bonus {
            SpecialKind::BonusTime
        } else {
            SpecialKind::Normal
        }
    }
}

/// A single rising bubble.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Bubble {
    /// Unique within a session; used to pair bubbles with their visuals.
    pub id: u64,
    pub position: Vec2,
    pub color: BubbleColor,
    pub size: BubbleSize,
    pub kind: SpecialKind,
    /// `floor(base_points * value_multiplier)`, fixed at spawn.
    pub points: u32,
    /// Upward speed in units per 60 Hz frame.
    pub speed: f32,
    pub wobble: f32,
    pub wobble_speed: f32,
    pub alpha: f32,
}

impl Bubble {
    /// Roll a new bubble just below the bottom edge of a `width` x `height` field.
    pub fn random(
        id: u64,
        level: u32,
        width: f32,
        height: f32,
        config: &SessionConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let color = BubbleColor::random_for_level(level, rng);
        let size = BubbleSize::random(rng);
        let kind = SpecialKind::from_draw(rng.random::<f32>(), config);
        let radius = size.radius();

        // A field narrower than the bubble pins it to the middle
        let x = if width > radius * 2.0 {
            rng.random_range(radius..=width - radius)
        } else {
            width / 2.0
        };

        Self {
            id,
            position: Vec2::new(x, height + radius),
            color,
            size,
            kind,
            points: (color.base_points() as f32 * size.value_multiplier()).floor() as u32,
            speed: 1.0 + rng.random_range(0.0..2.0) + 0.3 * level as f32,
            wobble: rng.random_range(0.0..TAU),
            wobble_speed: 0.02 + rng.random_range(0.0..0.03),
            alpha: 0.8 + rng.random_range(0.0..0.2),
        }
    }

    pub fn radius(&self) -> f32 {
        self.size.radius()
    }

    /// Whether a point lies on or inside the bubble.
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance(point) <= self.radius()
    }
}

/// Marker left on the ceiling where a bubble escaped.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct CeilingPin {
    pub x: f32,
    pub color: BubbleColor,
    /// Session clock at the moment of impact.
    pub created_at_secs: f32,
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn special_bands_are_cumulative() {
        let config = SessionConfig::default();
        assert_eq!(SpecialKind::from_draw(0.0, &config), SpecialKind::Slow);
        assert_eq!(SpecialKind::from_draw(0.049, &config), SpecialKind::Slow);
        assert_eq!(SpecialKind::from_draw(0.05, &config), SpecialKind::Bomb);
        assert_eq!(SpecialKind::from_draw(0.099, &config), SpecialKind::Bomb);
        assert_eq!(SpecialKind::from_draw(0.10, &config), SpecialKind::BonusTime);
        assert_eq!(SpecialKind::from_draw(0.199, &config), SpecialKind::BonusTime);
        assert_eq!(SpecialKind::from_draw(0.20, &config), SpecialKind::Normal);
        assert_eq!(SpecialKind::from_draw(0.99, &config), SpecialKind::Normal);
    }

    #[test]
    fn palette_widens_with_level() {
        assert_eq!(BubbleColor::unlocked_at(1), 4);
        assert_eq!(BubbleColor::unlocked_at(3), 6);
        assert_eq!(BubbleColor::unlocked_at(4), 7);
        assert_eq!(BubbleColor::unlocked_at(50), 7);
    }

    #[test]
    fn spawned_bubbles_stay_within_tables() {
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        for id in 0..500 {
            let level = 1 + (id % 3) as u32;
            let bubble = Bubble::random(id, level, 800.0, 600.0, &config, &mut rng);
            let r = bubble.radius();

            assert!(BubbleColor::ALL[..BubbleColor::unlocked_at(level)].contains(&bubble.color));
            assert!(bubble.position.x >= r && bubble.position.x <= 800.0 - r);
            assert_eq!(bubble.position.y, 600.0 + r);
            assert_eq!(
                bubble.points,
                (bubble.color.base_points() as f32 * bubble.size.value_multiplier()).floor() as u32
            );

            let min_speed = 1.0 + 0.3 * level as f32;
            assert!(bubble.speed >= min_speed && bubble.speed < min_speed + 2.0);
            assert!(bubble.alpha >= 0.8 && bubble.alpha < 1.0);
        }
    }

    #[test]
    fn narrow_field_centers_bubble() {
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let bubble = Bubble::random(0, 1, 30.0, 600.0, &config, &mut rng);
        assert_eq!(bubble.position.x, 15.0);
    }

    #[test]
    fn contains_is_inclusive_at_the_rim() {
        let config = SessionConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut bubble = Bubble::random(0, 1, 800.0, 600.0, &config, &mut rng);
        bubble.position = Vec2::new(100.0, 100.0);
        let r = bubble.radius();

        assert!(bubble.contains(Vec2::new(100.0 + r, 100.0)));
        assert!(!bubble.contains(Vec2::new(100.0 + r + 0.01, 100.0)));
    }
}
