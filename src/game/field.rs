//! The play field - the entity store for active bubbles and ceiling pins.
//!
//! Coordinates are canvas-style: origin at the top-left corner, x to the
//! right, y growing downward. The renderer converts to world space.

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::Rng;

use super::{
    bubble::{Bubble, CeilingPin},
    config::SessionConfig,
};

/// Oldest pins are evicted past this many.
pub const MAX_CEILING_PINS: usize = 50;

/// Active bubbles and the pins left by escaped ones.
#[derive(Debug, Clone, Default)]
pub struct PlayField {
    pub width: f32,
    pub height: f32,
    /// Insertion order doubles as draw order: later bubbles render on top.
    bubbles: Vec<Bubble>,
    pins: VecDeque<CeilingPin>,
    next_id: u64,
}

impl PlayField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..default()
        }
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubbles_mut(&mut self) -> &mut [Bubble] {
        &mut self.bubbles
    }

    pub fn pins(&self) -> impl Iterator<Item = &CeilingPin> {
        self.pins.iter()
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Roll a bubble for `level` and add it. Returns the new bubble's id.
    pub fn spawn_random(&mut self, level: u32, config: &SessionConfig, rng: &mut impl Rng) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let bubble = Bubble::random(id, level, self.width, self.height, config, rng);
        debug!(
            "Spawned {:?} {:?} {:?} bubble ({} pts) at x={:.0}",
            bubble.kind, bubble.size, bubble.color, bubble.points, bubble.position.x
        );
        self.bubbles.push(bubble);
        id
    }

    /// Add a prepared bubble, assigning it a fresh id.
    pub fn insert(&mut self, mut bubble: Bubble) -> u64 {
        bubble.id = self.next_id;
        self.next_id += 1;
        let id = bubble.id;
        self.bubbles.push(bubble);
        id
    }

    pub fn remove(&mut self, index: usize) -> Bubble {
        self.bubbles.remove(index)
    }

    /// Remove every bubble matching `pred`, returning them in insertion order.
    pub fn drain_where(&mut self, mut pred: impl FnMut(&Bubble) -> bool) -> Vec<Bubble> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.bubbles.len());
        for bubble in self.bubbles.drain(..) {
            if pred(&bubble) {
                taken.push(bubble);
            } else {
                kept.push(bubble);
            }
        }
        self.bubbles = kept;
        taken
    }

    /// Record an escaped bubble on the ceiling, evicting the oldest pin past the cap.
    pub fn push_pin(&mut self, pin: CeilingPin) {
        self.pins.push_back(pin);
        while self.pins.len() > MAX_CEILING_PINS {
            self.pins.pop_front();
        }
    }

    /// Index of the bubble hit by `point`, scanning the most recently spawned first.
    pub fn hit_test(&self, point: Vec2) -> Option<usize> {
        self.bubbles.iter().rposition(|bubble| bubble.contains(point))
    }

    /// Convert a field point to world space (origin at the center, y up).
    pub fn to_world(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x - self.width / 2.0, self.height / 2.0 - point.y)
    }

    /// Inverse of [`PlayField::to_world`].
    pub fn to_field(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x + self.width / 2.0, self.height / 2.0 - point.y)
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.pins.clear();
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::bubble::BubbleColor;

    fn bubble_at(field: &mut PlayField, x: f32, y: f32, rng: &mut StdRng) -> u64 {
        let config = SessionConfig::default();
        let mut bubble = Bubble::random(0, 1, field.width, field.height, &config, rng);
        bubble.position = Vec2::new(x, y);
        field.insert(bubble)
    }

    #[test]
    fn pins_are_capped_fifo() {
        let mut field = PlayField::new(800.0, 600.0);
        for i in 0..(MAX_CEILING_PINS + 5) {
            field.push_pin(CeilingPin {
                x: i as f32,
                color: BubbleColor::Red,
                created_at_secs: i as f32,
            });
        }
        assert_eq!(field.pin_count(), MAX_CEILING_PINS);
        assert_eq!(field.pins().next().map(|pin| pin.x), Some(5.0));
    }

    #[test]
    fn hit_test_prefers_most_recent_bubble() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = PlayField::new(800.0, 600.0);
        let older = bubble_at(&mut field, 200.0, 200.0, &mut rng);
        let newer = bubble_at(&mut field, 205.0, 200.0, &mut rng);

        let index = field.hit_test(Vec2::new(202.0, 200.0)).unwrap();
        assert_eq!(field.bubbles()[index].id, newer);
        assert_ne!(field.bubbles()[index].id, older);
    }

    #[test]
    fn miss_leaves_field_untouched() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut field = PlayField::new(800.0, 600.0);
        bubble_at(&mut field, 200.0, 200.0, &mut rng);
        assert_eq!(field.hit_test(Vec2::new(700.0, 50.0)), None);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn world_space_is_centered_and_flipped() {
        let field = PlayField::new(800.0, 600.0);
        assert_eq!(field.to_world(Vec2::new(400.0, 300.0)), Vec2::ZERO);
        assert_eq!(field.to_world(Vec2::new(0.0, 0.0)), Vec2::new(-400.0, 300.0));
        assert_eq!(field.to_world(Vec2::new(800.0, 600.0)), Vec2::new(400.0, -300.0));
    }

    #[test]
    fn clicks_through_a_shifted_camera_hit_the_drawn_bubble() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut field = PlayField::new(800.0, 600.0);
        let id = bubble_at(&mut field, 400.0, 300.0, &mut rng);
        let radius = field.bubbles()[0].radius();

        // A camera shaken right and up shows the bubble left of and below its
        // resting screen position; the cursor lands there.
        let shake = Vec2::new(radius * 0.8, radius * 0.8);
        let cursor = Vec2::new(400.0 - shake.x, 300.0 + shake.y);
        let world = Vec2::new(cursor.x - 400.0, 300.0 - cursor.y) + shake;

        let index = field.hit_test(field.to_field(world)).unwrap();
        assert_eq!(field.bubbles()[index].id, id);
        assert_eq!(field.to_field(field.to_world(Vec2::new(12.0, 34.0))), Vec2::new(12.0, 34.0));
    }

    #[test]
    fn drain_where_keeps_order() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut field = PlayField::new(800.0, 600.0);
        let a = bubble_at(&mut field, 100.0, 100.0, &mut rng);
        let b = bubble_at(&mut field, 500.0, 100.0, &mut rng);
        let c = bubble_at(&mut field, 120.0, 100.0, &mut rng);

        let taken = field.drain_where(|bubble| bubble.position.x < 200.0);
        assert_eq!(taken.iter().map(|b| b.id).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(field.bubbles().iter().map(|b| b.id).collect::<Vec<_>>(), vec![b]);
    }
}
