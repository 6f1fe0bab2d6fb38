//! Game polish/juice effects - pop particles, bomb shockwaves, screen shake,
//! floating score text.
//!
//! Particles and shockwaves live in one explicit list that is advanced once
//! per frame; nothing reschedules itself, so clearing the list cancels every
//! running effect.

use std::{f32::consts::TAU, time::Duration};

use bevy::prelude::*;
use rand::Rng;

use super::{
    bubble::{Bubble, BubbleColor},
    motion::REFERENCE_FPS,
    state::{BubbleEscaped, BubblePopped, Session},
};
use crate::{PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Effects>();
    app.init_resource::<ScreenShake>();

    app.add_systems(OnEnter(Screen::Gameplay), clear_effects);

    app.add_systems(
        Update,
        (
            spawn_pop_effects,
            advance_effects,
            (trigger_shake_on_blast, apply_screen_shake).chain(),
            (spawn_score_text, spawn_penalty_text, animate_score_text),
        )
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    app.add_systems(Update, draw_effects.run_if(in_state(Screen::Gameplay)));
}

// =============================================================================
// PARTICLES & SHOCKWAVES
// =============================================================================

/// Particles per popped bubble.
const PARTICLES_PER_POP: usize = 8;
/// Velocity kept per frame.
const PARTICLE_DRAG: f32 = 0.98;
const PARTICLE_RADIUS: f32 = 3.0;
/// Time for a shockwave to reach its full radius.
const SHOCKWAVE_DURATION: Duration = Duration::from_millis(500);

/// A fading spark in field coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: BubbleColor,
    pub life: f32,
    pub decay: f32,
}

/// An expanding ring left by a bomb.
#[derive(Debug, Clone, PartialEq)]
pub struct Shockwave {
    pub center: Vec2,
    pub max_radius: f32,
    pub elapsed: Duration,
}

impl Shockwave {
    pub fn progress(&self) -> f32 {
        (self.elapsed.as_secs_f32() / SHOCKWAVE_DURATION.as_secs_f32()).min(1.0)
    }
}

/// Every running visual effect.
#[derive(Resource, Debug, Default)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub shockwaves: Vec<Shockwave>,
}

impl Effects {
    /// Radial burst of particles from a popped bubble.
    pub fn burst(&mut self, bubble: &Bubble, rng: &mut impl Rng) {
        for i in 0..PARTICLES_PER_POP {
            let angle = TAU * i as f32 / PARTICLES_PER_POP as f32;
            let speed = 2.0 + rng.random_range(0.0..3.0);
            self.particles.push(Particle {
                position: bubble.position,
                velocity: Vec2::from_angle(angle) * speed,
                color: bubble.color,
                life: 1.0,
                decay: 0.02 + rng.random_range(0.0..0.02),
            });
        }
    }

    pub fn shockwave(&mut self, center: Vec2, max_radius: f32) {
        self.shockwaves.push(Shockwave {
            center,
            max_radius,
            elapsed: Duration::ZERO,
        });
    }

    /// Step every effect and drop the finished ones.
    pub fn advance(&mut self, delta: Duration) {
        let frames = delta.as_secs_f32() * REFERENCE_FPS;

        for particle in &mut self.particles {
            particle.position += particle.velocity * frames;
            particle.life -= particle.decay * frames;
            particle.velocity *= PARTICLE_DRAG.powf(frames);
        }
        self.particles.retain(|particle| particle.life > 0.0);

        for wave in &mut self.shockwaves {
            wave.elapsed += delta;
        }
        self.shockwaves.retain(|wave| wave.progress() < 1.0);
    }

    pub fn is_idle(&self) -> bool {
        self.particles.is_empty() && self.shockwaves.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.shockwaves.clear();
    }
}

fn clear_effects(mut effects: ResMut<Effects>) {
    effects.clear();
}

fn spawn_pop_effects(mut popped: MessageReader<BubblePopped>, mut effects: ResMut<Effects>) {
    let mut rng = rand::rng();
    for BubblePopped(report) in popped.read() {
        effects.burst(&report.popped, &mut rng);
        for bubble in &report.blasted {
            effects.burst(bubble, &mut rng);
        }
        if let Some(radius) = report.blast_radius {
            effects.shockwave(report.popped.position, radius);
        }
    }
}

fn advance_effects(time: Res<Time>, mut effects: ResMut<Effects>) {
    effects.advance(time.delta());
}

fn draw_effects(mut gizmos: Gizmos, effects: Res<Effects>, session: Res<Session>) {
    if effects.is_idle() {
        return;
    }
    let field = &session.field;

    for particle in &effects.particles {
        gizmos.circle_2d(
            field.to_world(particle.position),
            PARTICLE_RADIUS,
            particle.color.to_color().with_alpha(particle.life),
        );
    }

    for wave in &effects.shockwaves {
        let progress = wave.progress();
        let radius = wave.max_radius * progress;
        let alpha = 1.0 - progress;
        let center = field.to_world(wave.center);
        gizmos.circle_2d(center, radius, Color::srgba(1.0, 0.27, 0.0, alpha));
        gizmos.circle_2d(center, radius * 0.7, Color::srgba(1.0, 0.84, 0.0, alpha));
    }
}

// =============================================================================
// SCREEN SHAKE
// =============================================================================

/// Resource tracking screen shake state.
#[derive(Resource, Default)]
pub struct ScreenShake {
    /// Current trauma level (0.0 to 1.0).
    pub trauma: f32,
}

/// Maximum shake offset in pixels.
const MAX_SHAKE_OFFSET: f32 = 10.0;
/// How fast trauma decays per second.
const TRAUMA_DECAY: f32 = 2.5;

/// Bomb blasts shake harder the more they catch.
fn trigger_shake_on_blast(mut shake: ResMut<ScreenShake>, mut popped: MessageReader<BubblePopped>) {
    for BubblePopped(report) in popped.read() {
        if report.blast_radius.is_none() {
            continue;
        }
        let intensity = (0.4 + report.blasted.len() as f32 * 0.1).min(1.0);
        shake.trauma = (shake.trauma + intensity).min(1.0);
        debug!("Screen shake from blast: trauma={}", shake.trauma);
    }
}

/// Apply screen shake to camera.
fn apply_screen_shake(
    time: Res<Time>,
    mut shake: ResMut<ScreenShake>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    if shake.trauma > 0.0 {
        let mut rng = rand::rng();

        // Shake amount = trauma^2 (makes it feel more natural)
        let shake_amount = shake.trauma * shake.trauma;
        camera_transform.translation.x = rng.random_range(-1.0..1.0) * MAX_SHAKE_OFFSET * shake_amount;
        camera_transform.translation.y = rng.random_range(-1.0..1.0) * MAX_SHAKE_OFFSET * shake_amount;

        shake.trauma = (shake.trauma - TRAUMA_DECAY * time.delta_secs()).max(0.0);
    } else {
        camera_transform.translation.x = 0.0;
        camera_transform.translation.y = 0.0;
    }
}

// =============================================================================
// SCORE TEXT
// =============================================================================

/// Floating "+N" over a combo or blast, or "-N" at the ceiling.
#[derive(Component)]
pub struct ScoreText {
    pub color: Color,
    pub timer: f32,
    pub duration: f32,
    pub start_y: f32,
    pub float_distance: f32,
}

const SCORE_TEXT_COLOR: Color = Color::srgb(1.0, 1.0, 0.2);
const PENALTY_TEXT_COLOR: Color = Color::srgb(1.0, 0.35, 0.35);

/// Only pops that beat a plain pop get a popup.
fn spawn_score_text(
    mut commands: Commands,
    mut popped: MessageReader<BubblePopped>,
    session: Res<Session>,
) {
    for BubblePopped(report) in popped.read() {
        if report.combo == 0 && report.blasted.is_empty() {
            continue;
        }

        let text = if report.blasted.len() >= 3 {
            format!("BOOM! +{}", report.points)
        } else if report.combo >= 2 {
            format!("COMBO x{}! +{}", report.combo + 1, report.points)
        } else {
            format!("+{}", report.points)
        };

        let position = session.field.to_world(report.popped.position);
        commands.spawn((
            Name::new("Score Text"),
            ScoreText {
                color: SCORE_TEXT_COLOR,
                timer: 0.0,
                duration: 0.8,
                start_y: position.y,
                float_distance: 50.0,
            },
            Text2d::new(text),
            TextFont {
                font_size: 28.0,
                ..default()
            },
            TextColor(SCORE_TEXT_COLOR),
            Transform::from_translation(position.extend(10.0)).with_scale(Vec3::splat(0.5)),
            DespawnOnExit(Screen::Gameplay),
        ));
    }
}

/// Escaped bubbles show the penalty just under the ceiling, drifting down.
fn spawn_penalty_text(
    mut commands: Commands,
    mut escaped: MessageReader<BubbleEscaped>,
    session: Res<Session>,
) {
    let penalty = session.config.ceiling_penalty;
    if penalty == 0 {
        escaped.clear();
        return;
    }

    for event in escaped.read() {
        let anchor = Vec2::new(event.x, session.config.ceiling_height + 15.0);
        let position = session.field.to_world(anchor);
        commands.spawn((
            Name::new("Penalty Text"),
            ScoreText {
                color: PENALTY_TEXT_COLOR,
                timer: 0.0,
                duration: 0.6,
                start_y: position.y,
                float_distance: -25.0,
            },
            Text2d::new(format!("-{penalty}")),
            TextFont {
                font_size: 20.0,
                ..default()
            },
            TextColor(PENALTY_TEXT_COLOR),
            Transform::from_translation(position.extend(10.0)).with_scale(Vec3::splat(0.5)),
            DespawnOnExit(Screen::Gameplay),
        ));
    }
}

/// Float upward and fade out.
fn animate_score_text(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut ScoreText, &mut TextColor)>,
) {
    for (entity, mut transform, mut popup, mut color) in &mut query {
        popup.timer += time.delta_secs();
        let progress = (popup.timer / popup.duration).min(1.0);

        let scale = if progress < 0.2 {
            0.5 + progress / 0.2
        } else {
            1.5
        };
        transform.scale = Vec3::splat(scale);
        transform.translation.y = popup.start_y + popup.float_distance * progress;

        let alpha = if progress > 0.7 {
            1.0 - (progress - 0.7) / 0.3
        } else {
            1.0
        };
        color.0 = popup.color.with_alpha(alpha);

        if progress >= 1.0 {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::config::SessionConfig;

    #[test]
    fn particles_fade_out_and_are_removed() {
        let mut rng = StdRng::seed_from_u64(8);
        let bubble = Bubble::random(0, 1, 800.0, 600.0, &SessionConfig::default(), &mut rng);
        let mut effects = Effects::default();
        effects.burst(&bubble, &mut rng);
        assert_eq!(effects.particles.len(), PARTICLES_PER_POP);

        // Slowest decay is 0.02 per frame: 50 frames at most
        for _ in 0..60 {
            effects.advance(Duration::from_secs_f32(1.0 / REFERENCE_FPS));
        }
        assert!(effects.particles.is_empty());
    }

    #[test]
    fn shockwave_grows_then_ends() {
        let mut effects = Effects::default();
        effects.shockwave(Vec2::new(10.0, 10.0), 70.0);

        effects.advance(Duration::from_millis(250));
        let progress = effects.shockwaves[0].progress();
        assert!((progress - 0.5).abs() < 1e-4);

        effects.advance(Duration::from_millis(250));
        assert!(effects.is_idle());
    }

    #[test]
    fn clear_cancels_everything() {
        let mut rng = StdRng::seed_from_u64(9);
        let bubble = Bubble::random(0, 1, 800.0, 600.0, &SessionConfig::default(), &mut rng);
        let mut effects = Effects::default();
        effects.burst(&bubble, &mut rng);
        effects.shockwave(Vec2::ZERO, 50.0);
        effects.clear();
        assert!(effects.is_idle());
    }
}
