//! Session state - score, level, countdown and the Ready/Running/Ended cycle.
//!
//! A round ends when the countdown reaches zero. Popping bonus-time bubbles
//! and levelling up both push the deadline back.

use std::time::Duration;

use bevy::{prelude::*, window::PrimaryWindow};
use rand::Rng;

use super::{
    bubble::{Bubble, BubbleColor, SpecialKind},
    config::SessionConfig,
    field::PlayField,
    motion,
    powerups::SlowMotion,
    scoring::{self, BOMB_RADIUS_FACTOR},
    spawner::Spawner,
};
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Session>();
    app.register_type::<SessionPhase>();

    app.add_message::<BubblePopped>();
    app.add_message::<BubbleEscaped>();
    app.add_message::<LevelUp>();
    app.add_message::<BonusTime>();
    app.add_message::<SessionEnded>();

    app.add_systems(OnEnter(Screen::Gameplay), start_session);

    app.add_systems(
        Update,
        (fit_field_to_window, tick_session)
            .chain()
            .in_set(AppSystems::TickTimers)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Lifecycle of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum SessionPhase {
    /// Created but not started; nothing ticks.
    #[default]
    Ready,
    /// Ticking and accepting input.
    Running,
    /// Final score and level are frozen.
    Ended,
}

/// Everything that happened during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub escaped: Vec<Bubble>,
    pub spawned: usize,
    pub ended: bool,
}

/// Outcome of a successful pop.
#[derive(Debug, Clone, PartialEq)]
pub struct PopReport {
    pub popped: Bubble,
    /// Total awarded, including bubbles caught in a blast.
    pub points: u32,
    pub combo: usize,
    /// Bubbles removed by a bomb blast, excluding the bomb itself.
    pub blasted: Vec<Bubble>,
    pub blast_radius: Option<f32>,
    pub bonus_seconds: u32,
    pub slow_motion: bool,
    pub level_up: Option<u32>,
}

impl PopReport {
    pub fn removed_count(&self) -> usize {
        1 + self.blasted.len()
    }
}

/// A single round of play. Owns the field and every timer.
#[derive(Resource, Debug, Clone)]
pub struct Session {
    /// Bumped on every restart; bubble ids are only unique within a round.
    pub round: u64,
    pub phase: SessionPhase,
    pub score: u32,
    pub level: u32,
    /// Seconds granted on top of the round length.
    pub bonus_seconds: u32,
    /// Time spent running; paused time is not counted.
    pub clock: Duration,
    pub field: PlayField,
    pub spawner: Spawner,
    pub slow_motion: SlowMotion,
    pub config: SessionConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default(), 0.0, 0.0)
    }
}

impl Session {
    pub fn new(config: SessionConfig, width: f32, height: f32) -> Self {
        Self {
            round: 0,
            phase: SessionPhase::Ready,
            score: 0,
            level: 1,
            bonus_seconds: 0,
            clock: Duration::ZERO,
            field: PlayField::new(width, height),
            spawner: Spawner::new(&config),
            slow_motion: SlowMotion::default(),
            config,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Begin play from Ready. Same as a restart.
    pub fn start(&mut self, rng: &mut impl Rng) {
        self.restart(rng);
    }

    /// Reset every mutable field, seed an initial batch and start running.
    pub fn restart(&mut self, rng: &mut impl Rng) {
        let (width, height) = (self.field.width, self.field.height);
        let round = self.round + 1;
        *self = Self::new(self.config.clone(), width, height);
        self.round = round;
        self.phase = SessionPhase::Running;

        for _ in 0..self.config.initial_batch {
            self.spawner.spawn(&mut self.field, self.level, &self.config, rng);
        }
        self.spawner.last_spawn = self.clock;
        info!(
            "Session started with {} bubbles on a {}x{} field",
            self.field.len(),
            self.field.width,
            self.field.height
        );
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.field.width = width;
        self.field.height = height;
    }

    /// Whole seconds left on the countdown.
    pub fn time_left(&self) -> u32 {
        let elapsed = self.clock.as_secs() as u32;
        (self.config.round_seconds + self.bonus_seconds).saturating_sub(elapsed)
    }

    pub fn add_time(&mut self, seconds: u32) {
        self.bonus_seconds += seconds;
    }

    /// Advance the round by `delta`: countdown first, then bubbles.
    pub fn tick(&mut self, delta: Duration, rng: &mut impl Rng) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_running() {
            return report;
        }

        self.clock += delta;
        let now = self.clock;
        let frame_scale = delta.as_secs_f32() * motion::REFERENCE_FPS;

        self.slow_motion.update(now);
        report.escaped = motion::advance(
            &mut self.field,
            &self.slow_motion,
            self.config.ceiling_height,
            now,
            frame_scale,
        );
        for _ in &report.escaped {
            self.score = self.score.saturating_sub(self.config.ceiling_penalty);
        }

        report.spawned = self
            .spawner
            .tick(&mut self.field, self.level, now, &self.config, rng);

        if self.time_left() == 0 {
            self.phase = SessionPhase::Ended;
            report.ended = true;
            info!("Time up! Final score {} at level {}", self.score, self.level);
        }

        report
    }

    /// Try to pop the topmost bubble under `point`.
    pub fn pop_at(&mut self, point: Vec2) -> Option<PopReport> {
        if !self.is_running() {
            return None;
        }
        let index = self.field.hit_test(point)?;
        Some(self.pop_index(index))
    }

    fn pop_index(&mut self, index: usize) -> PopReport {
        let kind = self.field.bubbles()[index].kind;
        let mut bonus_seconds = 0;
        let mut slow_motion = false;

        match kind {
            SpecialKind::Normal => {}
            SpecialKind::Slow => {
                self.slow_motion.activate(self.clock);
                slow_motion = true;
            }
            SpecialKind::Bomb => {}
            SpecialKind::BonusTime => {
                bonus_seconds = self.config.bonus_bubble_seconds;
                self.add_time(bonus_seconds);
            }
        }

        let scored = scoring::calculate_points(&self.field, index);
        let popped = self.field.remove(index);
        let mut points = scored.points;
        let mut blasted = Vec::new();
        let mut blast_radius = None;

        if kind == SpecialKind::Bomb {
            // One level deep: bombs caught in the blast do not chain
            let radius = popped.radius() * BOMB_RADIUS_FACTOR;
            let center = popped.position;
            blasted = self
                .field
                .drain_where(|bubble| bubble.position.distance(center) <= radius);
            points += blasted.iter().map(scoring::blast_points).sum::<u32>();
            blast_radius = Some(radius);
            info!("Bomb caught {} bubbles in a {:.0} blast", blasted.len(), radius);
        }

        self.score += points;
        debug!(
            "Popped {:?} {:?} bubble for {} points (combo {}), score {}",
            popped.kind, popped.color, points, scored.combo, self.score
        );

        PopReport {
            popped,
            points,
            combo: scored.combo,
            blasted,
            blast_radius,
            bonus_seconds,
            slow_motion,
            level_up: self.check_level_up(),
        }
    }

    /// Raise the level if the score crossed the next threshold.
    pub fn check_level_up(&mut self) -> Option<u32> {
        let earned = self.score / self.config.points_per_level.max(1) + 1;
        if earned <= self.level {
            return None;
        }
        self.level = earned;
        self.spawner.apply_level(self.level, &self.config);
        self.add_time(self.config.level_up_seconds);
        info!(
            "Level up! Now level {} (interval {:?}, max {} bubbles)",
            self.level, self.spawner.base_interval, self.spawner.max_bubbles
        );
        Some(self.level)
    }
}

/// Sent for every successful pop.
#[derive(Message, Debug, Clone)]
pub struct BubblePopped(pub PopReport);

/// Sent when a bubble reaches the ceiling.
#[derive(Message, Debug, Clone)]
pub struct BubbleEscaped {
    pub x: f32,
    pub color: BubbleColor,
}

#[derive(Message, Debug, Clone)]
pub struct LevelUp {
    pub level: u32,
}

#[derive(Message, Debug, Clone)]
pub struct BonusTime {
    pub seconds: u32,
}

/// Sent once when the countdown runs out.
#[derive(Message, Debug, Clone)]
pub struct SessionEnded {
    pub score: u32,
    pub level: u32,
}

/// Create a fresh session sized to the window when gameplay begins.
fn start_session(
    mut session: ResMut<Session>,
    config: Res<SessionConfig>,
    window: Single<&Window, With<PrimaryWindow>>,
) {
    *session = Session::new(config.clone(), window.width(), window.height());
    session.start(&mut rand::rng());
}

/// Keep the field matched to the window's logical size.
fn fit_field_to_window(mut session: ResMut<Session>, window: Single<&Window, With<PrimaryWindow>>) {
    let (width, height) = (window.width(), window.height());
    if session.field.width != width || session.field.height != height {
        session.resize(width, height);
        debug!("Field resized to {}x{}", width, height);
    }
}

fn tick_session(
    time: Res<Time>,
    mut session: ResMut<Session>,
    mut escaped_events: MessageWriter<BubbleEscaped>,
    mut ended_events: MessageWriter<SessionEnded>,
) {
    let report = session.tick(time.delta(), &mut rand::rng());
    if report.spawned > 0 {
        debug!("Spawned {} bubbles, {} on the field", report.spawned, session.field.len());
    }

    for bubble in &report.escaped {
        escaped_events.write(BubbleEscaped {
            x: bubble.position.x,
            color: bubble.color,
        });
    }

    if report.ended {
        ended_events.write(SessionEnded {
            score: session.score,
            level: session.level,
        });
    }
}
