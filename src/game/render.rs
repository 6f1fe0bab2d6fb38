//! Presentation of the session: bubble meshes, ceiling pins, and the HUD.
//!
//! The session owns the bubbles; visuals are mirrors keyed by bubble id and
//! are reconciled every frame.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{
    bubble::{Bubble, SpecialKind},
    state::{BonusTime, Session},
};
use crate::{AppSystems, screens::Screen, theme::palette::HUD_TEXT};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<TimerFlash>();
    app.add_systems(OnEnter(Screen::Gameplay), (spawn_ceiling, spawn_hud));

    app.add_systems(
        Update,
        (
            sync_bubble_visuals,
            fit_ceiling,
            draw_pins,
            (flash_timer_on_bonus, update_hud).chain(),
        )
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Mesh mirror of a session bubble.
#[derive(Component, Debug)]
pub struct BubbleVisual {
    pub round: u64,
    pub id: u64,
}

#[derive(Component)]
struct Ceiling;

const CEILING_COLOR: Color = Color::srgba(0.4, 0.4, 0.4, 0.8);
const PIN_SIZE: f32 = 3.0;
const PIN_NEEDLE: f32 = 8.0;

/// Z step between bubbles; matches the field's insertion order so the bubble
/// drawn on top is the one a click hits.
const BUBBLE_Z_STEP: f32 = 0.001;

fn bubble_z(index: usize) -> f32 {
    index as f32 * BUBBLE_Z_STEP
}

/// Spawn, move, and despawn bubble meshes to match the session.
fn sync_bubble_visuals(
    mut commands: Commands,
    session: Res<Session>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut visuals: Query<(Entity, &BubbleVisual, &mut Transform)>,
) {
    let field = &session.field;
    let mut live: HashMap<u64, (usize, &Bubble)> = field
        .bubbles()
        .iter()
        .enumerate()
        .map(|(index, b)| (b.id, (index, b)))
        .collect();

    for (entity, visual, mut transform) in &mut visuals {
        let current = (visual.round == session.round)
            .then(|| live.remove(&visual.id))
            .flatten();
        match current {
            Some((index, bubble)) => {
                transform.translation = field.to_world(bubble.position).extend(bubble_z(index));
            }
            None => commands.entity(entity).despawn(),
        }
    }

    // Whatever is left has no visual yet
    for (index, bubble) in live.into_values() {
        spawn_bubble_visual(
            &mut commands,
            &mut meshes,
            &mut materials,
            session.round,
            field.to_world(bubble.position).extend(bubble_z(index)),
            bubble,
        );
    }
}

fn spawn_bubble_visual(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    round: u64,
    translation: Vec3,
    bubble: &Bubble,
) {
    let radius = bubble.radius();

    let mut entity = commands.spawn((
        Name::new(format!("Bubble {} {:?}", bubble.id, bubble.color)),
        BubbleVisual {
            round,
            id: bubble.id,
        },
        Transform::from_translation(translation),
        Mesh2d(meshes.add(Circle::new(radius))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(
            bubble.color.to_color().with_alpha(bubble.alpha),
        ))),
        DespawnOnExit(Screen::Gameplay),
    ));

    // Highlight
    entity.with_child((
        Transform::from_xyz(-radius * 0.3, radius * 0.3, 0.0005),
        Mesh2d(meshes.add(Circle::new(radius * 0.4))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgba(1.0, 1.0, 1.0, 0.35)))),
    ));

    let icon_size = radius * 0.4;
    let icon = match bubble.kind {
        SpecialKind::Normal => None,
        SpecialKind::Slow => Some((
            meshes.add(RegularPolygon::new(icon_size, 6)),
            Color::srgb(0.18, 0.31, 0.09),
        )),
        SpecialKind::Bomb => Some((meshes.add(Circle::new(icon_size)), Color::srgb(0.1, 0.1, 0.1))),
        SpecialKind::BonusTime => Some((
            meshes.add(Annulus::new(icon_size * 0.75, icon_size)),
            Color::WHITE,
        )),
    };
    if let Some((mesh, color)) = icon {
        entity.with_child((
            Transform::from_xyz(0.0, 0.0, 0.0008),
            Mesh2d(mesh),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(color))),
        ));
    }
}

fn spawn_ceiling(mut commands: Commands) {
    commands.spawn((
        Name::new("Ceiling"),
        Ceiling,
        Sprite::from_color(CEILING_COLOR, Vec2::ONE),
        Transform::from_xyz(0.0, 0.0, 5.0),
        DespawnOnExit(Screen::Gameplay),
    ));
}

/// Stretch the ceiling band across the top of the field.
fn fit_ceiling(session: Res<Session>, mut ceiling: Single<(&mut Sprite, &mut Transform), With<Ceiling>>) {
    let field = &session.field;
    let band = session.config.ceiling_height;
    let (sprite, transform) = &mut *ceiling;
    sprite.custom_size = Some(Vec2::new(field.width, band));
    let center = field.to_world(Vec2::new(field.width / 2.0, band / 2.0));
    transform.translation.x = center.x;
    transform.translation.y = center.y;
}

fn draw_pins(mut gizmos: Gizmos, session: Res<Session>) {
    let field = &session.field;
    let pin_y = session.config.ceiling_height - 5.0;
    for pin in field.pins() {
        let head = field.to_world(Vec2::new(pin.x, pin_y));
        gizmos.circle_2d(head, PIN_SIZE, pin.color.to_color());
        gizmos.line_2d(head, head + Vec2::Y * PIN_NEEDLE, Color::srgb(0.2, 0.2, 0.2));
    }
}

// =============================================================================
// HUD
// =============================================================================

#[derive(Component)]
struct ScoreLabel;

#[derive(Component)]
struct LevelLabel;

#[derive(Component)]
struct TimerLabel;

#[derive(Component)]
struct SlowMotionBar;

#[derive(Component)]
struct SlowMotionFill;

/// Highlights the countdown for a moment after time is added.
#[derive(Resource, Default)]
struct TimerFlash(Option<Timer>);

const TIMER_FLASH_SECS: f32 = 1.0;
const TIMER_FLASH_COLOR: Color = Color::srgb(0.4, 1.0, 0.4);

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Name::new("HUD"),
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            top: Val::Px(40.0),
            padding: UiRect::horizontal(Val::Px(16.0)),
            justify_content: JustifyContent::SpaceBetween,
            ..default()
        },
        Pickable::IGNORE,
        DespawnOnExit(Screen::Gameplay),
        children![
            hud_label("Score Label", ScoreLabel),
            hud_label("Level Label", LevelLabel),
            hud_label("Timer Label", TimerLabel),
        ],
    ));

    commands.spawn((
        Name::new("Slow Motion Bar"),
        SlowMotionBar,
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(80.0),
            width: Val::Px(200.0),
            height: Val::Px(30.0),
            padding: UiRect::all(Val::Px(5.0)),
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        Visibility::Hidden,
        Pickable::IGNORE,
        DespawnOnExit(Screen::Gameplay),
        children![
            (
                Name::new("Slow Motion Fill"),
                SlowMotionFill,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                BackgroundColor(Color::srgb_u8(0x4E, 0xCD, 0xC4)),
            ),
            (
                Name::new("Slow Motion Text"),
                Text::new("SLOW MOTION"),
                TextFont::from_font_size(14.0),
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(50.0),
                    ..default()
                },
            ),
        ],
    ));
}

fn hud_label(name: &'static str, marker: impl Component) -> impl Bundle {
    (
        Name::new(name),
        marker,
        Text::default(),
        TextFont::from_font_size(24.0),
        TextColor(HUD_TEXT),
    )
}

fn flash_timer_on_bonus(
    time: Res<Time>,
    mut bonuses: MessageReader<BonusTime>,
    mut flash: ResMut<TimerFlash>,
) {
    if bonuses.read().count() > 0 {
        flash.0 = Some(Timer::from_seconds(TIMER_FLASH_SECS, TimerMode::Once));
    }
    if let Some(timer) = flash.0.as_mut()
        && timer.tick(time.delta()).is_finished()
    {
        flash.0 = None;
    }
}

fn update_hud(
    session: Res<Session>,
    flash: Res<TimerFlash>,
    mut score: Single<&mut Text, (With<ScoreLabel>, Without<LevelLabel>, Without<TimerLabel>)>,
    mut level: Single<&mut Text, (With<LevelLabel>, Without<ScoreLabel>, Without<TimerLabel>)>,
    mut timer: Single<(&mut Text, &mut TextColor), (With<TimerLabel>, Without<ScoreLabel>, Without<LevelLabel>)>,
    mut bar: Single<&mut Visibility, With<SlowMotionBar>>,
    mut fill: Single<&mut Node, With<SlowMotionFill>>,
) {
    score.0 = format!("Score: {}", session.score);
    level.0 = format!("Level: {}", session.level);

    let (timer_text, timer_color) = &mut *timer;
    timer_text.0 = format!("Time: {}", session.time_left());
    timer_color.0 = if flash.0.is_some() {
        TIMER_FLASH_COLOR
    } else {
        HUD_TEXT
    };

    let slow = &session.slow_motion;
    **bar = if slow.active {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    fill.width = Val::Percent(100.0 * slow.remaining_fraction(session.clock));
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::{config::SessionConfig, field::PlayField};

    #[test]
    fn topmost_drawn_bubble_is_the_one_hit() {
        let mut rng = StdRng::seed_from_u64(21);
        let config = SessionConfig::default();
        let mut field = PlayField::new(800.0, 600.0);
        // Enough spawns to pass any id wraparound
        for _ in 0..1500 {
            field.spawn_random(1, &config, &mut rng);
            if field.len() > 2 {
                field.remove(0);
            }
        }
        for bubble in field.bubbles_mut() {
            bubble.position = Vec2::new(300.0, 300.0);
        }

        let hit = field.hit_test(Vec2::new(300.0, 300.0)).unwrap();
        let topmost = (0..field.len())
            .max_by(|a, b| bubble_z(*a).total_cmp(&bubble_z(*b)))
            .unwrap();
        assert_eq!(hit, topmost);
        assert!(field.bubbles()[hit].id >= 1000);
    }
}
