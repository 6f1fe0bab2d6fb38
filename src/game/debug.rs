//! Debug visualization for the play field.
//!
//! Toggle with the 'D' key during gameplay.
//! Shows:
//! - Hit circles for every bubble
//! - Blast radius around bombs
//! - The ceiling line
//! - Bubble count against the current target density

use bevy::{color::palettes::css, input::common_conditions::input_just_pressed, prelude::*};

use super::{
    bubble::SpecialKind,
    scoring::{BOMB_RADIUS_FACTOR, max_pop_points},
    state::Session,
};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DebugOverlayVisible>();

    // Toggle debug with 'D' key
    app.add_systems(
        Update,
        toggle_debug.run_if(in_state(Screen::Gameplay).and(input_just_pressed(KeyCode::KeyD))),
    );

    app.add_systems(
        Update,
        (draw_hit_circles, draw_ceiling_line, update_density_readout)
            .run_if(in_state(Screen::Gameplay).and(debug_visible)),
    );
    app.add_systems(OnEnter(Screen::Gameplay), spawn_density_readout);
}

/// Resource to track if the debug overlay is visible.
#[derive(Resource, Default)]
pub struct DebugOverlayVisible(pub bool);

fn debug_visible(debug: Res<DebugOverlayVisible>) -> bool {
    debug.0
}

fn toggle_debug(
    mut debug: ResMut<DebugOverlayVisible>,
    mut readout: Query<&mut Visibility, With<DensityReadout>>,
) {
    debug.0 = !debug.0;
    let state = if debug.0 { "ON" } else { "OFF" };
    info!("Debug overlay: {}", state);

    for mut visibility in &mut readout {
        *visibility = if debug.0 {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

fn draw_hit_circles(mut gizmos: Gizmos, session: Res<Session>) {
    let field = &session.field;
    for bubble in field.bubbles() {
        let center = field.to_world(bubble.position);
        let color = match bubble.kind {
            SpecialKind::Normal => css::WHITE.with_alpha(0.4),
            SpecialKind::Slow => css::LIMEGREEN.with_alpha(0.7),
            SpecialKind::Bomb => css::INDIAN_RED.with_alpha(0.7),
            SpecialKind::BonusTime => css::GOLD.with_alpha(0.7),
        };
        gizmos.circle_2d(center, bubble.radius(), color);

        if bubble.kind == SpecialKind::Bomb {
            gizmos.circle_2d(
                center,
                bubble.radius() * BOMB_RADIUS_FACTOR,
                css::ORANGE.with_alpha(0.3),
            );
        }
    }
}

fn draw_ceiling_line(mut gizmos: Gizmos, session: Res<Session>) {
    let field = &session.field;
    let y = session.config.ceiling_height;
    gizmos.line_2d(
        field.to_world(Vec2::new(0.0, y)),
        field.to_world(Vec2::new(field.width, y)),
        css::RED.with_alpha(0.6),
    );
}

#[derive(Component)]
struct DensityReadout;

fn spawn_density_readout(mut commands: Commands, debug: Res<DebugOverlayVisible>) {
    commands.spawn((
        Name::new("Density Readout"),
        DensityReadout,
        Text::default(),
        TextFont::from_font_size(14.0),
        TextColor(css::AQUA.into()),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            bottom: Val::Px(10.0),
            ..default()
        },
        if debug.0 {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        },
        Pickable::IGNORE,
        DespawnOnExit(Screen::Gameplay),
    ));
}

fn update_density_readout(session: Res<Session>, mut readout: Query<&mut Text, With<DensityReadout>>) {
    let spawner = &session.spawner;
    let target = spawner.target_density();
    let interval = spawner.dynamic_interval(session.field.len());
    for mut text in &mut readout {
        text.0 = format!(
            "bubbles {}/{:.1} (max {})  interval {}ms  pins {}  pop cap {}",
            session.field.len(),
            target,
            spawner.max_bubbles,
            interval.as_millis(),
            session.field.pin_count(),
            max_pop_points(spawner.max_bubbles),
        );
    }
}
