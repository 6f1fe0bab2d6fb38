//! Pointer and touch input.
//!
//! Presses are projected through the camera, so a shaking camera still hits
//! the bubble that was drawn under the pointer.

use bevy::{prelude::*, window::PrimaryWindow};

use super::state::{BonusTime, BubblePopped, LevelUp, Session};
use crate::{AppSystems, PausableSystems, menus::Menu, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        handle_pop_input
            .in_set(AppSystems::RecordInput)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay).and(in_state(Menu::None))),
    );
}

/// Points pressed this frame: the mouse cursor on a left click, plus new touches.
fn pressed_points(
    window: &Window,
    mouse: &ButtonInput<MouseButton>,
    touches: &Touches,
) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = touches.iter_just_pressed().map(|touch| touch.position()).collect();
    if mouse.just_pressed(MouseButton::Left)
        && let Some(cursor) = window.cursor_position()
    {
        points.push(cursor);
    }
    points
}

fn handle_pop_input(
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<(&Camera, &GlobalTransform)>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut session: ResMut<Session>,
    mut popped_events: MessageWriter<BubblePopped>,
    mut level_events: MessageWriter<LevelUp>,
    mut bonus_events: MessageWriter<BonusTime>,
) {
    let (camera, camera_transform) = *camera;
    for cursor in pressed_points(&window, &mouse, &touches) {
        let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else {
            continue;
        };
        let point = session.field.to_field(world);
        let Some(report) = session.pop_at(point) else {
            continue;
        };

        if report.bonus_seconds > 0 {
            bonus_events.write(BonusTime {
                seconds: report.bonus_seconds,
            });
        }
        if let Some(level) = report.level_up {
            level_events.write(LevelUp { level });
            bonus_events.write(BonusTime {
                seconds: session.config.level_up_seconds,
            });
        }
        popped_events.write(BubblePopped(report));
    }
}
