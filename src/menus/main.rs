//! The main menu (seen on the title screen).

use bevy::prelude::*;

use crate::{menus::Menu, screens::Screen, theme::widget};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::Main), spawn_main_menu);
}

fn spawn_main_menu(mut commands: Commands) {
    commands.spawn((
        widget::ui_root("Main Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::Main),
        #[cfg(not(target_family = "wasm"))]
        children![
            widget::header("Bubble Pop"),
            widget::label("Pop the bubbles before they reach the ceiling!"),
            widget::button("Play", enter_gameplay_screen),
            widget::button("Ranking", open_ranking_menu),
            widget::button("Exit", exit_app),
        ],
        #[cfg(target_family = "wasm")]
        children![
            widget::header("Bubble Pop"),
            widget::label("Pop the bubbles before they reach the ceiling!"),
            widget::button("Play", enter_gameplay_screen),
            widget::button("Ranking", open_ranking_menu),
        ],
    ));
}

fn enter_gameplay_screen(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Gameplay);
}

fn open_ranking_menu(_: On<Pointer<Click>>, mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(Menu::Ranking);
}

#[cfg(not(target_family = "wasm"))]
fn exit_app(_: On<Pointer<Click>>, mut app_exit: MessageWriter<AppExit>) {
    app_exit.write(AppExit::Success);
}
