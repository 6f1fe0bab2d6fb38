//! The game over menu, shown when the countdown runs out.

use bevy::prelude::*;

use crate::{
    game::{Effects, Session},
    menus::Menu,
    screens::Screen,
    theme::widget,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::GameOver), spawn_gameover_menu);
}

fn spawn_gameover_menu(mut commands: Commands, session: Res<Session>) {
    commands.spawn((
        widget::ui_root("Game Over Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::GameOver),
        children![
            widget::header("Game Over"),
            widget::label(format!("Final score: {}", session.score)),
            widget::label(format!("Level reached: {}", session.level)),
            widget::button("Restart", restart),
            widget::button("Ranking", open_ranking_menu),
            widget::button("Quit to title", quit_to_title),
        ],
    ));
}

/// Start a fresh round on the same screen.
fn restart(
    _: On<Pointer<Click>>,
    mut session: ResMut<Session>,
    mut effects: ResMut<Effects>,
    mut next_menu: ResMut<NextState<Menu>>,
) {
    session.restart(&mut rand::rng());
    effects.clear();
    next_menu.set(Menu::None);
}

fn open_ranking_menu(_: On<Pointer<Click>>, mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(Menu::Ranking);
}

fn quit_to_title(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Title);
}
