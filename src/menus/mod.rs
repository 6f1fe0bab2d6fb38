//! The game's menus and transitions between them.

mod gameover;
mod main;
mod pause;
mod ranking;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.init_state::<Menu>();

    app.add_plugins((
        gameover::plugin,
        main::plugin,
        pause::plugin,
        ranking::plugin,
    ));
}

#[derive(States, Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Menu {
    #[default]
    None,
    Main,
    Pause,
    GameOver,
    Ranking,
}
