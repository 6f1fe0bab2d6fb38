//! The main game module for the bubble popper.
//!
//! This module contains all the gameplay logic including:
//! - Bubble kinds, sizes and colors
//! - The play field and its ceiling pins
//! - Spawn pacing and upward motion
//! - Pop scoring, combos and bomb blasts
//! - The timed session and its levels
//! - Ranking persistence

mod bubble;
mod config;
mod debug;
mod field;
mod input;
mod motion;
mod polish;
mod powerups;
mod ranking;
mod render;
mod scoring;
mod sounds;
mod spawner;
mod state;

use bevy::prelude::*;

pub use polish::Effects;
pub use ranking::RankingView;
pub use state::{Session, SessionEnded};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        config::plugin,
        state::plugin,
        input::plugin,
        render::plugin,
        polish::plugin,
        sounds::plugin,
        ranking::plugin,
        debug::plugin,
    ));
}
