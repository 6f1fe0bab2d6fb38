//! The ranking menu: past rounds, best first.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use crate::{game::RankingView, menus::Menu, screens::Screen, theme::widget};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::Ranking), (request_ranking, spawn_ranking_menu));
    app.add_systems(
        Update,
        (
            fill_ranking_list,
            go_back.run_if(input_just_pressed(KeyCode::Escape)),
        )
            .run_if(in_state(Menu::Ranking)),
    );
}

/// Rows shown in the menu.
const VISIBLE_ROWS: usize = 10;

/// Container the rows are spawned into once the ranking has loaded.
#[derive(Component)]
struct RankingList;

#[derive(Component)]
struct Filled;

fn request_ranking(mut view: ResMut<RankingView>) {
    view.request_load();
}

fn spawn_ranking_menu(mut commands: Commands) {
    commands.spawn((
        widget::ui_root("Ranking Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::Ranking),
        children![
            widget::header("Ranking"),
            (
                Name::new("Ranking List"),
                RankingList,
                Node {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Start,
                    row_gap: Val::Px(6.0),
                    ..default()
                },
                children![widget::label("Loading...")],
            ),
            widget::button("Back", go_back_on_click),
        ],
    ));
}

fn fill_ranking_list(
    mut commands: Commands,
    view: Res<RankingView>,
    list: Query<Entity, (With<RankingList>, Without<Filled>)>,
) {
    let Some(entries) = &view.entries else {
        return;
    };
    let Ok(list) = list.single() else {
        return;
    };

    let mut list = commands.entity(list);
    list.insert(Filled).despawn_children();

    if entries.is_empty() {
        list.with_child(widget::label("No scores yet"));
        return;
    }

    let rows: Vec<String> = entries
        .iter()
        .take(VISIBLE_ROWS)
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>2}. {:<20} Level {:<3} {:>7} pts",
                i + 1,
                entry.name,
                entry.level,
                entry.score
            )
        })
        .collect();
    list.with_children(|parent| {
        for row in rows {
            parent.spawn(widget::label(row));
        }
    });
}

fn go_back_on_click(
    _: On<Pointer<Click>>,
    screen: Res<State<Screen>>,
    mut next_menu: ResMut<NextState<Menu>>,
) {
    next_menu.set(previous_menu(*screen.get()));
}

fn go_back(screen: Res<State<Screen>>, mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(previous_menu(*screen.get()));
}

/// The ranking is opened from the main menu or from the game over menu.
fn previous_menu(screen: Screen) -> Menu {
    if screen == Screen::Title {
        Menu::Main
    } else {
        Menu::GameOver
    }
}
