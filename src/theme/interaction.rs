use bevy::prelude::*;

use crate::audio::{PlayTone, ToneCue, Waveform};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, apply_interaction_palette);

    app.add_observer(play_on_hover_sound_effect);
    app.add_observer(play_on_click_sound_effect);
}

/// Palette for widget interactions. Add this to an entity that supports
/// [`Interaction`]s, such as a button, to change its [`BackgroundColor`] based
/// on the current interaction state.
#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
pub struct InteractionPalette {
    pub none: Color,
    pub hovered: Color,
    pub pressed: Color,
}

fn apply_interaction_palette(
    mut palette_query: Query<
        (&Interaction, &InteractionPalette, &mut BackgroundColor),
        Changed<Interaction>,
    >,
) {
    for (interaction, palette, mut background) in &mut palette_query {
        *background = match interaction {
            Interaction::None => palette.none,
            Interaction::Hovered => palette.hovered,
            Interaction::Pressed => palette.pressed,
        }
        .into();
    }
}

const HOVER_CUE: ToneCue = ToneCue::new(520.0, 0.05, Waveform::Sine);
const CLICK_CUE: ToneCue = ToneCue::new(780.0, 0.08, Waveform::Triangle);

fn play_on_hover_sound_effect(
    trigger: On<Pointer<Over>>,
    interaction_query: Query<(), With<Interaction>>,
    mut tones: MessageWriter<PlayTone>,
) {
    if interaction_query.contains(trigger.entity) {
        tones.write(PlayTone::now(HOVER_CUE));
    }
}

fn play_on_click_sound_effect(
    trigger: On<Pointer<Click>>,
    interaction_query: Query<(), With<Interaction>>,
    mut tones: MessageWriter<PlayTone>,
) {
    if interaction_query.contains(trigger.entity) {
        tones.write(PlayTone::now(CLICK_CUE));
    }
}
