//! Tone cues for gameplay events.

use bevy::prelude::*;

use super::{
    bubble::SpecialKind,
    state::{BonusTime, BubblePopped, LevelUp, SessionEnded},
};
use crate::{
    audio::{PlayTone, ToneCue, Waveform},
    screens::Screen,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (pop_sounds, level_up_sounds, bonus_time_sounds, game_over_sounds)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Cues for one pop, in the order they should start.
pub fn pop_cues(event: &BubblePopped) -> Vec<PlayTone> {
    let report = &event.0;
    let bubble = &report.popped;
    let mut cues = Vec::new();

    if report.combo > 0 {
        cues.push(PlayTone::now(ToneCue::new(
            400.0 + 100.0 * report.combo as f32,
            0.2,
            Waveform::Square,
        )));
    }

    match bubble.kind {
        SpecialKind::Slow => {
            cues.push(PlayTone::now(ToneCue::sine(300.0, 0.3)));
            cues.push(PlayTone::after(150, ToneCue::sine(250.0, 0.4)));
            cues.push(PlayTone::after(300, ToneCue::sine(200.0, 0.5)));
        }
        SpecialKind::Bomb => {
            cues.push(PlayTone::now(ToneCue::new(100.0, 0.2, Waveform::Square)));
            if report.blasted.len() > 1 {
                cues.push(PlayTone::now(ToneCue::new(150.0, 0.3, Waveform::Sawtooth)));
                cues.push(PlayTone::after(100, ToneCue::new(800.0, 0.2, Waveform::Triangle)));
            }
            // A bomb has no regular pop note
            return cues;
        }
        SpecialKind::Normal | SpecialKind::BonusTime => {}
    }

    let frequency = 200.0 + bubble.points as f32 * 10.0 + bubble.radius() * 5.0;
    cues.push(PlayTone::now(ToneCue::new(frequency, 0.15, Waveform::Triangle)));
    cues
}

fn pop_sounds(mut popped: MessageReader<BubblePopped>, mut tones: MessageWriter<PlayTone>) {
    for event in popped.read() {
        tones.write_batch(pop_cues(event));
    }
}

fn level_up_sounds(mut level_ups: MessageReader<LevelUp>, mut tones: MessageWriter<PlayTone>) {
    for _ in level_ups.read() {
        tones.write_batch([
            PlayTone::now(ToneCue::sine(523.0, 0.1)),
            PlayTone::after(100, ToneCue::sine(659.0, 0.1)),
            PlayTone::after(200, ToneCue::sine(784.0, 0.2)),
        ]);
    }
}

fn bonus_time_sounds(mut bonuses: MessageReader<BonusTime>, mut tones: MessageWriter<PlayTone>) {
    for _ in bonuses.read() {
        tones.write_batch([
            PlayTone::now(ToneCue::sine(880.0, 0.2)),
            PlayTone::after(100, ToneCue::sine(1047.0, 0.2)),
        ]);
    }
}

fn game_over_sounds(mut ended: MessageReader<SessionEnded>, mut tones: MessageWriter<PlayTone>) {
    for _ in ended.read() {
        tones.write_batch([
            PlayTone::now(ToneCue::new(220.0, 0.3, Waveform::Sawtooth)),
            PlayTone::after(300, ToneCue::new(196.0, 0.5, Waveform::Sawtooth)),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::{Bubble, BubbleColor, BubbleSize},
        state::PopReport,
    };

    fn report(kind: SpecialKind, combo: usize, blasted: usize) -> BubblePopped {
        let bubble = Bubble {
            id: 1,
            position: Vec2::new(100.0, 100.0),
            color: BubbleColor::Red,
            size: BubbleSize::Large,
            kind,
            points: 10,
            speed: 1.0,
            wobble: 0.0,
            wobble_speed: 0.0,
            alpha: 1.0,
        };
        BubblePopped(PopReport {
            popped: bubble.clone(),
            points: 10,
            combo,
            blasted: vec![bubble; blasted],
            blast_radius: None,
            bonus_seconds: 0,
            slow_motion: false,
            level_up: None,
        })
    }

    #[test]
    fn plain_pop_pitch_follows_value_and_size() {
        let cues = pop_cues(&report(SpecialKind::Normal, 0, 0));
        assert_eq!(cues.len(), 1);
        // 200 + 10 * 10 + 50 * 5
        assert_eq!(cues[0].cue.frequency, 550.0);
        assert_eq!(cues[0].cue.waveform, Waveform::Triangle);
    }

    #[test]
    fn combo_adds_a_scaled_cue() {
        let cues = pop_cues(&report(SpecialKind::Normal, 2, 0));
        assert_eq!(cues[0].cue.frequency, 600.0);
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn area_blast_adds_follow_up() {
        assert_eq!(pop_cues(&report(SpecialKind::Bomb, 0, 1)).len(), 1);
        let cues = pop_cues(&report(SpecialKind::Bomb, 0, 3));
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[2].delay.as_millis(), 100);
    }
}
