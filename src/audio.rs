//! Synthesized tone cues.
//!
//! The game has no sound files: every cue is a short oscillator tone with an
//! exponential fade. Follow-up notes are queued with a delay and released by
//! a per-frame timer instead of spawning their own callbacks.

use std::{f32::consts::TAU, time::Duration};

use bevy::{
    audio::{AddAudioSource, Decodable, Source},
    prelude::*,
};

pub(super) fn plugin(app: &mut App) {
    app.add_audio_source::<Tone>();
    app.init_resource::<ToneQueue>();
    app.add_message::<PlayTone>();

    app.add_systems(
        Update,
        (
            (queue_tones, release_due_tones).chain(),
            apply_global_volume.run_if(resource_changed::<GlobalVolume>),
        ),
    );
}

/// Output sample rate for generated tones.
const SAMPLE_RATE: u32 = 44_100;

/// Envelope start and end gain.
const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

/// Oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample at `phase` in `[0, 1)`.
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// A single note: frequency in Hz, duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ToneCue {
    pub frequency: f32,
    pub duration: f32,
    pub waveform: Waveform,
}

impl ToneCue {
    pub const fn new(frequency: f32, duration: f32, waveform: Waveform) -> Self {
        Self {
            frequency,
            duration,
            waveform,
        }
    }

    pub const fn sine(frequency: f32, duration: f32) -> Self {
        Self::new(frequency, duration, Waveform::Sine)
    }
}

/// Request to play a cue, optionally after a delay.
#[derive(Message, Debug, Clone)]
pub struct PlayTone {
    pub cue: ToneCue,
    pub delay: Duration,
}

impl PlayTone {
    pub fn now(cue: ToneCue) -> Self {
        Self {
            cue,
            delay: Duration::ZERO,
        }
    }

    pub fn after(millis: u64, cue: ToneCue) -> Self {
        Self {
            cue,
            delay: Duration::from_millis(millis),
        }
    }
}

/// Audio asset holding one tone.
#[derive(Asset, TypePath, Debug, Clone)]
pub struct Tone(pub ToneCue);

impl Decodable for Tone {
    type DecoderItem = <ToneDecoder as Iterator>::Item;
    type Decoder = ToneDecoder;

    fn decoder(&self) -> Self::Decoder {
        ToneDecoder::new(self.0)
    }
}

/// Finite oscillator with an exponential fade-out.
pub struct ToneDecoder {
    cue: ToneCue,
    phase: f32,
    index: u32,
    total: u32,
}

impl ToneDecoder {
    pub fn new(cue: ToneCue) -> Self {
        Self {
            cue,
            phase: 0.0,
            index: 0,
            total: (cue.duration.max(0.0) * SAMPLE_RATE as f32) as u32,
        }
    }

    fn gain(&self) -> f32 {
        let t = self.index as f32 / self.total.max(1) as f32;
        START_GAIN * (END_GAIN / START_GAIN).powf(t)
    }
}

impl Iterator for ToneDecoder {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.total {
            return None;
        }
        let sample = self.cue.waveform.sample(self.phase) * self.gain();
        self.phase = (self.phase + self.cue.frequency / SAMPLE_RATE as f32).fract();
        self.index += 1;
        Some(sample)
    }
}

impl Source for ToneDecoder {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(self.cue.duration.max(0.0)))
    }
}

/// Tones waiting for their delay to elapse.
#[derive(Resource, Debug, Default)]
pub struct ToneQueue {
    pending: Vec<(Duration, ToneCue)>,
}

impl ToneQueue {
    pub fn push(&mut self, delay: Duration, cue: ToneCue) {
        self.pending.push((delay, cue));
    }

    /// Count down by `delta` and return the cues now due.
    pub fn advance(&mut self, delta: Duration) -> Vec<ToneCue> {
        let mut due = Vec::new();
        self.pending.retain_mut(|(remaining, cue)| {
            *remaining = remaining.saturating_sub(delta);
            if remaining.is_zero() {
                due.push(*cue);
                false
            } else {
                true
            }
        });
        due
    }
}

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct SoundEffect;

/// A one-shot tone that despawns when finished.
pub fn sound_effect(handle: Handle<Tone>) -> impl Bundle {
    (AudioPlayer(handle), PlaybackSettings::DESPAWN, SoundEffect)
}

fn queue_tones(mut requests: MessageReader<PlayTone>, mut queue: ResMut<ToneQueue>) {
    for request in requests.read() {
        queue.push(request.delay, request.cue);
    }
}

fn release_due_tones(
    mut commands: Commands,
    time: Res<Time>,
    mut queue: ResMut<ToneQueue>,
    mut tones: ResMut<Assets<Tone>>,
) {
    for cue in queue.advance(time.delta()) {
        commands.spawn((Name::new("Tone"), sound_effect(tones.add(Tone(cue)))));
    }
}

fn apply_global_volume(
    global_volume: Res<GlobalVolume>,
    mut audio_query: Query<(&PlaybackSettings, &mut AudioSink)>,
) {
    for (playback, mut sink) in &mut audio_query {
        sink.set_volume(global_volume.volume * playback.volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_length_matches_duration() {
        let decoder = ToneDecoder::new(ToneCue::sine(440.0, 0.1));
        assert_eq!(decoder.count(), (0.1 * SAMPLE_RATE as f32) as usize);
    }

    #[test]
    fn envelope_fades_from_start_to_end_gain() {
        let samples: Vec<f32> =
            ToneDecoder::new(ToneCue::new(100.0, 0.2, Waveform::Square)).collect();
        assert!((samples[0].abs() - START_GAIN).abs() < 1e-4);
        let last = samples.last().copied().unwrap_or_default().abs();
        assert!(last < 0.011 && last > 0.009);
    }

    #[test]
    fn waveforms_stay_in_range() {
        for waveform in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle] {
            for i in 0..100 {
                let s = waveform.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn queue_releases_cues_in_delay_order() {
        let mut queue = ToneQueue::default();
        queue.push(Duration::ZERO, ToneCue::sine(523.0, 0.1));
        queue.push(Duration::from_millis(100), ToneCue::sine(659.0, 0.1));
        queue.push(Duration::from_millis(200), ToneCue::sine(784.0, 0.2));

        assert_eq!(queue.advance(Duration::from_millis(16)).len(), 1);
        assert!(queue.advance(Duration::from_millis(50)).is_empty());
        let due = queue.advance(Duration::from_millis(50));
        assert_eq!(due, vec![ToneCue::sine(659.0, 0.1)]);
        assert_eq!(queue.advance(Duration::from_millis(100)).len(), 1);
        assert!(queue.advance(Duration::from_secs(1)).is_empty());
    }
}
