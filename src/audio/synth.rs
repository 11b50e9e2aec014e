//! Alarm tone rendering
//!
//! Renders the beep pattern and the fallback clip as mono f32 PCM buffers,
//! played through rodio's `SamplesBuffer`.

use std::f32::consts::TAU;
use std::time::Duration;

/// Sample rate of every rendered buffer.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of beeps in the alarm pattern.
pub const BEEP_COUNT: usize = 4;
/// Length of one beep.
pub const BEEP_SECONDS: f32 = 0.2;
/// Silence between beeps.
pub const BEEP_GAP_SECONDS: f32 = 0.18;
/// The beep chirps slightly downward over its length.
pub const SWEEP_START_HZ: f32 = 880.0;
pub const SWEEP_END_HZ: f32 = 830.0;

// Per-beep gain ramps; without these the beep edges click.
const ATTACK_SECONDS: f32 = 0.01;
const RELEASE_SECONDS: f32 = 0.03;

/// Render a single beep sweeping from `start_hz` to `end_hz`, with an
/// attack/release envelope. `volume` is linear gain in `[0, 1]`.
pub fn render_beep(start_hz: f32, end_hz: f32, seconds: f32, volume: f32) -> Vec<f32> {
    let total = (seconds * SAMPLE_RATE as f32) as usize;
    let attack = ((ATTACK_SECONDS * SAMPLE_RATE as f32) as usize).max(1);
    let release = ((RELEASE_SECONDS * SAMPLE_RATE as f32) as usize).max(1);
    let mut samples = Vec::with_capacity(total);
    // Phase accumulation keeps the sweep continuous; sampling a moving
    // frequency directly would distort the chirp.
    let mut phase = 0.0f32;
    for i in 0..total {
        let t = i as f32 / total as f32;
        let frequency = start_hz + (end_hz - start_hz) * t;
        let envelope = if i < attack {
            i as f32 / attack as f32
        } else if i + release >= total {
            (total - i) as f32 / release as f32
        } else {
            1.0
        };
        samples.push(phase.sin() * envelope * volume);
        phase = (phase + TAU * frequency / SAMPLE_RATE as f32) % TAU;
    }
    samples
}

/// Render the full alarm pattern: four sweeping beeps with fixed gaps.
pub fn render_alarm_pattern(volume: f32) -> Vec<f32> {
    let beep = render_beep(SWEEP_START_HZ, SWEEP_END_HZ, BEEP_SECONDS, volume);
    let gap = vec![0.0f32; (BEEP_GAP_SECONDS * SAMPLE_RATE as f32) as usize];
    let mut samples = Vec::with_capacity(BEEP_COUNT * (beep.len() + gap.len()));
    for i in 0..BEEP_COUNT {
        if i > 0 {
            samples.extend_from_slice(&gap);
        }
        samples.extend_from_slice(&beep);
    }
    samples
}

/// Render the short fallback clip (a single beep the alarm replays).
pub fn render_fallback_clip(seconds: f32, volume: f32) -> Vec<f32> {
    render_beep(SWEEP_START_HZ, SWEEP_END_HZ, seconds, volume)
}

/// Playback length of a rendered buffer.
pub fn buffer_duration(samples: &[f32]) -> Duration {
    Duration::from_secs_f64(samples.len() as f64 / SAMPLE_RATE as f64)
}
