//! Completion alarm
//!
//! Plays the synthesized beep pattern through the primary output, falling
//! back to repeated playback of a pre-rendered clip, and finally to device
//! vibration. Every tier failure is absorbed here: `prime`, `play` and
//! `stop` never error or block toward the caller.
//!
//! Cancellation is cooperative: each `play` advances a run id, and the
//! fallback repeat loop re-checks it at every iteration boundary, so a
//! `stop` (or a newer `play`) makes the stale loop stand down at its next
//! check rather than being killed mid-flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::output::{AudioOutput, Vibrator};
use super::synth;

/// Alarm tuning knobs.
#[derive(Debug, Clone)]
pub struct AlarmConfig {
    /// Linear gain in `[0, 1]` applied when rendering the tones.
    pub volume: f32,
    /// Skip the synthesized tier and go straight to the clip.
    pub force_clip: bool,
    /// How many times the fallback clip repeats.
    pub clip_repeats: u32,
    /// Length of the fallback clip.
    pub clip_seconds: f32,
    /// Silence between clip repeats.
    pub clip_gap: Duration,
    /// Vibration on/off intervals for the last tier.
    pub vibration_pattern_ms: Vec<u64>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            force_clip: false,
            clip_repeats: 3,
            clip_seconds: 0.45,
            clip_gap: Duration::from_millis(300),
            vibration_pattern_ms: vec![200, 100, 200, 100, 200],
        }
    }
}

/// The alarm resource. Constructed once, shared via `Arc`; the outputs it
/// owns are opened lazily and reused for the process lifetime.
pub struct Alarm {
    primary: Arc<dyn AudioOutput>,
    fallback: Arc<dyn AudioOutput>,
    vibrator: Arc<dyn Vibrator>,
    config: AlarmConfig,
    pattern: Arc<[f32]>,
    clip: Arc<[f32]>,
    clip_duration: Duration,
    run: AtomicU64,
}

impl Alarm {
    pub fn new(
        primary: Arc<dyn AudioOutput>,
        fallback: Arc<dyn AudioOutput>,
        vibrator: Arc<dyn Vibrator>,
        config: AlarmConfig,
    ) -> Arc<Self> {
        let pattern: Arc<[f32]> = synth::render_alarm_pattern(config.volume).into();
        let clip: Arc<[f32]> =
            synth::render_fallback_clip(config.clip_seconds, config.volume).into();
        let clip_duration = synth::buffer_duration(&clip);
        Arc::new(Self {
            primary,
            fallback,
            vibrator,
            config,
            pattern,
            clip,
            clip_duration,
            run: AtomicU64::new(0),
        })
    }

    /// Best-effort unlock of both outputs. Idempotent, safe to call before
    /// any user gesture; meant to be invoked on the first interaction.
    pub fn prime(&self) {
        if !self.primary.unlock() {
            debug!("primary audio output still locked");
        }
        if !self.fallback.unlock() {
            debug!("fallback audio output still locked");
        }
    }

    /// Sound the alarm. Fire-and-forget: playback runs on a spawned task
    /// and every failure path degrades to the next tier.
    pub fn play(self: &Arc<Self>) {
        let run = self.advance_run();
        info!(run, "alarm requested");
        let alarm = Arc::clone(self);
        tokio::spawn(async move {
            alarm.play_run(run).await;
        });
    }

    /// Silence the alarm. Idempotent; invalidates any in-flight fallback
    /// loop, halts and rewinds the clip output, cancels vibration, and
    /// suspends the primary output without tearing it down.
    pub fn stop(&self) {
        self.advance_run();
        self.fallback.halt();
        self.vibrator.cancel();
        self.primary.suspend();
        info!("alarm stopped");
    }

    async fn play_run(&self, run: u64) {
        if self.config.force_clip || platform_prefers_clip() {
            debug!("synthesized tier skipped on this platform");
            self.play_fallback(run).await;
            return;
        }
        if !self.primary.resume() {
            warn!("primary audio output blocked, falling back to clip");
            self.play_fallback(run).await;
            return;
        }
        match self
            .primary
            .play(Arc::clone(&self.pattern), synth::SAMPLE_RATE)
        {
            Ok(()) => debug!("synthesized alarm pattern playing"),
            Err(e) => {
                warn!("synthesized alarm failed ({}), falling back to clip", e);
                self.play_fallback(run).await;
            }
        }
    }

    async fn play_fallback(&self, run: u64) {
        let mut any_played = false;
        for repeat in 0..self.config.clip_repeats {
            if self.run.load(Ordering::SeqCst) != run {
                debug!(run, "fallback loop cancelled");
                return;
            }
            match self.fallback.play(Arc::clone(&self.clip), synth::SAMPLE_RATE) {
                Ok(()) => {
                    any_played = true;
                    debug!(repeat, "fallback clip repeat playing");
                    sleep(self.clip_duration + self.config.clip_gap).await;
                }
                Err(e) => {
                    // Vibrate only if nothing audible got out; after a
                    // successful repeat the user already heard something.
                    if any_played {
                        debug!("fallback clip rejected after audible repeat: {}", e);
                    } else {
                        warn!("fallback clip rejected ({}), vibrating", e);
                        self.vibrator.vibrate(&self.config.vibration_pattern_ms);
                    }
                    return;
                }
            }
        }
    }

    fn advance_run(&self) -> u64 {
        self.run.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Platforms where the synthesized path is known to be unreliable go
/// straight to the clip tier.
fn platform_prefers_clip() -> bool {
    cfg!(any(target_os = "ios", target_os = "android"))
}
