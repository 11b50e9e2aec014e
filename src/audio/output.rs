//! Audio output seam
//!
//! The alarm talks to audio hardware through the [`AudioOutput`] trait.
//! The production implementation drives rodio from a dedicated thread,
//! because rodio's `OutputStream` is not `Send`; commands cross an mpsc
//! channel and replies come back with a bounded wait so a wedged device
//! degrades into the next fallback tier instead of hanging a caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{buffer::SamplesBuffer, OutputStream, Sink};
use thiserror::Error;
use tracing::{debug, warn};

/// How long to wait for the audio thread before giving up on a request.
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("no audio device available")]
    DeviceUnavailable,
    #[error("audio thread unresponsive")]
    Unresponsive,
}

/// An output the alarm can play rendered buffers through.
///
/// `unlock` and `resume` are best-effort and report success; `suspend` and
/// `halt` are fire-and-forget. Implementations must never panic.
pub trait AudioOutput: Send + Sync {
    /// Try to bring the output up (open the device). Idempotent.
    fn unlock(&self) -> bool;

    /// Whether a previous unlock succeeded.
    fn is_unlocked(&self) -> bool;

    /// Resume a suspended output, opening the device if needed.
    fn resume(&self) -> bool;

    /// Queue a mono f32 buffer for playback.
    fn play(&self, samples: Arc<[f32]>, sample_rate: u32) -> Result<(), AudioError>;

    /// Pause playback without releasing the device.
    fn suspend(&self);

    /// Stop playback and discard anything queued (rewind).
    fn halt(&self);
}

/// Device vibration, the last alarm tier. Desktop hosts have no motor, so
/// the default implementation only logs; embedders can supply a real one.
pub trait Vibrator: Send + Sync {
    fn vibrate(&self, pattern_ms: &[u64]);
    fn cancel(&self);
}

/// Logging no-op vibrator.
#[derive(Debug, Default)]
pub struct NullVibrator;

impl Vibrator for NullVibrator {
    fn vibrate(&self, pattern_ms: &[u64]) {
        debug!(?pattern_ms, "vibration requested (no motor on this host)");
    }

    fn cancel(&self) {}
}

enum OutputCommand {
    Unlock { done: Sender<bool> },
    Resume { done: Sender<bool> },
    Play {
        samples: Arc<[f32]>,
        sample_rate: u32,
        done: Sender<Result<(), AudioError>>,
    },
    Suspend,
    Halt,
}

/// Rodio-backed output. The stream and sink live on a dedicated thread and
/// are opened lazily on the first unlock/resume/play, then reused for the
/// lifetime of the output.
pub struct RodioOutput {
    commands: Sender<OutputCommand>,
    unlocked: AtomicBool,
}

impl RodioOutput {
    pub fn new() -> Self {
        let (commands, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("focusdial-audio".into())
            .spawn(move || audio_thread(receiver));
        if let Err(e) = spawned {
            // Requests will fail closed and push the alarm down a tier.
            warn!("failed to spawn audio thread: {}", e);
        }
        Self {
            commands,
            unlocked: AtomicBool::new(false),
        }
    }

    fn request_bool(&self, command: impl FnOnce(Sender<bool>) -> OutputCommand) -> bool {
        let (done, reply) = mpsc::channel();
        if self.commands.send(command(done)).is_err() {
            return false;
        }
        matches!(reply.recv_timeout(REPLY_TIMEOUT), Ok(true))
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for RodioOutput {
    fn unlock(&self) -> bool {
        if self.unlocked.load(Ordering::Relaxed) {
            return true;
        }
        let ok = self.request_bool(|done| OutputCommand::Unlock { done });
        if ok {
            self.unlocked.store(true, Ordering::Relaxed);
            debug!("audio output unlocked");
        }
        ok
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Relaxed)
    }

    fn resume(&self) -> bool {
        let ok = self.request_bool(|done| OutputCommand::Resume { done });
        if ok {
            self.unlocked.store(true, Ordering::Relaxed);
        }
        ok
    }

    fn play(&self, samples: Arc<[f32]>, sample_rate: u32) -> Result<(), AudioError> {
        let (done, reply) = mpsc::channel();
        self.commands
            .send(OutputCommand::Play {
                samples,
                sample_rate,
                done,
            })
            .map_err(|_| AudioError::DeviceUnavailable)?;
        reply
            .recv_timeout(REPLY_TIMEOUT)
            .unwrap_or(Err(AudioError::Unresponsive))
    }

    fn suspend(&self) {
        let _ = self.commands.send(OutputCommand::Suspend);
    }

    fn halt(&self) {
        let _ = self.commands.send(OutputCommand::Halt);
    }
}

struct OutputState {
    // Held only to keep the device open; dropping it kills the sink.
    _stream: OutputStream,
    handle: rodio::OutputStreamHandle,
    sink: Sink,
}

fn audio_thread(commands: Receiver<OutputCommand>) {
    let mut output: Option<OutputState> = None;
    while let Ok(command) = commands.recv() {
        match command {
            OutputCommand::Unlock { done } => {
                let _ = done.send(ensure_output(&mut output).is_some());
            }
            OutputCommand::Resume { done } => {
                let ok = match ensure_output(&mut output) {
                    Some(state) => {
                        state.sink.play();
                        true
                    }
                    None => false,
                };
                let _ = done.send(ok);
            }
            OutputCommand::Play {
                samples,
                sample_rate,
                done,
            } => {
                let result = if ensure_output(&mut output).is_some() {
                    play_buffer(&mut output, samples, sample_rate)
                } else {
                    Err(AudioError::DeviceUnavailable)
                };
                let _ = done.send(result);
            }
            OutputCommand::Suspend => {
                if let Some(state) = &output {
                    state.sink.pause();
                }
            }
            OutputCommand::Halt => {
                if let Some(state) = &output {
                    state.sink.stop();
                }
            }
        }
    }
}

fn ensure_output(slot: &mut Option<OutputState>) -> Option<&OutputState> {
    if slot.is_none() {
        match OutputStream::try_default() {
            Ok((stream, handle)) => match Sink::try_new(&handle) {
                Ok(sink) => {
                    *slot = Some(OutputState {
                        _stream: stream,
                        handle,
                        sink,
                    });
                }
                Err(e) => warn!("failed to create audio sink: {}", e),
            },
            Err(e) => debug!("audio device unavailable: {}", e),
        }
    }
    slot.as_ref()
}

fn play_buffer(
    slot: &mut Option<OutputState>,
    samples: Arc<[f32]>,
    sample_rate: u32,
) -> Result<(), AudioError> {
    let Some(state) = slot.as_mut() else {
        return Err(AudioError::DeviceUnavailable);
    };
    // A stopped sink is not reliably reusable; replace it per play so a
    // prior halt never mutes the next run.
    state.sink.stop();
    match Sink::try_new(&state.handle) {
        Ok(sink) => {
            sink.append(SamplesBuffer::new(1, sample_rate, samples.to_vec()));
            sink.play();
            state.sink = sink;
            Ok(())
        }
        Err(e) => {
            warn!("failed to create audio sink: {}", e);
            Err(AudioError::DeviceUnavailable)
        }
    }
}

/// Output that accepts everything and produces no sound. Used by the demo
/// under `--mute` and anywhere a host runs without audio hardware.
#[derive(Debug, Default)]
pub struct NullOutput {
    unlocked: AtomicBool,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for NullOutput {
    fn unlock(&self) -> bool {
        self.unlocked.store(true, Ordering::Relaxed);
        true
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Relaxed)
    }

    fn resume(&self) -> bool {
        true
    }

    fn play(&self, samples: Arc<[f32]>, sample_rate: u32) -> Result<(), AudioError> {
        debug!(
            samples = samples.len(),
            sample_rate, "muted output discarding buffer"
        );
        Ok(())
    }

    fn suspend(&self) {}

    fn halt(&self) {}
}
