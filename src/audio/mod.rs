//! Alarm subsystem module
//!
//! Synthesized beep pattern, pre-rendered clip fallback, and vibration,
//! behind the tiered [`Alarm`] resource.

pub mod alarm;
pub mod output;
pub mod synth;

// Re-export main types
pub use alarm::{Alarm, AlarmConfig};
pub use output::{AudioError, AudioOutput, NullOutput, NullVibrator, RodioOutput, Vibrator};
