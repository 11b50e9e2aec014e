//! Focusdial - an in-process engine for an analog-dial focus timer
//!
//! Drag gestures over a circular dial surface become committed durations,
//! a countdown engine ticks them to zero, and completion triggers a tiered
//! alarm (synthesized beeps, then a pre-rendered clip, then vibration).
//! Rendering and styling live in the host; this crate is the interaction
//! core behind them.

pub mod audio;
pub mod config;
pub mod coordinator;
pub mod dial;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use audio::{Alarm, AlarmConfig, AudioOutput, Vibrator};
pub use config::Config;
pub use coordinator::{Coordinator, Display, Label};
pub use dial::{DialSurface, DragController, GestureEvent};
pub use state::{Phase, TimerSnapshot};
pub use tasks::CountdownEngine;
pub use utils::signals::shutdown_signal;
