//! State management module
//!
//! This module contains the countdown state machine and its snapshots.

pub mod timer_state;

// Re-export main types
pub use timer_state::{CountdownCore, Phase, TimerSnapshot};
