//! Background tasks module
//!
//! This module contains the asynchronous tick driver behind the countdown.

pub mod countdown;

// Re-export main types
pub use countdown::CountdownEngine;
