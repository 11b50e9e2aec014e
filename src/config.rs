//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "focusdial")]
#[command(about = "Analog-dial focus timer: drag to set, count down, alarm on completion")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Target duration in minutes for the scripted demo drag (1-60)
    #[arg(short, long, default_value = "1")]
    pub minutes: u32,

    /// Alarm volume, 0-100
    #[arg(long, default_value = "80")]
    pub volume: u8,

    /// Skip the synthesized alarm and use the clip fallback path
    #[arg(long)]
    pub clip_alarm: bool,

    /// Run without an audio device
    #[arg(long)]
    pub mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Alarm gain as a linear factor in [0, 1]
    pub fn alarm_volume(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }

    /// Demo drag target, clamped to the dial's domain
    pub fn demo_minutes(&self) -> u32 {
        self.minutes.clamp(1, 60)
    }
}
