//! Focusdial - analog-dial focus timer
//!
//! Demo driver: scripts a drag gesture to the requested duration, follows
//! the countdown, and sounds the alarm on completion.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use focusdial::{
    audio::{Alarm, AlarmConfig, AudioOutput, NullOutput, NullVibrator, RodioOutput},
    config::Config,
    coordinator::Coordinator,
    dial::{DialGeometry, DialSurface, GestureEvent, Point},
    state::Phase,
    tasks::CountdownEngine,
    utils::shutdown_signal,
};

const DIAL_CENTER: Point = Point { x: 160.0, y: 160.0 };
const DIAL_RADIUS: f64 = 120.0;

/// Fixed-geometry dial used by the scripted gesture.
struct DemoDial;

impl DialSurface for DemoDial {
    fn measure(&self) -> Option<DialGeometry> {
        Some(DialGeometry {
            center: DIAL_CENTER,
        })
    }
}

/// Point on the dial rim at a given minute mark (6 degrees per minute).
fn rim_point(minutes: u32) -> Point {
    let rad = (f64::from(minutes) * 6.0).to_radians();
    Point::new(
        DIAL_CENTER.x + rad.sin() * DIAL_RADIUS,
        DIAL_CENTER.y - rad.cos() * DIAL_RADIUS,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("focusdial={}", config.log_level()))
        .init();

    info!("Starting focusdial v1.0.0");
    info!(
        "Configuration: minutes={}, volume={}, clip_alarm={}, mute={}",
        config.demo_minutes(),
        config.volume,
        config.clip_alarm,
        config.mute
    );

    let (primary, fallback): (Arc<dyn AudioOutput>, Arc<dyn AudioOutput>) = if config.mute {
        (Arc::new(NullOutput::new()), Arc::new(NullOutput::new()))
    } else {
        (Arc::new(RodioOutput::new()), Arc::new(RodioOutput::new()))
    };
    let alarm = Alarm::new(
        primary,
        fallback,
        Arc::new(NullVibrator),
        AlarmConfig {
            volume: config.alarm_volume(),
            force_clip: config.clip_alarm,
            ..AlarmConfig::default()
        },
    );
    let engine = CountdownEngine::new();
    let coordinator = Coordinator::new(Arc::clone(&engine), Arc::clone(&alarm));

    // Scripted gesture: press at 12 o'clock, sweep to the target, release.
    let dial = DemoDial;
    let minutes = config.demo_minutes();
    coordinator.handle_gesture(&dial, GestureEvent::Start(rim_point(60)));
    coordinator.handle_gesture(&dial, GestureEvent::Move(rim_point(minutes.max(2) / 2)));
    coordinator.handle_gesture(&dial, GestureEvent::Move(rim_point(minutes)));
    let (_, preview) = coordinator.preview();
    info!("Drag preview: {:?} minutes", preview);
    coordinator.handle_gesture(&dial, GestureEvent::End(rim_point(minutes)));

    let mut snapshots = engine.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *snapshots.borrow_and_update();
                let readout = coordinator.display();
                info!(
                    "[{}] {}:{}",
                    readout.label.as_str(),
                    readout.minutes_text,
                    readout.seconds_text
                );
                if snapshot.phase == Phase::Done {
                    info!("Session complete, alarm sounding");
                    // Let the beep pattern play out before exiting
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    coordinator.dismiss();
                    alarm.stop();
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                coordinator.reset();
                alarm.stop();
                break;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&coordinator.summary())?);
    info!("Focusdial shutdown complete");
    Ok(())
}
