//! Coordinator: wires drag commits into the countdown and completions into
//! the alarm, and derives the display values the presentation layer reads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::audio::Alarm;
use crate::dial::{DialSurface, DragController, DragSignal, GestureEvent};
use crate::state::{Phase, TimerSnapshot};
use crate::tasks::CountdownEngine;

/// Shown when the timer is idle and nothing was ever committed.
pub const PLACEHOLDER: &str = "--";

/// Display label for the flip-clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    #[serde(rename = "FOC")]
    Foc,
    #[serde(rename = "SET")]
    Set,
    #[serde(rename = "RUN")]
    Run,
    #[serde(rename = "END")]
    End,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Foc => "FOC",
            Label::Set => "SET",
            Label::Run => "RUN",
            Label::End => "END",
        }
    }
}

/// Values the presentation layer renders on the digital readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Display {
    pub label: Label,
    pub minutes_text: String,
    pub seconds_text: String,
}

/// End-of-session report emitted by the demo driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub committed_minutes: Option<u32>,
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
}

/// Thin glue between the drag controller, countdown engine, and alarm.
pub struct Coordinator {
    drag: Mutex<DragController>,
    engine: Arc<CountdownEngine>,
    alarm: Arc<Alarm>,
    committed_minutes: Mutex<Option<u32>>,
    alarm_task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build the coordinator and spawn the completion-to-alarm wiring task.
    pub fn new(engine: Arc<CountdownEngine>, alarm: Arc<Alarm>) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            drag: Mutex::new(DragController::new()),
            engine: Arc::clone(&engine),
            alarm: Arc::clone(&alarm),
            committed_minutes: Mutex::new(None),
            alarm_task: Mutex::new(None),
        });

        let mut completions = engine.completions();
        let wired_alarm = alarm;
        let task = tokio::spawn(async move {
            loop {
                match completions.recv().await {
                    Ok(run) => {
                        // The engine's one-shot latch already deduplicated;
                        // every event received here gets an alarm.
                        debug!(run, "completion event, sounding alarm");
                        wired_alarm.play();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "completion receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *coordinator
            .alarm_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);
        coordinator
    }

    /// Route one gesture event: primes the alarm on gesture start (the
    /// unlock opportunity), feeds the drag controller, and starts the
    /// countdown on commit.
    pub fn handle_gesture(
        &self,
        surface: &dyn DialSurface,
        event: GestureEvent,
    ) -> Option<DragSignal> {
        if matches!(event, GestureEvent::Start(_)) {
            self.alarm.prime();
        }
        let signal = self.lock_drag().handle(surface, event);
        if let Some(DragSignal::Commit(commit)) = signal {
            *self.lock_committed() = Some(commit.minutes);
            info!(minutes = commit.minutes, "dial committed, starting countdown");
            self.engine.start(u64::from(commit.minutes) * 60);
        }
        signal
    }

    /// Live preview tuple `(is_dragging, minutes)`.
    pub fn preview(&self) -> (bool, Option<u32>) {
        let session = self.lock_drag().session();
        if session.active {
            (true, Some(session.minutes))
        } else {
            (false, None)
        }
    }

    /// Derive the readout. While dragging, preview minutes with seconds
    /// forced to zero; otherwise the engine's remaining time; placeholders
    /// when idle with nothing ever committed.
    pub fn display(&self) -> Display {
        let snapshot = self.engine.snapshot();
        let label = self.label_for(snapshot);
        let session = self.lock_drag().session();
        if session.active {
            return Display {
                label,
                minutes_text: format!("{:02}", session.minutes),
                seconds_text: "00".to_string(),
            };
        }
        if snapshot.phase == Phase::Idle && self.lock_committed().is_none() {
            return Display {
                label,
                minutes_text: PLACEHOLDER.to_string(),
                seconds_text: PLACEHOLDER.to_string(),
            };
        }
        Display {
            label,
            minutes_text: format!("{:02}", snapshot.remaining_seconds / 60),
            seconds_text: format!("{:02}", snapshot.remaining_seconds % 60),
        }
    }

    /// Whether the completion affordance should show.
    pub fn show_completion(&self) -> bool {
        self.engine.snapshot().phase == Phase::Done
    }

    /// Acknowledge completion. Leaves a still-sounding alarm alone; the
    /// host calls `alarm().stop()` itself if dismissing should silence it.
    pub fn dismiss(&self) {
        info!("completion acknowledged");
        self.engine.acknowledge();
    }

    /// Explicit reset: cancel the countdown and clear preview residue.
    pub fn reset(&self) {
        self.engine.reset();
        self.lock_drag().clear();
    }

    pub fn alarm(&self) -> &Arc<Alarm> {
        &self.alarm
    }

    pub fn summary(&self) -> SessionSummary {
        let snapshot = self.engine.snapshot();
        SessionSummary {
            committed_minutes: *self.lock_committed(),
            phase: snapshot.phase,
            remaining_seconds: snapshot.remaining_seconds,
            total_seconds: snapshot.total_seconds,
        }
    }

    fn label_for(&self, snapshot: TimerSnapshot) -> Label {
        match snapshot.phase {
            Phase::Running => Label::Run,
            Phase::Done => Label::End,
            Phase::Idle => {
                if self.lock_committed().is_some() {
                    Label::Set
                } else {
                    Label::Foc
                }
            }
        }
    }

    fn lock_drag(&self) -> MutexGuard<'_, DragController> {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_committed(&self) -> MutexGuard<'_, Option<u32>> {
        self.committed_minutes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.alarm_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::mock::{MockOutput, MockVibrator};
    use crate::audio::{AlarmConfig, AudioOutput, Vibrator};
    use crate::dial::{DialGeometry, Point};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::timeout;

    struct TestDial;

    impl DialSurface for TestDial {
        fn measure(&self) -> Option<DialGeometry> {
            Some(DialGeometry {
                center: Point::new(100.0, 100.0),
            })
        }
    }

    /// Point on the dial rim for a given minute mark.
    fn rim(minutes: u32) -> Point {
        let rad = (minutes as f64 * 6.0).to_radians();
        Point::new(100.0 + rad.sin() * 80.0, 100.0 - rad.cos() * 80.0)
    }

    struct Fixture {
        engine: Arc<CountdownEngine>,
        primary: Arc<MockOutput>,
        fallback: Arc<MockOutput>,
        coordinator: Arc<Coordinator>,
    }

    fn fixture() -> Fixture {
        let engine = CountdownEngine::with_tick_interval(Duration::from_millis(5));
        let primary = Arc::new(MockOutput::working());
        let fallback = Arc::new(MockOutput::working());
        let alarm = Alarm::new(
            Arc::clone(&primary) as Arc<dyn AudioOutput>,
            Arc::clone(&fallback) as Arc<dyn AudioOutput>,
            Arc::new(MockVibrator::default()) as Arc<dyn Vibrator>,
            AlarmConfig {
                clip_seconds: 0.05,
                clip_gap: Duration::from_millis(10),
                ..AlarmConfig::default()
            },
        );
        let coordinator = Coordinator::new(Arc::clone(&engine), alarm);
        Fixture {
            engine,
            primary,
            fallback,
            coordinator,
        }
    }

    #[tokio::test]
    async fn test_idle_placeholder_display() {
        let f = fixture();
        let display = f.coordinator.display();
        assert_eq!(display.label, Label::Foc);
        assert_eq!(display.minutes_text, PLACEHOLDER);
        assert_eq!(display.seconds_text, PLACEHOLDER);
        assert_eq!(f.coordinator.preview(), (false, None));
        assert!(!f.coordinator.show_completion());
    }

    #[tokio::test]
    async fn test_gesture_start_primes_outputs() {
        let f = fixture();
        let dial = TestDial;
        assert!(!f.primary.is_unlocked());
        assert!(!f.fallback.is_unlocked());

        // The press is the unlock opportunity; moves alone never prime.
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Move(rim(10)));
        assert!(!f.primary.is_unlocked());

        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(10)));
        assert!(f.primary.is_unlocked());
        assert!(f.fallback.is_unlocked());
    }

    #[tokio::test]
    async fn test_drag_preview_drives_display() {
        let f = fixture();
        let dial = TestDial;
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Move(rim(15)));

        assert_eq!(f.coordinator.preview(), (true, Some(15)));
        let display = f.coordinator.display();
        assert_eq!(display.minutes_text, "15");
        assert_eq!(display.seconds_text, "00");
        // Nothing committed yet
        assert_eq!(display.label, Label::Foc);
    }

    #[tokio::test]
    async fn test_commit_starts_countdown() {
        let f = fixture();
        let dial = TestDial;
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Move(rim(15)));
        let signal = f
            .coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(15)));
        assert!(matches!(signal, Some(DragSignal::Commit(c)) if c.minutes == 15));

        let snapshot = f.engine.snapshot();
        assert_eq!(snapshot.phase, Phase::Running);
        assert_eq!(snapshot.total_seconds, 15 * 60);

        let display = f.coordinator.display();
        assert_eq!(display.label, Label::Run);
        assert_eq!(display.minutes_text, "15");
        assert_eq!(display.seconds_text, "00");
        assert_eq!(f.coordinator.preview(), (false, None));
    }

    #[tokio::test]
    async fn test_completion_sounds_alarm_once() {
        let f = fixture();
        let dial = TestDial;
        let mut completions = f.engine.completions();

        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Move(rim(1)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(1)));

        timeout(Duration::from_secs(5), completions.recv())
            .await
            .expect("countdown never completed")
            .expect("completion channel closed");
        // Let the wiring task and alarm task run
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(f.primary.play_count(), 1);
        assert!(f.coordinator.show_completion());
        assert_eq!(f.coordinator.display().label, Label::End);
        assert_eq!(f.coordinator.display().minutes_text, "00");
    }

    #[tokio::test]
    async fn test_dismiss_acknowledges_without_stopping_alarm() {
        let f = fixture();
        let dial = TestDial;
        let mut completions = f.engine.completions();
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(1)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(1)));
        timeout(Duration::from_secs(5), completions.recv())
            .await
            .unwrap()
            .unwrap();

        f.coordinator.dismiss();
        assert!(!f.coordinator.show_completion());
        // Previously committed duration keeps the label at SET
        assert_eq!(f.coordinator.display().label, Label::Set);
        // Dismiss never touches the alarm outputs
        assert_eq!(f.primary.suspends.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_preview_residue() {
        let f = fixture();
        let dial = TestDial;
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(30)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Move(rim(30)));
        assert_eq!(f.coordinator.preview(), (true, Some(30)));

        f.coordinator.reset();
        assert_eq!(f.coordinator.preview(), (false, None));
        assert_eq!(f.engine.snapshot().phase, Phase::Idle);
        assert_eq!(f.coordinator.display().label, Label::Foc);
    }

    #[tokio::test]
    async fn test_retarget_by_redragging_while_running() {
        let f = fixture();
        let dial = TestDial;
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(30)));
        assert_eq!(f.engine.snapshot().total_seconds, 30 * 60);

        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(5)));
        let snapshot = f.engine.snapshot();
        assert_eq!(snapshot.total_seconds, 5 * 60);
        assert_eq!(snapshot.phase, Phase::Running);
    }

    #[tokio::test]
    async fn test_summary_serializes() {
        let f = fixture();
        let dial = TestDial;
        f.coordinator
            .handle_gesture(&dial, GestureEvent::Start(rim(60)));
        f.coordinator
            .handle_gesture(&dial, GestureEvent::End(rim(10)));
        let summary = f.coordinator.summary();
        assert_eq!(summary.committed_minutes, Some(10));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["phase"], "running");
        assert_eq!(json["total_seconds"], 600);
    }
}
