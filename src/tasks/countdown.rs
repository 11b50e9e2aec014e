//! Countdown tick driver
//!
//! Wraps the pure [`CountdownCore`] behind an async schedule: a 1-second
//! interval task decrements the core, publishes snapshots on a watch
//! channel, and broadcasts a completion event exactly once per run.
//! Cancellation uses a generation counter: `start` and `reset` bump it and
//! abort the old task, and the tick loop re-checks the generation before
//! every mutation, so no stale schedule can ever act.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::{CountdownCore, Phase, TimerSnapshot};

/// Asynchronous countdown engine. Cheap to share via `Arc`.
#[derive(Debug)]
pub struct CountdownEngine {
    core: Mutex<CountdownCore>,
    generation: AtomicU64,
    tick_interval: Duration,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    completion_tx: broadcast::Sender<u64>,
    // Keep one receiver alive so completion sends never observe a closed channel
    _completion_rx: broadcast::Receiver<u64>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl CountdownEngine {
    /// Create an engine ticking at the standard wall-clock second.
    pub fn new() -> Arc<Self> {
        Self::with_tick_interval(Duration::from_secs(1))
    }

    /// Create an engine with a custom tick interval (tests use a short one).
    pub fn with_tick_interval(tick_interval: Duration) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(TimerSnapshot::default());
        let (completion_tx, completion_rx) = broadcast::channel(8);
        Arc::new(Self {
            core: Mutex::new(CountdownCore::new()),
            generation: AtomicU64::new(0),
            tick_interval,
            snapshot_tx,
            completion_tx,
            _completion_rx: completion_rx,
            tick_task: Mutex::new(None),
        })
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to completion events. The payload is the run generation.
    pub fn completions(&self) -> broadcast::Receiver<u64> {
        self.completion_tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock_core().snapshot()
    }

    /// Start (or retarget) a run. The previous schedule is invalidated and
    /// aborted before the new one is created, and the fresh run begins with
    /// a full `total_seconds` on the clock.
    pub fn start(self: &Arc<Self>, total_seconds: u64) {
        let generation = self.bump_generation();
        let completed = {
            let mut core = self.lock_core();
            let completed = core.start(total_seconds);
            self.snapshot_tx.send_replace(core.snapshot());
            completed
        };
        info!(total_seconds, "countdown started");
        if completed {
            let _ = self.completion_tx.send(generation);
            return;
        }

        let weak = Arc::downgrade(self);
        let tick_interval = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick_interval);
            // Wall-clock-driven, second-granular: skip missed ticks rather
            // than bursting to catch up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume it so
            // the countdown decrements once per elapsed period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(engine) = weak.upgrade() else {
                    break;
                };
                let snapshot = {
                    let mut core = engine.lock_core();
                    // Re-checked under the lock: a schedule cancelled while
                    // we were waiting must not touch the core.
                    if engine.generation.load(Ordering::SeqCst) != generation {
                        break;
                    }
                    let completed = core.tick();
                    let snapshot = core.snapshot();
                    // Published while the lock is still held; `start` also
                    // publishes under the lock, so a concurrent retarget can
                    // never have its fresh snapshot overwritten by this one.
                    engine.snapshot_tx.send_replace(snapshot);
                    if completed {
                        info!("countdown complete");
                        let _ = engine.completion_tx.send(generation);
                    }
                    snapshot
                };
                debug!(remaining = snapshot.remaining_seconds, "countdown tick");
                if snapshot.phase != Phase::Running {
                    break;
                }
            }
        });
        self.store_tick_task(Some(handle));
    }

    /// Cancel any run and return to idle.
    pub fn reset(&self) {
        self.bump_generation();
        let snapshot = {
            let mut core = self.lock_core();
            core.reset();
            core.snapshot()
        };
        self.snapshot_tx.send_replace(snapshot);
        info!("countdown reset");
    }

    /// Acknowledge a finished run (clears `Done` without a full reset).
    pub fn acknowledge(&self) {
        let snapshot = {
            let mut core = self.lock_core();
            core.acknowledge();
            core.snapshot()
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Invalidate the current schedule and abort its task. The generation
    /// is bumped first, so even a tick already past its await point will
    /// observe the mismatch and stand down.
    fn bump_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store_tick_task(None);
        generation
    }

    fn store_tick_task(&self, handle: Option<JoinHandle<()>>) {
        let mut slot = self
            .tick_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = handle;
    }

    fn lock_core(&self) -> MutexGuard<'_, CountdownCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        // No orphaned ticking after the host tears the engine down.
        if let Ok(mut slot) = self.tick_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_runs_to_completion_once() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut completions = engine.completions();

        engine.start(3);
        assert_eq!(engine.snapshot().phase, Phase::Running);
        assert_eq!(engine.snapshot().remaining_seconds, 3);

        timeout(WAIT, completions.recv())
            .await
            .expect("completion not signaled")
            .expect("completion channel closed");

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, Phase::Done);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert_eq!(snapshot.total_seconds, 3);

        // Exactly one completion per start
        tokio::time::sleep(TICK * 5).await;
        assert!(matches!(
            completions.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_retarget_discards_previous_schedule() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut completions = engine.completions();

        engine.start(50);
        engine.start(2);
        assert_eq!(engine.snapshot().total_seconds, 2);
        assert_eq!(engine.snapshot().remaining_seconds, 2);

        let generation = timeout(WAIT, completions.recv())
            .await
            .expect("completion not signaled")
            .expect("completion channel closed");
        assert_eq!(generation, 2);
        assert_eq!(engine.snapshot().phase, Phase::Done);

        // No residual completion from the first run
        assert!(matches!(
            completions.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_reset_cancels_schedule() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut completions = engine.completions();

        engine.start(2);
        engine.reset();
        assert_eq!(engine.snapshot().phase, Phase::Idle);
        assert_eq!(engine.snapshot().remaining_seconds, 0);

        // Give any stale schedule time to misbehave
        tokio::time::sleep(TICK * 10).await;
        assert_eq!(engine.snapshot().phase, Phase::Idle);
        assert!(matches!(
            completions.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retarget_never_publishes_stale_snapshot() {
        // Snapshots and the generation check share the core lock, so a
        // superseded schedule can never overwrite the fresh run's state.
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut snapshots = engine.subscribe();

        engine.start(50);
        engine.start(2);
        loop {
            timeout(WAIT, snapshots.changed()).await.unwrap().unwrap();
            let snapshot = *snapshots.borrow_and_update();
            assert_eq!(
                snapshot.total_seconds, 2,
                "snapshot from the superseded run observed"
            );
            if snapshot.phase == Phase::Done {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_drop_tears_down_tick_task() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut snapshots = engine.subscribe();
        let mut completions = engine.completions();

        engine.start(2);
        assert_eq!(snapshots.borrow_and_update().phase, Phase::Running);
        drop(engine);

        // No tick lands after teardown; the channels just close.
        tokio::time::sleep(TICK * 10).await;
        assert!(snapshots.has_changed().is_err());
        assert!(matches!(
            completions.try_recv(),
            Err(broadcast::error::TryRecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_zero_length_run_completes_immediately() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut completions = engine.completions();
        engine.start(0);
        assert_eq!(engine.snapshot().phase, Phase::Done);
        timeout(WAIT, completions.recv())
            .await
            .expect("completion not signaled")
            .expect("completion channel closed");
    }

    #[tokio::test]
    async fn test_snapshots_published_on_watch() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut snapshots = engine.subscribe();

        engine.start(2);
        timeout(WAIT, snapshots.changed()).await.unwrap().unwrap();
        assert_eq!(snapshots.borrow_and_update().total_seconds, 2);

        // Follow ticks down to done
        loop {
            timeout(WAIT, snapshots.changed()).await.unwrap().unwrap();
            let snapshot = *snapshots.borrow_and_update();
            if snapshot.phase == Phase::Done {
                assert_eq!(snapshot.remaining_seconds, 0);
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_restart_after_done() {
        let engine = CountdownEngine::with_tick_interval(TICK);
        let mut completions = engine.completions();

        engine.start(1);
        timeout(WAIT, completions.recv()).await.unwrap().unwrap();

        engine.start(1);
        timeout(WAIT, completions.recv())
            .await
            .expect("second run did not complete")
            .unwrap();
    }
}
