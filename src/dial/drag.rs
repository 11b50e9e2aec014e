//! Drag gesture state machine for the dial surface

use tracing::debug;

use super::geometry::{angle_from_center, angle_to_minutes, DialGeometry, Point, MIN_MINUTES};

/// Source of the dial's on-screen geometry.
///
/// Measured once per gesture (at gesture start), so layout shifts between
/// gestures are picked up but the center never moves mid-drag.
pub trait DialSurface {
    /// Current dial geometry, or `None` if the surface is unmeasurable.
    fn measure(&self) -> Option<DialGeometry>;
}

/// Unified gesture events. Mouse and touch differ only in how the host
/// extracts the point (event position vs. first/changed touch), which is
/// the presentation layer's concern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Start(Point),
    Move(Point),
    End(Point),
}

/// Live preview emitted on every gesture sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPreview {
    pub angle: f64,
    pub minutes: u32,
}

/// The single authoritative duration emitted when a gesture completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCommit {
    pub minutes: u32,
}

/// Output of feeding one gesture event through the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSignal {
    Preview(DragPreview),
    Commit(DragCommit),
}

/// Ephemeral per-gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragSession {
    pub active: bool,
    pub angle: f64,
    pub minutes: u32,
}

/// Two-state (idle/dragging) drag controller.
///
/// Guarantees: every start/move sample produces a preview, a completed
/// gesture produces exactly one commit, and move/end events without a
/// preceding start produce nothing.
#[derive(Debug, Default)]
pub struct DragController {
    session: DragSession,
    geometry: Option<DialGeometry>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.session.active
    }

    /// Current session state (zeroed when idle).
    pub fn session(&self) -> DragSession {
        self.session
    }

    /// Feed one gesture event through the state machine.
    pub fn handle(&mut self, surface: &dyn DialSurface, event: GestureEvent) -> Option<DragSignal> {
        match event {
            GestureEvent::Start(point) => {
                self.geometry = surface.measure();
                if self.geometry.is_none() {
                    debug!("dial surface unmeasurable, using fallback angle");
                }
                self.session.active = true;
                Some(DragSignal::Preview(self.sample(point)))
            }
            GestureEvent::Move(point) => {
                if !self.session.active {
                    return None;
                }
                Some(DragSignal::Preview(self.sample(point)))
            }
            GestureEvent::End(point) => {
                if !self.session.active {
                    return None;
                }
                let final_minutes = self.sample(point).minutes;
                self.clear();
                // Structurally unreachable (the converter clamps to >= 1),
                // but a sub-minimum duration is never committed.
                if final_minutes < MIN_MINUTES {
                    return None;
                }
                debug!(minutes = final_minutes, "drag committed");
                Some(DragSignal::Commit(DragCommit {
                    minutes: final_minutes,
                }))
            }
        }
    }

    /// Reset the session to its inactive/zero representation so stale
    /// preview values never leak into a later render.
    pub fn clear(&mut self) {
        self.session = DragSession::default();
        self.geometry = None;
    }

    fn sample(&mut self, point: Point) -> DragPreview {
        let angle = match self.geometry {
            Some(geometry) => angle_from_center(geometry.center, point),
            None => 0.0,
        };
        let minutes = angle_to_minutes(angle);
        self.session.angle = angle;
        self.session.minutes = minutes;
        DragPreview { angle, minutes }
    }
}
