//! Dial interaction: pointer geometry and the drag gesture state machine

pub mod drag;
pub mod geometry;

pub use drag::{DialSurface, DragCommit, DragController, DragPreview, DragSignal, GestureEvent};
pub use geometry::{angle_from_center, angle_to_minutes, DialGeometry, Point};
