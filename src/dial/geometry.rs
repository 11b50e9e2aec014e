//! Pointer-to-angle-to-duration conversion for the dial surface

/// A point in surface coordinates (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Dial geometry captured at gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialGeometry {
    pub center: Point,
}

/// Shortest committable duration in minutes.
pub const MIN_MINUTES: u32 = 1;
/// Full circle of the 60-minute clock face.
pub const MAX_MINUTES: u32 = 60;

/// Compute the clockwise angle in degrees from 12 o'clock, in `[0, 360)`.
///
/// A degenerate offset (zero-length, or non-finite coordinates from an
/// unmeasurable surface) yields 0.0 rather than NaN.
pub fn angle_from_center(center: Point, point: Point) -> f64 {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
        return 0.0;
    }
    // atan2 measures from the positive x axis; rotate so 12 o'clock is zero
    // and wrap into non-negative range.
    (dy.atan2(dx).to_degrees() + 90.0).rem_euclid(360.0)
}

/// Convert an angle to a duration in minutes, clamped to `[1, 60]`.
///
/// An angle of exactly 0 is the full-circle case and maps to 60 minutes:
/// a raw zero is only reachable as the converter's rest value, so a
/// completed gesture releasing at 12 o'clock means a full rotation.
pub fn angle_to_minutes(angle: f64) -> u32 {
    if !angle.is_finite() {
        return MAX_MINUTES;
    }
    let normalized = angle.rem_euclid(360.0);
    if normalized == 0.0 {
        return MAX_MINUTES;
    }
    let minutes = (normalized / 360.0 * 60.0).round() as u32;
    minutes.clamp(MIN_MINUTES, MAX_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Point = Point { x: 100.0, y: 100.0 };

    #[test]
    fn test_cardinal_angles() {
        // 12, 3, 6, 9 o'clock in screen coordinates (y grows downward)
        assert_eq!(angle_from_center(CENTER, Point::new(100.0, 50.0)), 0.0);
        assert_eq!(angle_from_center(CENTER, Point::new(150.0, 100.0)), 90.0);
        assert_eq!(angle_from_center(CENTER, Point::new(100.0, 150.0)), 180.0);
        assert_eq!(angle_from_center(CENTER, Point::new(50.0, 100.0)), 270.0);
    }

    #[test]
    fn test_angle_range() {
        for i in 0..360 {
            let rad = (i as f64).to_radians();
            let p = Point::new(100.0 + rad.sin() * 40.0, 100.0 - rad.cos() * 40.0);
            let angle = angle_from_center(CENTER, p);
            assert!((0.0..360.0).contains(&angle), "angle {} out of range", angle);
        }
    }

    #[test]
    fn test_degenerate_point_falls_back_to_zero() {
        assert_eq!(angle_from_center(CENTER, CENTER), 0.0);
        assert_eq!(angle_from_center(CENTER, Point::new(f64::NAN, 100.0)), 0.0);
        assert_eq!(
            angle_from_center(Point::new(f64::INFINITY, 0.0), Point::new(1.0, 1.0)),
            0.0
        );
    }

    #[test]
    fn test_full_circle_rule() {
        assert_eq!(angle_to_minutes(0.0), 60);
        assert_eq!(angle_to_minutes(360.0), 60);
    }

    #[test]
    fn test_quarter_turns() {
        assert_eq!(angle_to_minutes(90.0), 15);
        assert_eq!(angle_to_minutes(180.0), 30);
        assert_eq!(angle_to_minutes(270.0), 45);
    }

    #[test]
    fn test_minutes_clamped_to_range() {
        // Tiny angles round to zero minutes but must clamp up to 1
        assert_eq!(angle_to_minutes(0.5), 1);
        assert_eq!(angle_to_minutes(2.9), 1);
        assert_eq!(angle_to_minutes(359.9), 60);
        assert_eq!(angle_to_minutes(f64::NAN), 60);
    }

    #[test]
    fn test_monotonic_over_open_circle() {
        let mut last = 0;
        let mut angle = 0.1;
        while angle < 360.0 {
            let minutes = angle_to_minutes(angle);
            assert!((1..=60).contains(&minutes));
            assert!(minutes >= last, "not monotonic at angle {}", angle);
            last = minutes;
            angle += 0.1;
        }
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 3 degrees is exactly 0.5 minutes
        assert_eq!(angle_to_minutes(3.0), 1);
        // 9 degrees is exactly 1.5 minutes
        assert_eq!(angle_to_minutes(9.0), 2);
    }
}
