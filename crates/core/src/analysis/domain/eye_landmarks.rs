//! Four-point eye landmarks and the eye-aspect-ratio derived from them.
//!
//! The ratio is the vertical lid opening divided by the corner-to-corner
//! width. Both are Euclidean distances in pixel space, so the ratio does not
//! depend on how large the face appears in the frame.

/// Pixel coordinates `(x, y)`.
pub type Point = (f64, f64);

#[derive(Clone, Debug, PartialEq)]
pub struct EyeLandmarks {
    outer: Point,
    inner: Point,
    top: Point,
    bottom: Point,
}

impl EyeLandmarks {
    pub fn new(outer: Point, inner: Point, top: Point, bottom: Point) -> Self {
        Self {
            outer,
            inner,
            top,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        distance(self.outer, self.inner)
    }

    pub fn opening(&self) -> f64 {
        distance(self.top, self.bottom)
    }

    /// `opening / width`, or `None` when the corners coincide.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let width = self.width();
        if width <= 0.0 || !width.is_finite() {
            return None;
        }
        Some(self.opening() / width)
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn open_eye() -> EyeLandmarks {
        EyeLandmarks::new(
            (100.0, 200.0), // outer
            (130.0, 200.0), // inner
            (115.0, 195.0), // top
            (115.0, 205.0), // bottom
        )
    }

    fn scaled(eye: &EyeLandmarks, k: f64) -> EyeLandmarks {
        let s = |p: Point| (p.0 * k, p.1 * k);
        EyeLandmarks::new(s(eye.outer), s(eye.inner), s(eye.top), s(eye.bottom))
    }

    // ── distance ────────────────────────────────────────────────────

    #[test]
    fn test_distance_pythagorean() {
        assert_relative_eq!(distance((0.0, 0.0), (3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = (12.5, -3.0);
        let b = (-7.0, 8.25);
        assert_relative_eq!(distance(a, b), distance(b, a));
    }

    // ── aspect_ratio ────────────────────────────────────────────────

    #[test]
    fn test_aspect_ratio_open_eye() {
        // opening 10, width 30
        assert_relative_eq!(open_eye().aspect_ratio().unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closed_eye_ratio_near_zero() {
        let closed = EyeLandmarks::new(
            (100.0, 200.0),
            (130.0, 200.0),
            (115.0, 200.2),
            (115.0, 200.0),
        );
        let ratio = closed.aspect_ratio().unwrap();
        assert!(ratio >= 0.0);
        assert!(ratio < 0.01);
    }

    #[test]
    fn test_open_eye_ratio_exceeds_closed() {
        let closed = EyeLandmarks::new(
            (100.0, 200.0),
            (130.0, 200.0),
            (115.0, 199.0),
            (115.0, 200.0),
        );
        assert!(open_eye().aspect_ratio().unwrap() > closed.aspect_ratio().unwrap());
    }

    #[rstest]
    #[case(0.25)]
    #[case(2.0)]
    #[case(7.5)]
    #[case(1000.0)]
    fn test_aspect_ratio_scale_invariant(#[case] k: f64) {
        let base = open_eye().aspect_ratio().unwrap();
        let after = scaled(&open_eye(), k).aspect_ratio().unwrap();
        assert_relative_eq!(base, after, epsilon = 1e-9);
    }

    #[test]
    fn test_aspect_ratio_invariant_under_rotation() {
        // Same eye rotated 90 degrees around the origin: (x, y) -> (-y, x)
        let r = |p: Point| (-p.1, p.0);
        let eye = open_eye();
        let rotated = EyeLandmarks::new(r(eye.outer), r(eye.inner), r(eye.top), r(eye.bottom));
        assert_relative_eq!(
            eye.aspect_ratio().unwrap(),
            rotated.aspect_ratio().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_coincident_corners_has_no_ratio() {
        let eye = EyeLandmarks::new(
            (100.0, 200.0),
            (100.0, 200.0),
            (100.0, 195.0),
            (100.0, 205.0),
        );
        assert!(eye.aspect_ratio().is_none());
    }

    // ── round_to ────────────────────────────────────────────────────

    #[rstest]
    #[case(0.123_456, 0.123)]
    #[case(0.2876, 0.288)]
    #[case(1.0, 1.0)]
    #[case(0.0004, 0.0)]
    fn test_round_to_three_decimals(#[case] input: f64, #[case] expected: f64) {
        assert_relative_eq!(round_to(input, 3), expected);
    }
}
