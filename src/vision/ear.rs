use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Eye aspect ratio over six landmarks ordered p1..p6 around the eye, p1 and
/// p4 being the corners.
///
/// `(|p2 - p6| + |p3 - p5|) / (2 |p1 - p4|)`, or 0 when the corners coincide.
pub fn eye_aspect_ratio(points: &[Point; 6]) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = *points;
    let horizontal = p1.distance(p4);
    if horizontal <= f64::EPSILON {
        return 0.0;
    }
    (p2.distance(p6) + p3.distance(p5)) / (2.0 * horizontal)
}
