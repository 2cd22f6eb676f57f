use serde::{Deserialize, Serialize};

/// A 2d point, either in pixel space or in world (court) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    /// The x coordinate.
    pub x: f64,
    /// The y coordinate.
    pub y: f64,
}

impl Point2d {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2d) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(&self, other: &Point2d) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }
}

impl From<[f64; 2]> for Point2d {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Point2d> for [f64; 2] {
    fn from(p: Point2d) -> Self {
        [p.x, p.y]
    }
}

/// A matched pair of points: a pixel observation and its world coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// The point in pixel space.
    pub source: Point2d,
    /// The corresponding point in world space.
    pub target: Point2d,
}

impl Correspondence {
    /// Create a correspondence from anything convertible into points.
    pub fn new(source: impl Into<Point2d>, target: impl Into<Point2d>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.source.is_finite() && self.target.is_finite()
    }
}
