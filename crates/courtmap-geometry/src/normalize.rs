use crate::Point2d;

/// Isotropic similarity that moves a point set's centroid to the origin and
/// scales it so the mean distance from the origin is `sqrt(2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    /// Uniform scale factor.
    pub scale: f64,
    /// Centroid of the original points.
    pub centroid: Point2d,
}

impl Similarity {
    /// Fit the conditioning transform for `points`.
    ///
    /// Returns `None` when the set is empty or all points coincide, since no
    /// finite scale can spread them out.
    pub fn fit(points: &[Point2d]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (mut mx, mut my) = (0.0, 0.0);
        for p in points {
            mx += p.x;
            my += p.y;
        }
        mx /= n;
        my /= n;

        let centroid = Point2d::new(mx, my);
        let mean_dist = points.iter().map(|p| p.distance(&centroid)).sum::<f64>() / n;

        // relative to the centroid magnitude so far-off coincident points are caught too
        let floor = 1e-12 * (1.0 + mx.abs().max(my.abs()));
        if !mean_dist.is_finite() || mean_dist <= floor {
            return None;
        }

        Some(Self {
            scale: std::f64::consts::SQRT_2 / mean_dist,
            centroid,
        })
    }

    /// Apply the transform to a single point.
    pub fn apply(&self, p: &Point2d) -> Point2d {
        Point2d::new(
            (p.x - self.centroid.x) * self.scale,
            (p.y - self.centroid.y) * self.scale,
        )
    }

    /// The transform as a homogeneous matrix `T = [[s, 0, -s*mx], [0, s, -s*my], [0, 0, 1]]`.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        let s = self.scale;
        [
            [s, 0.0, -s * self.centroid.x],
            [0.0, s, -s * self.centroid.y],
            [0.0, 0.0, 1.0],
        ]
    }

    /// The inverse transform `T^-1 = [[1/s, 0, mx], [0, 1/s, my], [0, 0, 1]]`.
    pub fn inverse_matrix(&self) -> [[f64; 3]; 3] {
        let inv_s = 1.0 / self.scale;
        [
            [inv_s, 0.0, self.centroid.x],
            [0.0, inv_s, self.centroid.y],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Normalize a point set, returning the conditioned points and the transform used.
pub fn normalize_points_2d(points: &[Point2d]) -> Option<(Vec<Point2d>, Similarity)> {
    let t = Similarity::fit(points)?;
    Some((points.iter().map(|p| t.apply(p)).collect(), t))
}
