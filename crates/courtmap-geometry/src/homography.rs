use serde::{Deserialize, Serialize};

use crate::{linalg, Point2d};

/// Relative tolerance below which the homogeneous component of a mapped point
/// is treated as zero.
///
/// The bound scales with `||H||_F * (1 + |x| + |y|)`, so it does not depend on
/// the arbitrary scale of the matrix.
pub const W_EPSILON: f64 = 1e-12;

/// Default tolerance on `|det(H / ||H||_F)|` below which a matrix is rejected as singular.
pub const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Errors returned while estimating or constructing a homography.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum HomographyError {
    /// Not enough correspondences to constrain the 8 degrees of freedom.
    #[error("homography estimation requires at least {required} correspondences, got {actual}")]
    InsufficientPoints {
        /// Minimum number of correspondences.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// A correspondence contains a NaN or infinite coordinate.
    #[error("correspondence {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Position of the offending correspondence in the input.
        index: usize,
    },

    /// The correspondences are collinear, duplicated or otherwise rank deficient.
    #[error("degenerate correspondence configuration (singular value ratio {ratio:e}, tolerance {tolerance:e})")]
    DegenerateConfiguration {
        /// Ratio between the 8th and the largest singular value of the DLT system.
        ratio: f64,
        /// Tolerance the ratio was compared against.
        tolerance: f64,
    },

    /// The resulting matrix is not invertible or not finite.
    #[error("homography is singular (normalized determinant {det:e})")]
    SingularResult {
        /// Determinant of the Frobenius-normalized matrix.
        det: f64,
    },

    /// RANSAC could not find a model supported by enough inliers.
    #[error("RANSAC found {actual} inliers, at least {required} are required")]
    InsufficientInliers {
        /// Minimum number of inliers.
        required: usize,
        /// Size of the best consensus set.
        actual: usize,
    },
}

/// Per-point failure while applying a homography.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TransformError {
    /// The point maps onto the line at infinity of the target plane.
    #[error("point maps to infinity (w = {w:e})")]
    PointAtInfinity {
        /// The homogeneous component after multiplication by `H`.
        w: f64,
    },
}

/// A planar projective transform from pixel space to world space.
///
/// The matrix is row-major and defined up to scale. Every value of this type
/// is finite and non-singular; it can only be obtained from an estimator or
/// through [`Homography::try_from_array`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Homography {
    mat: [[f64; 3]; 3],
}

impl Homography {
    /// The identity transform.
    pub const IDENTITY: Homography = Homography {
        mat: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Validate a row-major matrix and wrap it.
    ///
    /// Fails with [`HomographyError::SingularResult`] if the matrix has non-finite
    /// entries or its normalized determinant is below [`SINGULAR_TOLERANCE`].
    pub fn try_from_array(mat: [[f64; 3]; 3]) -> Result<Self, HomographyError> {
        Self::validated(mat, SINGULAR_TOLERANCE)
    }

    pub(crate) fn validated(mat: [[f64; 3]; 3], tolerance: f64) -> Result<Self, HomographyError> {
        let det = normalized_det(&mat);
        if !linalg::is_finite_mat33(&mat) || !det.is_finite() || det.abs() < tolerance {
            return Err(HomographyError::SingularResult { det });
        }
        Ok(Self { mat })
    }

    /// The row-major matrix.
    pub fn as_array(&self) -> &[[f64; 3]; 3] {
        &self.mat
    }

    /// Same projective map with every entry multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, HomographyError> {
        Self::try_from_array(linalg::scale_mat33(&self.mat, factor))
    }

    /// The inverse transform, mapping world space back to pixel space.
    ///
    /// The result is scaled so that its `[2][2]` entry is one when possible.
    pub fn inverse(&self) -> Result<Self, HomographyError> {
        let adj = linalg::adjugate_mat33(&self.mat);
        let det = linalg::det_mat33(&self.mat);
        let mut inv = linalg::scale_mat33(&adj, 1.0 / det);
        if inv[2][2].abs() > W_EPSILON * linalg::frobenius_norm_mat33(&inv) {
            inv = linalg::scale_mat33(&inv, 1.0 / inv[2][2]);
        }
        Self::try_from_array(inv)
    }

    /// Map a point through the homography, with perspective division.
    pub fn transform_point(&self, p: Point2d) -> Result<Point2d, TransformError> {
        let [x, y, w] = linalg::mat33_mul_vec3(&self.mat, &[p.x, p.y, 1.0]);
        let bound =
            W_EPSILON * linalg::frobenius_norm_mat33(&self.mat) * (1.0 + p.x.abs() + p.y.abs());
        if !w.is_finite() || w.abs() < bound {
            return Err(TransformError::PointAtInfinity { w });
        }
        let out = Point2d::new(x / w, y / w);
        if !out.is_finite() {
            return Err(TransformError::PointAtInfinity { w });
        }
        Ok(out)
    }
}

impl TryFrom<[[f64; 3]; 3]> for Homography {
    type Error = HomographyError;

    fn try_from(mat: [[f64; 3]; 3]) -> Result<Self, Self::Error> {
        Self::try_from_array(mat)
    }
}

impl From<Homography> for [[f64; 3]; 3] {
    fn from(h: Homography) -> Self {
        h.mat
    }
}

impl std::fmt::Display for Homography {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.mat {
            writeln!(f, "[{:>14.8e} {:>14.8e} {:>14.8e}]", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

/// Determinant of the matrix scaled to unit Frobenius norm.
pub(crate) fn normalized_det(mat: &[[f64; 3]; 3]) -> f64 {
    let norm = linalg::frobenius_norm_mat33(mat);
    if norm == 0.0 || !norm.is_finite() {
        return 0.0;
    }
    linalg::det_mat33(&linalg::scale_mat33(mat, 1.0 / norm))
}
