use serde::{Deserialize, Serialize};

use crate::homography::{normalized_det, SINGULAR_TOLERANCE};
use crate::normalize::Similarity;
use crate::{linalg, Correspondence, Homography, HomographyError, Point2d};

/// Minimum number of correspondences for a homography (8 degrees of freedom, 2 per point).
pub const MIN_CORRESPONDENCES: usize = 4;

/// Numeric tolerances for the DLT estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Ratio `sigma_8 / sigma_max` of the coefficient matrix below which the
    /// correspondences are reported as degenerate.
    pub rank_tolerance: f64,
    /// Minimum `|det(H / ||H||_F)|` of an accepted homography.
    pub singular_tolerance: f64,
    /// Minimum `|H[2][2]|` (relative to `||H||_F`) for rescaling to `H[2][2] = 1`.
    pub scale_tolerance: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-8,
            singular_tolerance: SINGULAR_TOLERANCE,
            scale_tolerance: 1e-12,
        }
    }
}

/// A homography together with how well it explains its correspondences.
#[derive(Clone, Debug, PartialEq)]
pub struct HomographyFit {
    /// The estimated homography.
    pub homography: Homography,
    /// Reprojection error of each correspondence in target units, in input order.
    ///
    /// A source point that maps to infinity has an infinite residual.
    pub residuals: Vec<f64>,
    /// Root-mean-square of the residuals.
    pub rms_error: f64,
    /// Largest residual.
    pub max_error: f64,
    /// Whether the matrix was rescaled so that `H[2][2] = 1`.
    ///
    /// When `false` the origin of the source plane maps close to the line at
    /// infinity and ideal points may show up while transforming.
    pub unit_scale: bool,
}

impl HomographyFit {
    /// Index of the correspondence with the largest residual.
    pub fn worst_correspondence(&self) -> Option<usize> {
        self.residuals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

/// Normalized Direct Linear Transform estimator.
#[derive(Clone, Copy, Debug, Default)]
pub struct HomographyEstimator {
    params: EstimatorParams,
}

impl HomographyEstimator {
    /// Create an estimator with the given tolerances.
    pub fn new(params: EstimatorParams) -> Self {
        Self { params }
    }

    /// The tolerances in use.
    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Estimate the homography mapping every source onto its target and report
    /// the reprojection residuals.
    ///
    /// With more than four correspondences the result is the least-squares
    /// solution; every correspondence is trusted.
    pub fn estimate(
        &self,
        correspondences: &[Correspondence],
    ) -> Result<HomographyFit, HomographyError> {
        let (homography, unit_scale) = self.solve(correspondences)?;
        let residuals = reprojection_errors(&homography, correspondences);

        let n = residuals.len() as f64;
        let rms_error = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();
        let max_error = residuals.iter().copied().fold(0.0, f64::max);

        log::debug!(
            "estimated homography from {} correspondences: rms {:.6}, max {:.6}",
            correspondences.len(),
            rms_error,
            max_error
        );

        Ok(HomographyFit {
            homography,
            residuals,
            rms_error,
            max_error,
            unit_scale,
        })
    }

    /// Solve the DLT system, returning the homography and whether it has unit `[2][2]`.
    pub(crate) fn solve(
        &self,
        correspondences: &[Correspondence],
    ) -> Result<(Homography, bool), HomographyError> {
        let n = correspondences.len();
        if n < MIN_CORRESPONDENCES {
            return Err(HomographyError::InsufficientPoints {
                required: MIN_CORRESPONDENCES,
                actual: n,
            });
        }
        if let Some(index) = correspondences.iter().position(|c| !c.is_finite()) {
            return Err(HomographyError::NonFiniteCoordinate { index });
        }

        let degenerate = HomographyError::DegenerateConfiguration {
            ratio: 0.0,
            tolerance: self.params.rank_tolerance,
        };
        let sources = correspondences.iter().map(|c| c.source).collect::<Vec<_>>();
        let targets = correspondences.iter().map(|c| c.target).collect::<Vec<_>>();
        let t_src = Similarity::fit(&sources).ok_or_else(|| degenerate.clone())?;
        let t_dst = Similarity::fit(&targets).ok_or(degenerate)?;

        // construct the 2N x 9 system from target x (H * source) = 0
        let mut mat_a = faer::Mat::<f64>::zeros(2 * n, 9);
        for (i, (src, dst)) in sources.iter().zip(targets.iter()).enumerate() {
            let Point2d { x, y } = t_src.apply(src);
            let Point2d { x: u, y: v } = t_dst.apply(dst);

            mat_a.write(2 * i, 0, x);
            mat_a.write(2 * i, 1, y);
            mat_a.write(2 * i, 2, 1.0);
            mat_a.write(2 * i, 6, -u * x);
            mat_a.write(2 * i, 7, -u * y);
            mat_a.write(2 * i, 8, -u);

            mat_a.write(2 * i + 1, 3, x);
            mat_a.write(2 * i + 1, 4, y);
            mat_a.write(2 * i + 1, 5, 1.0);
            mat_a.write(2 * i + 1, 6, -v * x);
            mat_a.write(2 * i + 1, 7, -v * y);
            mat_a.write(2 * i + 1, 8, -v);
        }

        // singular values come sorted in non-increasing order; a valid system has rank 8
        let svd = mat_a.svd();
        let sigma = svd.s_diagonal();
        let sigma_max = sigma.read(0);
        let ratio = if sigma_max > 0.0 {
            sigma.read(7) / sigma_max
        } else {
            0.0
        };
        if !ratio.is_finite() || ratio < self.params.rank_tolerance {
            log::debug!("rejecting correspondences: sigma_8 / sigma_max = {ratio:e}");
            return Err(HomographyError::DegenerateConfiguration {
                ratio,
                tolerance: self.params.rank_tolerance,
            });
        }

        // null vector: right singular vector of the smallest singular value
        let h = svd.v().col(8);
        let h_norm = [
            [h[0], h[1], h[2]],
            [h[3], h[4], h[5]],
            [h[6], h[7], h[8]],
        ];

        // H = T_dst^-1 * H_norm * T_src
        let denorm = linalg::mat33_mul(
            &linalg::mat33_mul(&t_dst.inverse_matrix(), &h_norm),
            &t_src.matrix(),
        );

        let norm = linalg::frobenius_norm_mat33(&denorm);
        if !norm.is_finite() || norm == 0.0 {
            return Err(HomographyError::SingularResult { det: 0.0 });
        }
        let mut homo = linalg::scale_mat33(&denorm, 1.0 / norm);

        let unit_scale = homo[2][2].abs() > self.params.scale_tolerance;
        if unit_scale {
            homo = linalg::scale_mat33(&homo, 1.0 / homo[2][2]);
        } else {
            log::warn!(
                "homography has H[2][2] ~ 0 (normalized det {:e}); ideal points may appear",
                normalized_det(&homo)
            );
        }

        let homography = Homography::validated(homo, self.params.singular_tolerance)?;
        Ok((homography, unit_scale))
    }
}

/// Estimate the homography from `correspondences` with the default tolerances.
///
/// Requires at least four correspondences whose source and target points are
/// in general position.
pub fn find_homography(correspondences: &[Correspondence]) -> Result<Homography, HomographyError> {
    HomographyEstimator::default()
        .solve(correspondences)
        .map(|(h, _)| h)
}

/// Euclidean reprojection error of each correspondence under `h`.
pub fn reprojection_errors(h: &Homography, correspondences: &[Correspondence]) -> Vec<f64> {
    correspondences
        .iter()
        .map(|c| match h.transform_point(c.source) {
            Ok(p) => p.distance(&c.target),
            Err(_) => f64::INFINITY,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn project(h: &[[f64; 3]; 3], p: [f64; 2]) -> [f64; 2] {
        let q = linalg::mat33_mul_vec3(h, &[p[0], p[1], 1.0]);
        [q[0] / q[2], q[1] / q[2]]
    }

    fn assert_homography_eq(actual: &Homography, expected: &[[f64; 3]; 3]) {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(actual.as_array()[i][j], expected[i][j], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_axis_scaling() -> Result<(), Box<dyn std::error::Error>> {
        let correspondences = [
            Correspondence::new([0.0, 0.0], [0.0, 0.0]),
            Correspondence::new([1.0, 0.0], [2.0, 0.0]),
            Correspondence::new([0.0, 1.0], [0.0, 3.0]),
            Correspondence::new([1.0, 1.0], [2.0, 3.0]),
        ];
        let fit = HomographyEstimator::default().estimate(&correspondences)?;
        assert!(fit.unit_scale);
        assert_homography_eq(
            &fit.homography,
            &[[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 1.0]],
        );

        let p = fit.homography.transform_point(Point2d::new(0.5, 0.5))?;
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 1.5, epsilon = 1e-9);
        assert!(fit.max_error < 1e-9);
        Ok(())
    }

    #[test]
    fn test_projective_4pt_exact() -> Result<(), Box<dyn std::error::Error>> {
        let h_true = [[1.2, 0.1, 5.0], [-0.05, 0.9, -3.0], [0.001, 0.002, 1.0]];
        let src = [[10.0, 20.0], [400.0, 30.0], [380.0, 290.0], [25.0, 310.0]];
        let correspondences = src
            .iter()
            .map(|&p| Correspondence::new(p, project(&h_true, p)))
            .collect::<Vec<_>>();

        let h = find_homography(&correspondences)?;
        assert_homography_eq(&h, &h_true);
        Ok(())
    }

    #[test]
    fn test_origin_on_vanishing_line() -> Result<(), Box<dyn std::error::Error>> {
        // (x, y) -> (1 / x, y / x): H[2][2] = 0, so no rescaling to unit [2][2]
        let h_true = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        let src = [[1.0, 1.0], [2.0, -1.0], [3.0, 2.0], [-2.0, 1.0], [0.5, -2.0]];
        let correspondences = src
            .iter()
            .map(|&p| Correspondence::new(p, project(&h_true, p)))
            .collect::<Vec<_>>();

        let fit = HomographyEstimator::default().estimate(&correspondences)?;
        assert!(!fit.unit_scale);
        assert!(fit.max_error < 1e-9);

        let h = fit.homography.as_array();
        assert_relative_eq!(linalg::frobenius_norm_mat33(h), 1.0, epsilon = 1e-12);
        assert!(h[2][2].abs() < 1e-12);
        let third = 1.0 / 3.0f64.sqrt();
        for (i, j) in [(0, 2), (1, 1), (2, 0)] {
            assert_relative_eq!(h[i][j].abs(), third, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_insufficient_points() {
        let correspondences = [
            Correspondence::new([0.0, 0.0], [0.0, 0.0]),
            Correspondence::new([1.0, 0.0], [1.0, 0.0]),
            Correspondence::new([0.0, 1.0], [0.0, 1.0]),
        ];
        assert_eq!(
            find_homography(&correspondences),
            Err(HomographyError::InsufficientPoints {
                required: 4,
                actual: 3
            })
        );
        assert!(matches!(
            find_homography(&[]),
            Err(HomographyError::InsufficientPoints { actual: 0, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let correspondences = [
            Correspondence::new([0.0, 0.0], [0.0, 0.0]),
            Correspondence::new([1.0, 0.0], [1.0, 0.0]),
            Correspondence::new([0.0, f64::NAN], [0.0, 1.0]),
            Correspondence::new([1.0, 1.0], [1.0, 1.0]),
        ];
        assert_eq!(
            find_homography(&correspondences),
            Err(HomographyError::NonFiniteCoordinate { index: 2 })
        );
    }

    #[test]
    fn test_duplicated_points_degenerate() {
        let correspondences = [
            Correspondence::new([0.0, 0.0], [0.0, 0.0]),
            Correspondence::new([1.0, 0.0], [1.0, 0.0]),
            Correspondence::new([1.0, 0.0], [1.0, 0.0]),
            Correspondence::new([0.0, 1.0], [0.0, 1.0]),
        ];
        assert!(matches!(
            find_homography(&correspondences),
            Err(HomographyError::DegenerateConfiguration { .. })
        ));

        let coincident = [Correspondence::new([5.0, 5.0], [1.0, 1.0]); 4];
        assert!(matches!(
            find_homography(&coincident),
            Err(HomographyError::DegenerateConfiguration { .. })
        ));
    }

    #[test]
    fn test_residual_report_flags_misclick() -> Result<(), Box<dyn std::error::Error>> {
        let h_true = [[0.02, 0.001, -1.0], [0.0005, 0.03, -2.0], [0.0, 0.0001, 1.0]];
        let mut correspondences = Vec::new();
        for &x in &[50.0, 300.0, 550.0] {
            for &y in &[40.0, 220.0, 400.0] {
                correspondences.push(Correspondence::new([x, y], project(&h_true, [x, y])));
            }
        }
        correspondences[4].target.x += 0.5;

        let fit = HomographyEstimator::default().estimate(&correspondences)?;
        assert_eq!(fit.residuals.len(), correspondences.len());
        assert_eq!(fit.worst_correspondence(), Some(4));
        assert!(fit.rms_error > 0.0);
        assert!(fit.max_error >= fit.rms_error);
        Ok(())
    }
}
