//! RANSAC over the normalized DLT for correspondence sets with mis-clicked points.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::estimate::{reprojection_errors, MIN_CORRESPONDENCES};
use crate::{Correspondence, EstimatorParams, Homography, HomographyError, HomographyEstimator};

/// Parameters for RANSAC homography estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold on the reprojection error, in target units.
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Desired probability that at least one sample is outlier free.
    pub confidence: f64,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
    /// Tolerances of the underlying DLT estimator.
    pub estimator: EstimatorParams,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 1.0,
            min_inliers: MIN_CORRESPONDENCES,
            confidence: 0.99,
            random_seed: Some(0),
            estimator: EstimatorParams::default(),
        }
    }
}

/// Result of a RANSAC homography fit.
#[derive(Clone, Debug, PartialEq)]
pub struct RansacFit {
    /// Homography refitted on the consensus set.
    pub homography: Homography,
    /// Reprojection error of every correspondence under `homography`, in input order.
    pub residuals: Vec<f64>,
    /// Per-correspondence inlier mask of the consensus set.
    pub inliers: Vec<bool>,
    /// Number of inliers.
    pub inlier_count: usize,
    /// Root-mean-square reprojection error over the inliers.
    pub inlier_rms_error: f64,
    /// Number of sampling iterations actually run.
    pub iterations: usize,
}

/// Estimate a homography robustly, ignoring correspondences that disagree
/// with the consensus.
///
/// Minimal 4-point samples are fitted with the DLT and scored by how many
/// correspondences they reproject within `threshold`. The best consensus set
/// is then refitted with all its members.
pub fn ransac_homography(
    correspondences: &[Correspondence],
    params: &RansacParams,
) -> Result<RansacFit, HomographyError> {
    let n = correspondences.len();
    if n < MIN_CORRESPONDENCES {
        return Err(HomographyError::InsufficientPoints {
            required: MIN_CORRESPONDENCES,
            actual: n,
        });
    }

    let estimator = HomographyEstimator::new(params.estimator);
    let min_inliers = params.min_inliers.max(MIN_CORRESPONDENCES);

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    };

    let threshold_sq = params.threshold * params.threshold;
    let mut best_inliers = Vec::new();
    let mut best_count = 0usize;
    let mut best_score = f64::INFINITY;

    let mut required_iters = params.max_iterations;
    let mut iter = 0usize;
    let mut sample = [correspondences[0]; MIN_CORRESPONDENCES];

    while iter < required_iters {
        iter += 1;

        let indices = rand::seq::index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        for (slot, idx) in sample.iter_mut().zip(indices.iter()) {
            *slot = correspondences[idx];
        }
        let h = match estimator.solve(&sample) {
            Ok((h, _)) => h,
            Err(_) => continue,
        };

        let mut inliers = vec![false; n];
        let mut count = 0usize;
        let mut score = 0.0f64;
        for (i, c) in correspondences.iter().enumerate() {
            let Ok(p) = h.transform_point(c.source) else {
                continue;
            };
            let d = p.distance_squared(&c.target);
            if d <= threshold_sq {
                inliers[i] = true;
                count += 1;
                score += d;
            }
        }

        if count > best_count || (count == best_count && score < best_score) {
            best_inliers = inliers;
            best_count = count;
            best_score = score;
            required_iters = required_iters.min(adaptive_iterations(
                best_count,
                n,
                params.confidence,
                params.max_iterations,
                iter,
            ));
        }
    }

    if best_count < min_inliers {
        return Err(HomographyError::InsufficientInliers {
            required: min_inliers,
            actual: best_count,
        });
    }

    let consensus = correspondences
        .iter()
        .zip(best_inliers.iter())
        .filter(|(_, inlier)| **inlier)
        .map(|(c, _)| *c)
        .collect::<Vec<_>>();
    let refit = estimator.estimate(&consensus)?;

    log::debug!(
        "RANSAC kept {}/{} correspondences after {} iterations (inlier rms {:.6})",
        best_count,
        n,
        iter,
        refit.rms_error
    );

    Ok(RansacFit {
        homography: refit.homography,
        residuals: reprojection_errors(&refit.homography, correspondences),
        inliers: best_inliers,
        inlier_count: best_count,
        inlier_rms_error: refit.rms_error,
        iterations: iter,
    })
}

/// Number of iterations needed to draw one all-inlier sample with the given
/// confidence, at the current inlier ratio. Never below `current`.
fn adaptive_iterations(
    inliers: usize,
    total: usize,
    confidence: f64,
    max_iterations: usize,
    current: usize,
) -> usize {
    let w = inliers as f64 / total as f64;
    if w >= 1.0 {
        return current;
    }
    let ws = w.powi(MIN_CORRESPONDENCES as i32);
    if ws <= f64::EPSILON {
        return max_iterations;
    }
    let log_conf = (1.0 - confidence).max(1e-12).ln();
    let log_denom = (1.0 - ws).ln();
    if !log_denom.is_finite() || log_denom >= 0.0 {
        return max_iterations;
    }
    let est = (log_conf / log_denom).ceil();
    if !est.is_finite() || est <= 0.0 {
        return max_iterations;
    }
    (est as usize).clamp(current, max_iterations.max(current))
}
