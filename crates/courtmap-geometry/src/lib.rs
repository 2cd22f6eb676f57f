#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Courtmap geometry
//!
//! Maps pixel coordinates observed in video frames onto a real-world plane
//! (e.g. a court) through a 3×3 projective transform.
//!
//! - [`estimate`]: normalized Direct Linear Transform with SVD, degeneracy checks
//!   and a reprojection residual report
//! - [`ransac`]: optional robust estimation over the same DLT core
//! - [`transform`]: per-point perspective division, per-stream and per-table batches
//!
//! ## Example
//!
//! ```rust
//! use courtmap_geometry::{find_homography, Correspondence, Point2d};
//!
//! let correspondences = [
//!     Correspondence::new([0.0, 0.0], [0.0, 0.0]),
//!     Correspondence::new([1.0, 0.0], [2.0, 0.0]),
//!     Correspondence::new([0.0, 1.0], [0.0, 3.0]),
//!     Correspondence::new([1.0, 1.0], [2.0, 3.0]),
//! ];
//!
//! let homography = find_homography(&correspondences)?;
//! let court = homography.transform_point(Point2d::new(0.5, 0.5))?;
//! assert!((court.x - 1.0).abs() < 1e-9);
//! assert!((court.y - 1.5).abs() < 1e-9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Homography estimation from point correspondences.
pub mod estimate;

/// The homography type and its error taxonomy.
pub mod homography;

/// Small fixed-size matrix helpers.
pub mod linalg;

/// Similarity normalization used to condition the DLT system.
pub mod normalize;

/// RANSAC-based robust homography estimation.
pub mod ransac;

/// Batch coordinate transforms over streams and tables.
pub mod transform;

mod types;

pub use estimate::{find_homography, EstimatorParams, HomographyEstimator, HomographyFit};
pub use homography::{Homography, HomographyError, TransformError};
pub use ransac::{ransac_homography, RansacFit, RansacParams};
pub use transform::{
    transform, transform_stream, transform_table, CoordinateStream, CoordinateTable,
    TransformedPoint, TransformedStream, TransformedTable,
};
pub use types::{Correspondence, Point2d};
