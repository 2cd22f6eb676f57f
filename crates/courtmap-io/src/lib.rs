#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Run configuration: column names, output naming and estimator settings.
pub mod config;

/// Reader for the court tagger's correspondence table.
pub mod correspondences;

/// Homography persistence as JSON.
pub mod persist;

/// Pivot of the video tagger's long-format `frame,label,x,y` table.
pub mod tags;

/// Wide trajectory tables with `<name>_x` / `<name>_y` column pairs.
pub mod trajectory;

mod cell;
mod error;

pub use config::{load_config, ApplyConfig, OutputConfig};
pub use correspondences::{read_correspondences, read_correspondences_from, CorrespondenceColumns};
pub use error::IoError;
pub use persist::{load_homography, save_homography};
pub use tags::{read_tags, read_tags_from};
pub use trajectory::TrajectoryTable;
