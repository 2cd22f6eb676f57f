use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use courtmap_geometry::{EstimatorParams, RansacParams};
use serde::{Deserialize, Serialize};

use crate::{CorrespondenceColumns, IoError};

/// Where and how transformed trajectories are written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Explicit output path. When unset the path is derived from the input.
    pub output: Option<PathBuf>,
    /// Tag appended to the input file stem when deriving the output path.
    pub tag: String,
    /// Suffix of the companion columns, as in `<name>_x_<suffix>`.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output: None,
            tag: "homography".to_string(),
            suffix: "meters".to_string(),
        }
    }
}

impl OutputConfig {
    /// Output path for `input`: the explicit path if set, otherwise
    /// `<input stem>_<tag>.csv` next to the input.
    pub fn resolve_output_path(&self, input: &Path) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{stem}_{}.csv", self.tag))
    }

    /// Reject names that would produce malformed headers or file names,
    /// such as `ball_x_` for an empty suffix.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.suffix.trim().is_empty() {
            return Err(IoError::InvalidConfig(
                "output column suffix must not be empty".to_string(),
            ));
        }
        if self.tag.trim().is_empty() {
            return Err(IoError::InvalidConfig(
                "output file tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for one estimate-and-apply run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Column names of the correspondence table.
    pub columns: CorrespondenceColumns,
    /// Output naming.
    pub output: OutputConfig,
    /// DLT tolerances.
    pub estimator: EstimatorParams,
    /// Robust estimation; plain DLT when unset.
    pub ransac: Option<RansacParams>,
}

/// Load an [`ApplyConfig`] from a JSON file. Missing fields take their defaults;
/// an empty output suffix or tag is rejected.
pub fn load_config(path: impl AsRef<Path>) -> Result<ApplyConfig, IoError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let config: ApplyConfig = serde_json::from_reader(reader)?;
    config.output.validate()?;
    log::debug!("loaded config from {}", path.as_ref().display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_output_path() {
        let config = OutputConfig::default();
        assert_eq!(
            config.resolve_output_path(Path::new("data/tennis_test_tagged.csv")),
            PathBuf::from("data/tennis_test_tagged_homography.csv")
        );

        let config = OutputConfig {
            output: Some(PathBuf::from("out.csv")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_output_path(Path::new("data/in.csv")),
            PathBuf::from("out.csv")
        );
    }

    #[test]
    fn test_partial_config() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{
            "columns": { "world_x": "court_x", "world_y": "court_y" },
            "output": { "suffix": "court" },
            "ransac": { "threshold": 0.25, "random_seed": 7 }
        }"#;
        let config: ApplyConfig = serde_json::from_str(json)?;
        assert_eq!(config.columns.pixel_x, "X");
        assert_eq!(config.columns.world_x, "court_x");
        assert_eq!(config.output.suffix, "court");
        assert_eq!(config.output.tag, "homography");
        assert_eq!(config.estimator, EstimatorParams::default());

        let ransac = config.ransac.ok_or("ransac settings missing")?;
        assert_eq!(ransac.threshold, 0.25);
        assert_eq!(ransac.random_seed, Some(7));
        assert_eq!(ransac.max_iterations, RansacParams::default().max_iterations);
        Ok(())
    }

    #[test]
    fn test_empty_suffix_rejected() -> Result<(), Box<dyn std::error::Error>> {
        assert!(OutputConfig::default().validate().is_ok());

        let config = OutputConfig {
            suffix: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IoError::InvalidConfig(_))));

        let config = OutputConfig {
            tag: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IoError::InvalidConfig(_))));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("courtmap.json");
        std::fs::write(&path, r#"{ "output": { "suffix": "" } }"#)?;
        assert!(matches!(load_config(&path), Err(IoError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn test_load_config_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("courtmap.json");
        std::fs::write(&path, "{}")?;
        assert_eq!(load_config(&path)?, ApplyConfig::default());
        Ok(())
    }
}
