use argh::FromArgs;
use std::path::{Path, PathBuf};

use courtmap_geometry::{
    ransac_homography, transform_table, Correspondence, Homography, HomographyEstimator,
    RansacParams,
};
use courtmap_io::{ApplyConfig, TrajectoryTable};

#[derive(FromArgs)]
/// Map tagged pixel trajectories onto court coordinates with a homography
struct Args {
    /// path to a JSON run configuration
    #[argh(option)]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Estimate(EstimateArgs),
    Apply(ApplyArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "estimate")]
/// Estimate the homography from a correspondence table and report its residuals
struct EstimateArgs {
    /// path to the correspondence CSV (Point,X,Y,GrX,GrY)
    #[argh(positional)]
    correspondences: PathBuf,

    /// save the homography as JSON to this path
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// enable RANSAC with this inlier threshold in court units
    #[argh(option)]
    ransac_threshold: Option<f64>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "apply")]
/// Transform every <name>_x / <name>_y column pair of a trajectory CSV
struct ApplyArgs {
    /// path to the trajectory CSV
    #[argh(positional)]
    trajectory: PathBuf,

    /// path to the correspondence CSV; not needed with --homography
    #[argh(positional)]
    correspondences: Option<PathBuf>,

    /// use a homography saved by `estimate` instead of estimating one
    #[argh(option)]
    homography: Option<PathBuf>,

    /// the trajectory CSV is in long format (frame,label,x,y)
    #[argh(switch)]
    tags: bool,

    /// output CSV path, defaults to <input>_homography.csv
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// suffix of the transformed columns, defaults to "meters"
    #[argh(option)]
    suffix: Option<String>,

    /// enable RANSAC with this inlier threshold in court units
    #[argh(option)]
    ransac_threshold: Option<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => courtmap_io::load_config(path)?,
        None => ApplyConfig::default(),
    };

    match args.command {
        Command::Estimate(cmd) => estimate(cmd, config),
        Command::Apply(cmd) => apply(cmd, config),
    }
}

fn estimate(args: EstimateArgs, mut config: ApplyConfig) -> Result<(), Box<dyn std::error::Error>> {
    enable_ransac(&mut config, args.ransac_threshold);

    let correspondences = courtmap_io::read_correspondences(&args.correspondences, &config.columns)?;
    let homography = fit_homography(&correspondences, &config)?;
    print!("{homography}");

    if let Some(path) = args.output {
        courtmap_io::save_homography(path, &homography)?;
    }
    Ok(())
}

fn apply(args: ApplyArgs, mut config: ApplyConfig) -> Result<(), Box<dyn std::error::Error>> {
    enable_ransac(&mut config, args.ransac_threshold);
    override_output(&mut config, args.output, args.suffix)?;

    let homography = resolve_homography(
        args.homography.as_deref(),
        args.correspondences.as_deref(),
        &config,
    )?;

    let table = if args.tags {
        courtmap_io::read_tags(&args.trajectory)?
    } else {
        TrajectoryTable::read(&args.trajectory)?
    };

    let transformed = transform_table(&homography, &table.coordinate_table()?);
    let output_path = config.output.resolve_output_path(&args.trajectory);
    table
        .with_transformed(&transformed, &config.output.suffix)
        .write(&output_path)?;

    println!("Saved transformed file to {}", output_path.display());
    Ok(())
}

fn override_output(
    config: &mut ApplyConfig,
    output: Option<PathBuf>,
    suffix: Option<String>,
) -> Result<(), courtmap_io::IoError> {
    if let Some(output) = output {
        config.output.output = Some(output);
    }
    if let Some(suffix) = suffix {
        config.output.suffix = suffix;
    }
    config.output.validate()
}

/// Load the saved homography or fit one, never both.
fn resolve_homography(
    homography: Option<&Path>,
    correspondences: Option<&Path>,
    config: &ApplyConfig,
) -> Result<Homography, Box<dyn std::error::Error>> {
    match (homography, correspondences) {
        (Some(_), Some(_)) => {
            Err("pass either a correspondence CSV or --homography, not both".into())
        }
        (Some(path), None) => Ok(courtmap_io::load_homography(path)?),
        (None, Some(path)) => {
            let correspondences = courtmap_io::read_correspondences(path, &config.columns)?;
            fit_homography(&correspondences, config)
        }
        (None, None) => Err("either a correspondence CSV or --homography is required".into()),
    }
}

fn enable_ransac(config: &mut ApplyConfig, threshold: Option<f64>) {
    if let Some(threshold) = threshold {
        let base = config.ransac.unwrap_or(RansacParams {
            estimator: config.estimator,
            ..Default::default()
        });
        config.ransac = Some(RansacParams { threshold, ..base });
    }
}

fn fit_homography(
    correspondences: &[Correspondence],
    config: &ApplyConfig,
) -> Result<Homography, Box<dyn std::error::Error>> {
    match &config.ransac {
        Some(params) => {
            let fit = ransac_homography(correspondences, params)?;
            log::info!(
                "RANSAC kept {}/{} correspondences, inlier rms error {:.4}",
                fit.inlier_count,
                correspondences.len(),
                fit.inlier_rms_error
            );
            for (i, (residual, inlier)) in fit.residuals.iter().zip(&fit.inliers).enumerate() {
                if !inlier {
                    log::warn!("correspondence {} rejected as outlier (error {:.4})", i + 1, residual);
                }
            }
            Ok(fit.homography)
        }
        None => {
            let fit = HomographyEstimator::new(config.estimator).estimate(correspondences)?;
            log::info!(
                "rms reprojection error {:.4}, max {:.4}",
                fit.rms_error,
                fit.max_error
            );
            for (i, residual) in fit.residuals.iter().enumerate() {
                log::debug!("correspondence {}: reprojection error {:.4}", i + 1, residual);
            }
            if !fit.unit_scale {
                log::warn!("homography could not be normalized to H[2][2] = 1");
            }
            Ok(fit.homography)
        }
    }
}
