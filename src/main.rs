//! Command-line head pose estimation from a landmark file.

use anyhow::{Context, Result};
use clap::Parser;
use face_pnp::{
    config::{Config, EXAMPLE_CONFIG},
    landmarks::FrameLandmarks2D,
    PoseEstimator,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Canonical 3D face model (OBJ vertex file)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Normalized landmarks, one `x y [z]` per line
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Comma-separated landmark indices used for the solve
    #[arg(short, long, value_delimiter = ',')]
    indices: Option<Vec<usize>>,

    /// PnP backend (iterative, opencv)
    #[cfg(feature = "opencv")]
    #[arg(long)]
    solver: Option<face_pnp::pnp::PnpBackend>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(model) = args.model {
        config.model.path = model;
    }
    if let Some(width) = args.width {
        config.frame.width = width;
    }
    if let Some(height) = args.height {
        config.frame.height = height;
    }
    if let Some(indices) = args.indices {
        config.landmarks.indices = indices;
    }
    #[cfg(feature = "opencv")]
    if let Some(backend) = args.solver {
        config.solver.backend = backend;
    }
    config.validate()?;

    let landmarks_path = args.landmarks.context("--landmarks is required")?;
    let content = std::fs::read_to_string(&landmarks_path)
        .with_context(|| format!("Failed to read landmarks from {}", landmarks_path.display()))?;
    let landmarks = FrameLandmarks2D::parse_normalized(&content)?;
    info!("Read {} landmarks from {}", landmarks.len(), landmarks_path.display());

    let mut estimator = PoseEstimator::from_config(&config)?;
    estimator.set_landmarks_2d(&landmarks, config.frame.width, config.frame.height)?;

    let solution = estimator.solve_pose()?;
    println!("success: {}", solution.success);
    if !solution.success {
        log::warn!("No pose could be solved for {}", landmarks_path.display());
        return Ok(());
    }

    let estimate = estimator.estimate()?;
    let solution = &estimate.solution;
    println!(
        "rotation: [{:.6}, {:.6}, {:.6}]",
        solution.rotation.x, solution.rotation.y, solution.rotation.z
    );
    println!(
        "translation: [{:.6}, {:.6}, {:.6}]",
        solution.translation.x, solution.translation.y, solution.translation.z
    );
    println!(
        "roll: {:.3}  pitch: {:.3}  yaw: {:.3}",
        estimate.angles.roll, estimate.angles.pitch, estimate.angles.yaw
    );
    println!(
        "reprojection error: mean {:.4}px  rms {:.4}px  max {:.4}px over {} points",
        estimate.reprojection.mean, estimate.reprojection.rms, estimate.reprojection.max, estimate.reprojection.count
    );

    Ok(())
}
