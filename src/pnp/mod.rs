//! Perspective-n-Points solvers.
//!
//! A solver turns ordered 3D/2D correspondences and a [`CameraModel`] into a
//! [`PoseSolution`]. A numerically failed solve is reported through
//! `success = false`, not through `Err`; errors are reserved for malformed
//! calls and backend failures.

/// Native iterative solver (linear initialisation + Levenberg-Marquardt)
pub mod iterative;

/// `OpenCV` `calib3d` backend
#[cfg(feature = "opencv")]
pub mod opencv;

pub use iterative::IterativePnp;
#[cfg(feature = "opencv")]
pub use self::opencv::OpenCvPnp;

use crate::{
    camera::CameraModel,
    constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE},
    rotation::rotation_matrix_from_vector,
    Error, Result,
};
use nalgebra::{Matrix3, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Output of a PnP solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSolution {
    /// Whether the solve converged to a usable pose
    pub success: bool,
    /// Rodrigues rotation vector (model to camera); meaningless if `!success`
    pub rotation: Vector3<f64>,
    /// Translation (model to camera); meaningless if `!success`
    pub translation: Vector3<f64>,
}

impl PoseSolution {
    /// A successful solution
    #[must_use]
    pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            success: true,
            rotation,
            translation,
        }
    }

    /// A failed solve
    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            rotation: Vector3::zeros(),
            translation: Vector3::zeros(),
        }
    }

    /// Rotation as a 3x3 matrix
    #[must_use]
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        rotation_matrix_from_vector(&self.rotation)
    }

    /// Transform a model point into the camera frame
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation_matrix() * point.coords + self.translation)
    }
}

/// Which [`PnpSolver`] implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PnpBackend {
    /// Native [`IterativePnp`]
    #[default]
    Iterative,
    /// `OpenCV` `calib3d`; needs the `opencv` feature
    #[serde(rename = "opencv")]
    OpenCv,
}

impl PnpBackend {
    /// Whether this backend was compiled in
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::Iterative => true,
            Self::OpenCv => cfg!(feature = "opencv"),
        }
    }
}

impl FromStr for PnpBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "iterative" | "native" => Ok(Self::Iterative),
            "opencv" => Ok(Self::OpenCv),
            _ => Err(Error::ConfigError(format!("Unknown PnP backend: {s}"))),
        }
    }
}

impl std::fmt::Display for PnpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iterative => f.write_str("iterative"),
            Self::OpenCv => f.write_str("opencv"),
        }
    }
}

/// Settings for the PnP solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Solver implementation
    pub backend: PnpBackend,

    /// Maximum number of refinement iterations
    pub max_iterations: usize,

    /// Stop once the pose update norm falls below this value
    pub tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            backend: PnpBackend::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Create the solver named by `settings.backend`
///
/// # Errors
///
/// Returns [`Error::ConfigError`] if the backend was not compiled in
pub fn create_solver(settings: &SolverSettings) -> Result<Arc<dyn PnpSolver>> {
    match settings.backend {
        PnpBackend::Iterative => Ok(Arc::new(IterativePnp::new(*settings))),
        #[cfg(feature = "opencv")]
        PnpBackend::OpenCv => Ok(Arc::new(OpenCvPnp)),
        #[cfg(not(feature = "opencv"))]
        PnpBackend::OpenCv => Err(Error::ConfigError(
            "The opencv PnP backend needs the `opencv` feature".to_string(),
        )),
    }
}

/// Trait for all PnP backends
pub trait PnpSolver: Send + Sync + std::fmt::Debug {
    /// Solve for the pose mapping `object` points onto `image` pixels.
    ///
    /// `object[i]` and `image[i]` must describe the same landmark.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length or the backend fails
    /// outright. Non-convergence and degenerate input yield
    /// `Ok(PoseSolution { success: false, .. })`.
    fn solve(&self, object: &[Point3<f64>], image: &[Point2<f64>], camera: &CameraModel) -> Result<PoseSolution>;

    /// Project model points with a solved pose
    ///
    /// # Errors
    ///
    /// Returns an error if the backend projection fails
    fn project(&self, pose: &PoseSolution, points: &[Point3<f64>], camera: &CameraModel) -> Result<Vec<Point2<f64>>> {
        let rotation = pose.rotation_matrix();
        Ok(points
            .iter()
            .map(|p| camera.project(&Point3::from(rotation * p.coords + pose.translation)))
            .collect())
    }

    /// Backend name
    fn name(&self) -> &str;
}
