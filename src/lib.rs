//! Head pose estimation from facial landmarks.
//!
//! This library recovers the rotation and translation of a face relative to
//! the camera by solving the Perspective-n-Points (`PnP`) problem between:
//! - a canonical 3D face model, loaded once from an OBJ vertex file
//! - the 2D landmarks of the current frame, supplied by an external detector
//!
//! The estimation pipeline consists of:
//! 1. Loading the canonical model (vertex order defines the landmark index)
//! 2. Ingesting normalized landmarks and rescaling them to pixels
//! 3. Solving `PnP` over a configurable subset of landmark indices
//! 4. Deriving roll/pitch/yaw or reprojecting arbitrary model points
//!
//! The camera is not calibrated: the focal length is the frame width, the
//! principal point is the frame center and distortion is zero.
//!
//! # Examples
//!
//! ```no_run
//! use face_pnp::pose_estimation::PoseEstimator;
//! use nalgebra::Point3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut estimator = PoseEstimator::new("canonical_face_model/canonical_face_model.obj", 640, 480)?;
//!
//! // Normalized (x, y) landmarks from the upstream detector, one per mesh vertex
//! let landmarks: Vec<(f64, f64)> = vec![(0.5, 0.5); 468];
//! estimator.set_landmarks_2d(&landmarks, 640, 480)?;
//!
//! let solution = estimator.solve_pose()?;
//! if solution.success {
//!     let angles = estimator.roll_pitch_yaw()?;
//!     println!("Roll: {:.2}°, Pitch: {:.2}°, Yaw: {:.2}°", angles.roll, angles.pitch, angles.yaw);
//!
//!     // Where a point 10 units in front of the nose lands in the image
//!     let nose_axis = estimator.project_points(&[Point3::new(0.0, 0.0, 10.0)])?;
//!     println!("Nose axis end: ({:.1}, {:.1})", nose_axis[0].x, nose_axis[0].y);
//! }
//! # Ok(())
//! # }
//! ```

/// Canonical 3D face model loading
pub mod canonical_model;

/// Per-frame 2D landmarks
pub mod landmarks;

/// Approximated pinhole camera
pub mod camera;

/// Perspective-n-Points solvers
pub mod pnp;

/// Rodrigues and Euler angle conversions
pub mod rotation;

/// Head pose estimation module using `PnP` algorithm
pub mod pose_estimation;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
pub use pose_estimation::PoseEstimator;
