use crate::{
    camera::CameraModel,
    canonical_model::CanonicalModel,
    config::Config,
    constants::DEFAULT_LANDMARK_INDICES,
    error::CorrespondenceSide,
    landmarks::FrameLandmarks2D,
    pnp::{create_solver, IterativePnp, PnpSolver, PoseSolution},
    rotation::{roll_pitch_yaw_from_matrix, RollPitchYaw},
    Error, Result,
};
use nalgebra::{Point2, Point3};
use std::path::Path;
use std::sync::Arc;

/// Pixel residual statistics between observed and reprojected landmarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectionStats {
    /// Mean Euclidean residual in pixels
    pub mean: f64,
    /// Root mean square residual in pixels
    pub rms: f64,
    /// Largest residual in pixels
    pub max: f64,
    /// Number of points compared
    pub count: usize,
}

impl ReprojectionStats {
    /// Compare observed points against their reprojections
    #[must_use]
    pub fn from_pairs(observed: &[Point2<f64>], reprojected: &[Point2<f64>]) -> Self {
        let residuals: Vec<f64> = observed.iter().zip(reprojected).map(|(a, b)| (a - b).norm()).collect();
        let count = residuals.len();
        if count == 0 {
            return Self {
                mean: 0.0,
                rms: 0.0,
                max: 0.0,
                count,
            };
        }

        let n = count as f64;
        Self {
            mean: residuals.iter().sum::<f64>() / n,
            rms: (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt(),
            max: residuals.iter().copied().fold(0.0, f64::max),
            count,
        }
    }
}

/// Everything derived from one solve
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEstimate {
    /// The PnP solution (always successful here)
    pub solution: PoseSolution,
    /// Head orientation
    pub angles: RollPitchYaw,
    /// Landmarks that fed the solve, in pixels
    pub observed: Vec<Point2<f64>>,
    /// The same landmarks reprojected through the solved pose
    pub reprojected: Vec<Point2<f64>>,
    /// Residuals between `observed` and `reprojected`
    pub reprojection: ReprojectionStats,
}

/// Head pose estimator using `PnP` against a canonical 3D face model
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    model: Arc<CanonicalModel>,
    camera: CameraModel,
    landmark_indices: Vec<usize>,
    landmarks: FrameLandmarks2D,
    solver: Arc<dyn PnpSolver>,
}

impl PoseEstimator {
    /// Create a pose estimator with the default landmark indices
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model file cannot be read or is malformed
    /// - `width` or `height` is zero
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        Self::with_indices(model_path, width, height, DEFAULT_LANDMARK_INDICES.to_vec())
    }

    /// Create a pose estimator solving over a custom set of landmark indices
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model file cannot be read or is malformed
    /// - `width` or `height` is zero
    /// - `landmark_indices` is empty
    pub fn with_indices<P: AsRef<Path>>(
        model_path: P,
        width: u32,
        height: u32,
        landmark_indices: Vec<usize>,
    ) -> Result<Self> {
        log::info!(
            "Initializing PoseEstimator with model: {}",
            model_path.as_ref().display()
        );
        let model = CanonicalModel::load(model_path)?;
        Self::from_model(model, width, height, landmark_indices)
    }

    /// Create a pose estimator around an already loaded model
    ///
    /// # Errors
    ///
    /// Returns an error if `width` or `height` is zero or `landmark_indices` is empty
    pub fn from_model(model: CanonicalModel, width: u32, height: u32, landmark_indices: Vec<usize>) -> Result<Self> {
        validate_frame_size(width, height)?;
        if landmark_indices.is_empty() {
            return Err(Error::InvalidInput("Landmark index set is empty".to_string()));
        }

        if let Some(&out_of_range) = landmark_indices.iter().find(|&&i| i >= model.len()) {
            // Not fatal: the solve reports the missing correspondence
            log::warn!(
                "Landmark index {out_of_range} is outside the canonical model ({} vertices)",
                model.len()
            );
        }

        Ok(Self {
            model: Arc::new(model),
            camera: CameraModel::from_frame_size(width, height),
            landmark_indices,
            landmarks: FrameLandmarks2D::default(),
            solver: Arc::new(IterativePnp::default()),
        })
    }

    /// Create a pose estimator from configuration
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`PoseEstimator::with_indices`],
    /// or [`Error::ConfigError`] if the configured PnP backend is not compiled in
    pub fn from_config(config: &Config) -> Result<Self> {
        let estimator = Self::with_indices(
            &config.model.path,
            config.frame.width,
            config.frame.height,
            config.landmarks.indices.clone(),
        )?;
        let solver = create_solver(&config.solver)?;
        log::debug!("Using {} PnP solver", solver.name());
        Ok(Self { solver, ..estimator })
    }

    /// Replace the PnP backend
    #[must_use]
    pub fn with_solver<S: PnpSolver + 'static>(mut self, solver: S) -> Self {
        log::debug!("Using {} PnP solver", solver.name());
        self.solver = Arc::new(solver);
        self
    }

    /// Ingest the landmarks of a new frame.
    ///
    /// Normalized points are rescaled to pixels and replace any previous
    /// frame's landmarks. A change of frame size rebuilds the camera.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` or `height` is zero
    pub fn set_landmarks_2d(&mut self, landmarks: &[(f64, f64)], width: u32, height: u32) -> Result<()> {
        validate_frame_size(width, height)?;

        if self.camera.frame_size() != (width, height) {
            log::debug!(
                "Frame size changed from {:?} to {:?}, rebuilding camera",
                self.camera.frame_size(),
                (width, height)
            );
            self.camera = CameraModel::from_frame_size(width, height);
        }

        self.landmarks = FrameLandmarks2D::from_normalized(landmarks, width, height);
        Ok(())
    }

    /// Landmarks of the current frame, in pixels
    #[must_use]
    pub fn landmarks(&self) -> &FrameLandmarks2D {
        &self.landmarks
    }

    /// Canonical 3D model
    #[must_use]
    pub fn model(&self) -> &CanonicalModel {
        &self.model
    }

    /// Current camera
    #[must_use]
    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// Landmark indices feeding the solve, in solve order
    #[must_use]
    pub fn landmark_indices(&self) -> &[usize] {
        &self.landmark_indices
    }

    /// Ordered 3D/2D correspondences for the configured indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCorrespondence`] for the first index absent
    /// from the model or the current landmarks
    pub fn correspondences(&self) -> Result<(Vec<Point3<f64>>, Vec<Point2<f64>>)> {
        let mut object = Vec::with_capacity(self.landmark_indices.len());
        let mut image = Vec::with_capacity(self.landmark_indices.len());

        for &index in &self.landmark_indices {
            let point_3d = self.model.get(index).ok_or(Error::MissingCorrespondence {
                index,
                side: CorrespondenceSide::Model,
            })?;
            let point_2d = self.landmarks.get(index).ok_or(Error::MissingCorrespondence {
                index,
                side: CorrespondenceSide::Landmarks,
            })?;
            object.push(*point_3d);
            image.push(*point_2d);
        }

        Ok((object, image))
    }

    /// Solve PnP for the current landmarks.
    ///
    /// Every call recomputes from scratch. A failed solve is reported as
    /// `success = false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCorrespondence`] if a configured index is
    /// missing, or a backend error
    pub fn solve_pose(&self) -> Result<PoseSolution> {
        let (object, image) = self.correspondences()?;
        let solution = self.solver.solve(&object, &image, &self.camera)?;
        if !solution.success {
            log::debug!("PnP solve with {} failed", self.solver.name());
        }
        Ok(solution)
    }

    /// Solve and reproject the correspondence subset.
    ///
    /// Returns `(observed, reprojected)` pixel points in landmark-index order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoseUnavailable`] if no pose could be solved
    pub fn project_used_points(&self) -> Result<(Vec<Point2<f64>>, Vec<Point2<f64>>)> {
        let solution = self.available_pose()?;
        let (object, observed) = self.correspondences()?;
        let reprojected = self.solver.project(&solution, &object, &self.camera)?;
        Ok((observed, reprojected))
    }

    /// Solve and project arbitrary model-space points
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoseUnavailable`] if no pose could be solved
    pub fn project_points(&self, points: &[Point3<f64>]) -> Result<Vec<Point2<f64>>> {
        let solution = self.available_pose()?;
        self.solver.project(&solution, points, &self.camera)
    }

    /// Solve and convert the rotation to roll/pitch/yaw in degrees
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoseUnavailable`] if no pose could be solved
    pub fn roll_pitch_yaw(&self) -> Result<RollPitchYaw> {
        let solution = self.available_pose()?;
        Ok(roll_pitch_yaw_from_matrix(&solution.rotation_matrix()))
    }

    /// Solve and measure the reprojection residuals of the used points
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoseUnavailable`] if no pose could be solved
    pub fn reprojection_error(&self) -> Result<ReprojectionStats> {
        let (observed, reprojected) = self.project_used_points()?;
        Ok(ReprojectionStats::from_pairs(&observed, &reprojected))
    }

    /// Solve once and derive angles and reprojection from that single solution
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoseUnavailable`] if no pose could be solved
    pub fn estimate(&self) -> Result<PoseEstimate> {
        let (object, observed) = self.correspondences_for_pose()?;
        let solution = self.solver.solve(&object, &observed, &self.camera)?;
        if !solution.success {
            return Err(Error::PoseUnavailable("PnP solve did not converge".to_string()));
        }

        let reprojected = self.solver.project(&solution, &object, &self.camera)?;
        let reprojection = ReprojectionStats::from_pairs(&observed, &reprojected);
        let angles = roll_pitch_yaw_from_matrix(&solution.rotation_matrix());

        Ok(PoseEstimate {
            solution,
            angles,
            observed,
            reprojected,
            reprojection,
        })
    }

    /// Correspondences for a pose-dependent call: no landmarks means no pose
    fn correspondences_for_pose(&self) -> Result<(Vec<Point3<f64>>, Vec<Point2<f64>>)> {
        if self.landmarks.is_empty() {
            return Err(Error::PoseUnavailable("no landmarks have been ingested".to_string()));
        }
        self.correspondences()
    }

    fn available_pose(&self) -> Result<PoseSolution> {
        let (object, image) = self.correspondences_for_pose()?;
        let solution = self.solver.solve(&object, &image, &self.camera)?;
        if solution.success {
            Ok(solution)
        } else {
            Err(Error::PoseUnavailable("PnP solve did not converge".to_string()))
        }
    }
}

fn validate_frame_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "Frame size must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}
