//! Configuration management for the face PnP estimator

use crate::{
    constants::{DEFAULT_LANDMARK_INDICES, DEFAULT_MODEL_PATH, MIN_PNP_POINTS},
    pnp::SolverSettings,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Estimator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Canonical model configuration
    pub model: ModelConfig,

    /// Frame geometry
    pub frame: FrameConfig,

    /// Landmark selection
    pub landmarks: LandmarkConfig,

    /// PnP refinement settings
    pub solver: SolverSettings,
}

/// Canonical model location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the canonical 3D face model (OBJ vertex file)
    pub path: PathBuf,
}

/// Frame size the camera is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,
}

/// Landmark indices feeding the PnP solve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Indices in solve order
    pub indices: Vec<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            indices: DEFAULT_LANDMARK_INDICES.to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(Error::ConfigError(format!(
                "Frame size must be non-zero, got {}x{}",
                self.frame.width, self.frame.height
            )));
        }

        if self.landmarks.indices.is_empty() {
            return Err(Error::ConfigError("Landmark index set must not be empty".to_string()));
        }
        if self.landmarks.indices.len() < MIN_PNP_POINTS {
            // The solver reports this as a failed solve on every frame
            log::warn!(
                "Only {} landmark indices configured; PnP needs at least {MIN_PNP_POINTS}",
                self.landmarks.indices.len()
            );
        }

        if !self.solver.backend.is_available() {
            return Err(Error::ConfigError(format!(
                "PnP backend '{}' is not available in this build",
                self.solver.backend
            )));
        }

        if self.solver.max_iterations == 0 {
            return Err(Error::ConfigError(
                "Solver max_iterations must be greater than 0".to_string(),
            ));
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance < 0.0 {
            return Err(Error::ConfigError(
                "Solver tolerance must be a finite, non-negative number".to_string(),
            ));
        }

        if !self.model.path.exists() {
            return Err(Error::ConfigError(format!(
                "Canonical face model not found: {}",
                self.model.path.display()
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face PnP Configuration

# Canonical 3D face model (OBJ vertex file, vertex order = landmark index)
model:
  path: "canonical_face_model/canonical_face_model.obj"

# Frame size used to derive the pinhole camera
frame:
  width: 640
  height: 480

# Landmarks feeding the PnP solve, in solve order
landmarks:
  indices:
    - 1    # nose tip
    - 33   # left eye corner
    - 263  # right eye corner
    - 61   # left mouth corner
    - 291  # right mouth corner
    - 199  # chin
    - 168  # between the eyebrows
    - 17   # bottom lip
    - 101  # left cheek
    - 330  # right cheek
    - 234  # left ear
    - 454  # right ear

# PnP solver: "iterative" (native) or "opencv" (needs the `opencv` feature)
solver:
  backend: iterative
  # Levenberg-Marquardt refinement (iterative backend)
  max_iterations: 100
  tolerance: 1.0e-10
"#;
