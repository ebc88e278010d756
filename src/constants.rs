//! Constants used throughout the library

/// Default landmark indices feeding the PnP solve, in solve order
pub const DEFAULT_LANDMARK_INDICES: [usize; 12] = [
    1,   // nose tip
    33,  // left eye corner
    263, // right eye corner
    61,  // left mouth corner
    291, // right mouth corner
    199, // chin
    168, // between the eyebrows
    17,  // bottom lip
    101, // left cheek
    330, // right cheek
    234, // left ear
    454, // right ear
];

/// Default location of the canonical face model
pub const DEFAULT_MODEL_PATH: &str = "canonical_face_model/canonical_face_model.obj";

/// Minimum number of correspondences the iterative PnP method accepts
pub const MIN_PNP_POINTS: usize = 4;

/// Minimum number of non-planar correspondences for the 3D DLT initialisation
pub const MIN_DLT_POINTS: usize = 6;

/// Number of lens distortion coefficients (all zero, no calibration)
pub const NUM_DISTORTION_COEFFS: usize = 4;

/// Camera matrix center factor
pub const CAMERA_CENTER_FACTOR: f64 = 2.0;

/// Scale applied to the roll angle, in degrees per π radians.
///
/// Pitch and yaw use 180. The 188 is most likely a typo for 180, but roll
/// has always been reported with it, so it is kept deliberately until the
/// fix is made here as a one-line change.
pub const ROLL_SCALE_DEGREES: f64 = 188.0;

/// Scale applied to pitch and yaw, in degrees per π radians
pub const ANGLE_SCALE_DEGREES: f64 = 180.0;

/// Default maximum number of Levenberg-Marquardt iterations
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default convergence tolerance on the pose update norm
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Largest RMS pixel residual accepted from a solve of 4 or 5 non-planar
/// points. These start from guessed rotations and can settle in a local
/// minimum; above this the solve reports failure.
pub const MAX_RMS_REPROJECTION_PX: f64 = 1.0;

/// Initial Levenberg-Marquardt damping
pub const INITIAL_DAMPING: f64 = 1e-3;

/// Ratio of smallest to largest point-cloud spread below which points count as planar
pub const PLANARITY_THRESHOLD: f64 = 1e-6;

/// Smallest depth (camera frame z) accepted for a projected point
pub const MIN_DEPTH: f64 = 1e-9;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-12;
