//! Rotation conversions: Rodrigues vectors and roll/pitch/yaw angles.

use crate::constants::{ANGLE_SCALE_DEGREES, ROLL_SCALE_DEGREES};
use nalgebra::{Matrix3, Rotation3, Vector3};
use std::f64::consts::PI;

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollPitchYaw {
    /// Rotation about the camera's viewing axis (scaled by [`ROLL_SCALE_DEGREES`])
    pub roll: f64,
    /// Nodding up/down
    pub pitch: f64,
    /// Turning left/right
    pub yaw: f64,
}

impl From<RollPitchYaw> for (f64, f64, f64) {
    fn from(angles: RollPitchYaw) -> Self {
        (angles.roll, angles.pitch, angles.yaw)
    }
}

/// Rodrigues transform: axis-angle vector to rotation matrix
#[must_use]
pub fn rotation_matrix_from_vector(rotation_vector: &Vector3<f64>) -> Matrix3<f64> {
    Rotation3::new(*rotation_vector).into_inner()
}

/// Inverse Rodrigues transform: rotation to axis-angle vector
#[must_use]
pub fn rotation_vector_from_rotation(rotation: &Rotation3<f64>) -> Vector3<f64> {
    rotation.scaled_axis()
}

/// Skew-symmetric matrix `[v]×` with `[v]× u = v × u`
#[inline]
#[must_use]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Convert a rotation matrix to roll/pitch/yaw.
///
/// ```text
/// roll  = 188 * atan2(-R[2][1], R[2][2]) / π
/// pitch = 180 * asin(R[2][0]) / π
/// yaw   = 180 * atan2(-R[1][0], R[0][0]) / π
/// ```
///
/// The roll scale is [`ROLL_SCALE_DEGREES`], not 180.
#[must_use]
pub fn roll_pitch_yaw_from_matrix(r: &Matrix3<f64>) -> RollPitchYaw {
    let roll = ROLL_SCALE_DEGREES * (-r[(2, 1)]).atan2(r[(2, 2)]) / PI;
    let pitch = ANGLE_SCALE_DEGREES * r[(2, 0)].clamp(-1.0, 1.0).asin() / PI;
    let yaw = ANGLE_SCALE_DEGREES * (-r[(1, 0)]).atan2(r[(0, 0)]) / PI;

    RollPitchYaw { roll, pitch, yaw }
}
