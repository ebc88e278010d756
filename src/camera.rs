//! Approximated pinhole camera derived from the frame size.

use crate::constants::{CAMERA_CENTER_FACTOR, NUM_DISTORTION_COEFFS};
use nalgebra::{Matrix3, Point2, Point3};

/// Uncalibrated pinhole camera: focal length equals the frame width and the
/// principal point sits at the frame center. Distortion is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    width: u32,
    height: u32,
    focal_length: f64,
    center: (f64, f64),
}

impl CameraModel {
    /// Build the camera for a frame size
    #[must_use]
    pub fn from_frame_size(width: u32, height: u32) -> Self {
        let focal_length = f64::from(width);
        let center = (
            f64::from(width) / CAMERA_CENTER_FACTOR,
            f64::from(height) / CAMERA_CENTER_FACTOR,
        );

        Self {
            width,
            height,
            focal_length,
            center,
        }
    }

    /// Frame size this camera was derived from
    #[must_use]
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Focal length in pixels (same on both axes)
    #[must_use]
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Principal point in pixels
    #[must_use]
    pub fn principal_point(&self) -> (f64, f64) {
        self.center
    }

    /// 3x3 intrinsics matrix `K`
    #[must_use]
    pub fn intrinsic_matrix(&self) -> Matrix3<f64> {
        let f = self.focal_length;
        let (cx, cy) = self.center;
        Matrix3::new(f, 0.0, cx, 0.0, f, cy, 0.0, 0.0, 1.0)
    }

    /// Lens distortion coefficients (always zero)
    #[must_use]
    pub fn distortion(&self) -> [f64; NUM_DISTORTION_COEFFS] {
        [0.0; NUM_DISTORTION_COEFFS]
    }

    /// Project a camera-frame point to pixels.
    ///
    /// A point on the `z = 0` plane is projected as if `z` were 1, matching
    /// the usual convention for `projectPoints`.
    #[must_use]
    pub fn project(&self, p_cam: &Point3<f64>) -> Point2<f64> {
        let z_inv = if p_cam.z == 0.0 { 1.0 } else { 1.0 / p_cam.z };
        Point2::new(
            self.focal_length * p_cam.x * z_inv + self.center.0,
            self.focal_length * p_cam.y * z_inv + self.center.1,
        )
    }

    /// Map a pixel to normalized image coordinates (`K⁻¹ [u v 1]ᵀ`)
    #[must_use]
    pub fn normalize(&self, pixel: &Point2<f64>) -> Point2<f64> {
        Point2::new(
            (pixel.x - self.center.0) / self.focal_length,
            (pixel.y - self.center.1) / self.focal_length,
        )
    }
}
