use super::{PnpSolver, PoseSolution};
use crate::{camera::CameraModel, constants::MIN_PNP_POINTS, Error, Result};
use nalgebra::{Point2, Point3, Vector3};
use opencv::{
    calib3d,
    core::{Mat, Point2d, Point3d, Vec3d},
    prelude::*,
};

/// PnP backed by `calib3d::solve_pnp` with `SOLVEPNP_ITERATIVE`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvPnp;

impl OpenCvPnp {
    fn camera_matrix(camera: &CameraModel) -> Result<Mat> {
        let k = camera.intrinsic_matrix();
        let rows = [
            [k[(0, 0)], k[(0, 1)], k[(0, 2)]],
            [k[(1, 0)], k[(1, 1)], k[(1, 2)]],
            [k[(2, 0)], k[(2, 1)], k[(2, 2)]],
        ];
        Ok(Mat::from_slice_2d(&rows)?.try_clone()?)
    }

    fn dist_coeffs(camera: &CameraModel) -> Result<Mat> {
        Ok(Mat::from_slice(&camera.distortion())?.try_clone()?)
    }
}

impl PnpSolver for OpenCvPnp {
    fn solve(&self, object: &[Point3<f64>], image: &[Point2<f64>], camera: &CameraModel) -> Result<PoseSolution> {
        if object.len() != image.len() {
            return Err(Error::InvalidInput(format!(
                "PnP needs matching correspondences, got {} model points and {} image points",
                object.len(),
                image.len()
            )));
        }

        // calib3d asserts on short input instead of reporting failure
        if object.len() < MIN_PNP_POINTS {
            log::debug!(
                "PnP needs at least {MIN_PNP_POINTS} correspondences, got {}",
                object.len()
            );
            return Ok(PoseSolution::failed());
        }

        let object_points: Vec<Point3d> = object.iter().map(|p| Point3d::new(p.x, p.y, p.z)).collect();
        let image_points: Vec<Point2d> = image.iter().map(|p| Point2d::new(p.x, p.y)).collect();
        let object_points = Mat::from_slice(&object_points)?.try_clone()?;
        let image_points = Mat::from_slice(&image_points)?.try_clone()?;

        let mut rvec = Mat::default();
        let mut tvec = Mat::default();

        let success = match calib3d::solve_pnp(
            &object_points,
            &image_points,
            &Self::camera_matrix(camera)?,
            &Self::dist_coeffs(camera)?,
            &mut rvec,
            &mut tvec,
            false,
            calib3d::SOLVEPNP_ITERATIVE,
        ) {
            Ok(success) => success,
            Err(e) => {
                log::warn!("OpenCV solvePnP rejected the correspondences: {e}");
                false
            }
        };

        if !success {
            return Ok(PoseSolution::failed());
        }

        let rotation = Vector3::new(*rvec.at::<f64>(0)?, *rvec.at::<f64>(1)?, *rvec.at::<f64>(2)?);
        let translation = Vector3::new(*tvec.at::<f64>(0)?, *tvec.at::<f64>(1)?, *tvec.at::<f64>(2)?);

        if !rotation.iter().chain(translation.iter()).all(|v| v.is_finite()) {
            return Ok(PoseSolution::failed());
        }

        Ok(PoseSolution::new(rotation, translation))
    }

    fn project(&self, pose: &PoseSolution, points: &[Point3<f64>], camera: &CameraModel) -> Result<Vec<Point2<f64>>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let object_points: Vec<Point3d> = points.iter().map(|p| Point3d::new(p.x, p.y, p.z)).collect();
        let object_points = Mat::from_slice(&object_points)?.try_clone()?;
        let rotation_vec = Vec3d::from([pose.rotation.x, pose.rotation.y, pose.rotation.z]);
        let translation_vec = Vec3d::from([pose.translation.x, pose.translation.y, pose.translation.z]);

        let mut image_points = Mat::default();
        calib3d::project_points(
            &object_points,
            &rotation_vec,
            &translation_vec,
            &Self::camera_matrix(camera)?,
            &Self::dist_coeffs(camera)?,
            &mut image_points,
            &mut Mat::default(),
            0.0,
        )?;

        let mut projected = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let idx = i32::try_from(i).map_err(|_| Error::InvalidInput("Index overflow".to_string()))?;
            let pt = image_points.at::<Point2d>(idx)?;
            projected.push(Point2::new(pt.x, pt.y));
        }

        Ok(projected)
    }

    fn name(&self) -> &str {
        "opencv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnp::IterativePnp;

    #[test]
    fn test_matches_native_solver() {
        let camera = CameraModel::from_frame_size(640, 480);
        let truth = PoseSolution::new(Vector3::new(0.1, -0.2, 0.05), Vector3::new(0.0, 0.0, 40.0));
        let object = vec![
            Point3::new(0.0, -0.5, 7.0),
            Point3::new(-4.5, -3.5, 3.0),
            Point3::new(4.5, -3.5, 3.0),
            Point3::new(-2.8, 3.2, 4.0),
            Point3::new(2.8, 3.2, 4.0),
            Point3::new(0.0, 7.5, 4.5),
            Point3::new(-7.5, -1.0, -3.0),
            Point3::new(7.5, -1.0, -3.0),
        ];
        let image = IterativePnp::default().project(&truth, &object, &camera).unwrap();

        let solution = OpenCvPnp.solve(&object, &image, &camera).unwrap();
        assert!(solution.success);
        assert!((solution.translation - truth.translation).norm() < 1e-3);

        let reprojected = OpenCvPnp.project(&solution, &object, &camera).unwrap();
        for (a, b) in reprojected.iter().zip(&image) {
            assert!((a - b).norm() < 1e-3);
        }
    }
}
