//! Iterative PnP: linear initialisation refined by Levenberg-Marquardt.
//!
//! Initialisation depends on the shape of the model points:
//! - planar sets use a homography between the model plane and the
//!   normalized image plane, decomposed into `[r1 r2 t]`
//! - non-planar sets of six or more points use a normalized DLT on `[R|t]`
//! - smaller non-planar sets start from a grid of rotations at the depth
//!   implied by the image spread; the lowest-cost refinement wins and is
//!   rejected if its RMS residual exceeds [`MAX_RMS_REPROJECTION_PX`]
//!
//! Refinement minimizes the pixel reprojection error:
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀ r
//! ```
//!
//! with a left-multiplicative rotation update `R ← exp(δω) R` and an
//! additive translation update. `λ` shrinks after an accepted step and grows
//! after a rejected one.

use super::{PnpSolver, PoseSolution, SolverSettings};
use crate::{
    camera::CameraModel,
    constants::{
        EPSILON, INITIAL_DAMPING, MAX_RMS_REPROJECTION_PX, MIN_DEPTH, MIN_DLT_POINTS, MIN_PNP_POINTS,
        PLANARITY_THRESHOLD,
    },
    rotation::{rotation_vector_from_rotation, skew},
    Error, Result,
};
use nalgebra::{
    DMatrix, DVector, Matrix2x3, Matrix3, Matrix3x4, Matrix4, Matrix6, Point2, Point3, Rotation3, SMatrix,
    SymmetricEigen, Vector2, Vector3, Vector6,
};

/// Rejected steps tolerated per iteration before giving up
const MAX_DAMPING_ATTEMPTS: usize = 10;

/// Relative singular value below which a linear system counts as rank deficient
const RANK_THRESHOLD: f64 = 1e-9;

/// Rotations (radians) about the x and y axes tried as frontal starting points
const FRONTAL_START_ANGLES: [f64; 5] = [0.0, -0.5, 0.5, -1.0, 1.0];

/// Native iterative PnP solver
#[derive(Debug, Clone, Copy, Default)]
pub struct IterativePnp {
    settings: SolverSettings,
}

impl IterativePnp {
    /// Create a solver with explicit settings
    #[must_use]
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Current settings
    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

impl PnpSolver for IterativePnp {
    fn solve(&self, object: &[Point3<f64>], image: &[Point2<f64>], camera: &CameraModel) -> Result<PoseSolution> {
        if object.len() != image.len() {
            return Err(Error::InvalidInput(format!(
                "PnP needs matching correspondences, got {} model points and {} image points",
                object.len(),
                image.len()
            )));
        }

        if object.len() < MIN_PNP_POINTS {
            log::debug!(
                "PnP needs at least {MIN_PNP_POINTS} correspondences, got {}",
                object.len()
            );
            return Ok(PoseSolution::failed());
        }

        let finite = object.iter().all(|p| p.coords.iter().all(|v| v.is_finite()))
            && image.iter().all(|p| p.coords.iter().all(|v| v.is_finite()));
        if !finite {
            log::debug!("PnP input contains non-finite coordinates");
            return Ok(PoseSolution::failed());
        }

        let normalized: Vec<Point2<f64>> = image.iter().map(|p| camera.normalize(p)).collect();

        let Some(starts) = initial_poses(object, &normalized) else {
            log::warn!("PnP initialisation failed: degenerate correspondences");
            return Ok(PoseSolution::failed());
        };
        let multi_start = starts.len() > 1;

        let Some(Refined { pose, cost, iterations }) = starts
            .into_iter()
            .filter_map(|start| refine(object, image, camera, start, &self.settings))
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
        else {
            log::warn!("PnP refinement failed: model points fell behind the camera");
            return Ok(PoseSolution::failed());
        };

        let rms = (cost / object.len() as f64).sqrt();
        if multi_start && rms > MAX_RMS_REPROJECTION_PX {
            log::warn!(
                "PnP on {} non-planar points settled at {rms:.3}px RMS, above {MAX_RMS_REPROJECTION_PX}px",
                object.len()
            );
            return Ok(PoseSolution::failed());
        }

        let rotation = rotation_vector_from_rotation(&pose.rotation);
        let translation = pose.translation;
        if !rotation.iter().chain(translation.iter()).all(|v| v.is_finite()) {
            log::warn!("PnP refinement produced a non-finite pose");
            return Ok(PoseSolution::failed());
        }

        log::debug!(
            "PnP solved {} correspondences in {iterations} iterations, {rms:.2e}px RMS",
            object.len()
        );
        Ok(PoseSolution::new(rotation, translation))
    }

    fn name(&self) -> &str {
        "iterative"
    }
}

/// Rigid model-to-camera transform used during the solve
#[derive(Debug, Clone, Copy)]
struct Pose {
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
}

impl Pose {
    fn from_matrix(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation: Rotation3::from_matrix_unchecked(rotation),
            translation,
        }
    }

    fn transform(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.rotation * p.coords + self.translation
    }

    fn apply_update(&self, delta: &Vector6<f64>) -> Self {
        let omega = Vector3::new(delta[0], delta[1], delta[2]);
        let dt = Vector3::new(delta[3], delta[4], delta[5]);
        Self {
            rotation: Rotation3::new(omega) * self.rotation,
            translation: self.translation + dt,
        }
    }
}

/// Centroid and principal axes of a 3D point set
struct PointSpread {
    centroid: Vector3<f64>,
    /// Columns are the principal axes, largest variance first, right-handed
    axes: Matrix3<f64>,
    /// Variances along `axes`, descending
    variances: [f64; 3],
}

fn point_spread(points: &[Point3<f64>]) -> PointSpread {
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n;

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p.coords - centroid;
        covariance += d * d.transpose();
    }
    covariance /= n;

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0_usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let e1 = eigen.eigenvectors.column(order[0]).into_owned();
    let e2 = eigen.eigenvectors.column(order[1]).into_owned();
    let e3 = e1.cross(&e2);

    PointSpread {
        centroid,
        axes: Matrix3::from_columns(&[e1, e2, e3]),
        variances: order.map(|i| eigen.eigenvalues[i].max(0.0)),
    }
}

/// Starting poses for refinement; more than one only for small non-planar sets
fn initial_poses(object: &[Point3<f64>], normalized: &[Point2<f64>]) -> Option<Vec<Pose>> {
    let spread = point_spread(object);
    let [largest, middle, smallest] = spread.variances;

    if largest <= EPSILON || middle <= PLANARITY_THRESHOLD * largest {
        log::debug!("Model points are coincident or collinear");
        return None;
    }

    if smallest <= PLANARITY_THRESHOLD * largest {
        planar_initial_pose(object, normalized, &spread).map(|pose| vec![pose])
    } else if object.len() >= MIN_DLT_POINTS {
        dlt_initial_pose(object, normalized).map(|pose| vec![pose])
    } else {
        let mut starts = Vec::with_capacity(FRONTAL_START_ANGLES.len() * FRONTAL_START_ANGLES.len());
        for &pitch in &FRONTAL_START_ANGLES {
            for &yaw in &FRONTAL_START_ANGLES {
                let rotation = Rotation3::new(Vector3::new(pitch, yaw, 0.0));
                starts.push(frontal_initial_pose(object, normalized, &spread, rotation)?);
            }
        }
        Some(starts)
    }
}

/// Decompose the model-plane homography into a pose
fn planar_initial_pose(object: &[Point3<f64>], normalized: &[Point2<f64>], spread: &PointSpread) -> Option<Pose> {
    let e1 = spread.axes.column(0).into_owned();
    let e2 = spread.axes.column(1).into_owned();
    let plane: Vec<Point2<f64>> = object
        .iter()
        .map(|p| {
            let d = p.coords - spread.centroid;
            Point2::new(d.dot(&e1), d.dot(&e2))
        })
        .collect();

    let h = homography(&plane, normalized)?;
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let scale = (h1.norm() + h2.norm()) / 2.0;
    if scale <= EPSILON {
        return None;
    }
    // The plane origin (model centroid) must lie in front of the camera
    let scale = if h3.z < 0.0 { -scale } else { scale };

    let r1 = h1 / scale;
    let r2 = h2 / scale;
    let t = h3 / scale;
    let r_plane = nearest_rotation(&Matrix3::from_columns(&[r1, r2, r1.cross(&r2)]))?;

    // Plane coordinates of a model point p are axesᵀ (p - centroid)
    let rotation = r_plane * spread.axes.transpose();
    let translation = t - rotation * spread.centroid;
    Some(Pose::from_matrix(rotation, translation))
}

/// Normalized direct linear transform on the 3x4 matrix `[R|t]`
fn dlt_initial_pose(object: &[Point3<f64>], normalized: &[Point2<f64>]) -> Option<Pose> {
    let n = object.len();
    let centroid = object.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n as f64;
    let mean_dist = object.iter().map(|p| (p.coords - centroid).norm()).sum::<f64>() / n as f64;
    if mean_dist <= EPSILON {
        return None;
    }

    let scale = 3.0_f64.sqrt() / mean_dist;
    let t_world = Matrix4::new(
        scale,
        0.0,
        0.0,
        -scale * centroid.x,
        0.0,
        scale,
        0.0,
        -scale * centroid.y,
        0.0,
        0.0,
        scale,
        -scale * centroid.z,
        0.0,
        0.0,
        0.0,
        1.0,
    );

    let mut a = DMatrix::<f64>::zeros(2 * n, 12);
    for (i, (pw, pi)) in object.iter().zip(normalized).enumerate() {
        let d = (pw.coords - centroid) * scale;
        let (x, y, z) = (d.x, d.y, d.z);
        let (u, v) = (pi.x, pi.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = z;
        a[(r0, 3)] = 1.0;
        a[(r0, 8)] = -u * x;
        a[(r0, 9)] = -u * y;
        a[(r0, 10)] = -u * z;
        a[(r0, 11)] = -u;

        a[(r1, 4)] = x;
        a[(r1, 5)] = y;
        a[(r1, 6)] = z;
        a[(r1, 7)] = 1.0;
        a[(r1, 8)] = -v * x;
        a[(r1, 9)] = -v * y;
        a[(r1, 10)] = -v * z;
        a[(r1, 11)] = -v;
    }

    let (p, conditioning) = null_vector(a)?;
    if conditioning < RANK_THRESHOLD {
        log::debug!("DLT system is rank deficient");
        return None;
    }

    // Undo the world normalization: P = P_norm * T_world
    let p_mtx = Matrix3x4::from_row_slice(p.as_slice()) * t_world;
    let m = p_mtx.fixed_view::<3, 3>(0, 0).into_owned();

    let mut s = (m.row(0).norm() + m.row(1).norm() + m.row(2).norm()) / 3.0;
    if m.determinant() < 0.0 {
        s = -s;
    }
    if s.abs() <= EPSILON {
        return None;
    }

    let rotation = nearest_rotation(&(m / s))?;
    let translation = p_mtx.column(3).into_owned() / s;
    Some(Pose::from_matrix(rotation, translation))
}

/// Pose with a fixed `rotation` at the depth where the model spread matches the image spread
fn frontal_initial_pose(
    object: &[Point3<f64>],
    normalized: &[Point2<f64>],
    spread: &PointSpread,
    rotation: Rotation3<f64>,
) -> Option<Pose> {
    let n = normalized.len() as f64;
    let image_centroid = normalized.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n;
    let image_spread = (normalized
        .iter()
        .map(|p| (p.coords - image_centroid).norm_squared())
        .sum::<f64>()
        / n)
        .sqrt();
    let object_spread = (object
        .iter()
        .map(|p| {
            let d = p.coords - spread.centroid;
            d.x * d.x + d.y * d.y
        })
        .sum::<f64>()
        / n)
        .sqrt();

    if image_spread <= EPSILON || object_spread <= EPSILON {
        return None;
    }

    let depth = object_spread / image_spread;
    let translation = Vector3::new(image_centroid.x * depth, image_centroid.y * depth, depth) - rotation * spread.centroid;
    Some(Pose { rotation, translation })
}

/// Normalized DLT homography mapping `src` onto `dst`
fn homography(src: &[Point2<f64>], dst: &[Point2<f64>]) -> Option<Matrix3<f64>> {
    let t_src = normalization_2d(src)?;
    let t_dst = normalization_2d(dst)?;

    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 9);
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let s = t_src * s.to_homogeneous();
        let d = t_dst * d.to_homogeneous();
        let (x, y) = (s.x, s.y);
        let (u, v) = (d.x, d.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        a[(r0, 8)] = -u;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        a[(r1, 8)] = -v;
    }

    let (h, conditioning) = null_vector(a)?;
    if conditioning < RANK_THRESHOLD {
        log::debug!("Homography system is rank deficient");
        return None;
    }

    let h_norm = Matrix3::from_row_slice(h.as_slice());
    Some(t_dst.try_inverse()? * h_norm * t_src)
}

/// Similarity transform moving the centroid to the origin at mean distance √2
fn normalization_2d(points: &[Point2<f64>]) -> Option<Matrix3<f64>> {
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n;
    let mean_dist = points.iter().map(|p| (p.coords - centroid).norm()).sum::<f64>() / n;
    if mean_dist <= EPSILON {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Some(Matrix3::new(
        s,
        0.0,
        -s * centroid.x,
        0.0,
        s,
        -s * centroid.y,
        0.0,
        0.0,
        1.0,
    ))
}

/// Right singular vector of the smallest singular value of `a`, together with
/// the ratio of the second-smallest to the largest singular value.
fn null_vector(a: DMatrix<f64>) -> Option<(DVector<f64>, f64)> {
    let cols = a.ncols();
    // Pad with zero rows so the decomposition yields a full V
    let a = if a.nrows() < cols {
        a.resize_vertically(cols, 0.0)
    } else {
        a
    };

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let values = &svd.singular_values;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    let (smallest, second, largest) = (order[0], order[1], order[order.len() - 1]);
    if values[largest] <= EPSILON {
        return None;
    }

    Some((v_t.row(smallest).transpose(), values[second] / values[largest]))
}

/// Closest rotation matrix in the Frobenius sense
fn nearest_rotation(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fixed = u;
        u_fixed.column_mut(2).neg_mut();
        r = u_fixed * v_t;
    }
    Some(r)
}

/// Sum of squared pixel residuals, or `None` if a point is not in front of the camera
fn reprojection_cost(object: &[Point3<f64>], image: &[Point2<f64>], camera: &CameraModel, pose: &Pose) -> Option<f64> {
    let mut cost = 0.0;
    for (p, observed) in object.iter().zip(image) {
        let p_cam = pose.transform(p);
        if p_cam.z <= MIN_DEPTH {
            return None;
        }
        cost += (camera.project(&Point3::from(p_cam)) - observed).norm_squared();
    }
    Some(cost)
}

/// Gauss-Newton normal equations `(JᵀJ, Jᵀr)` at `pose`
fn normal_equations(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraModel,
    pose: &Pose,
) -> Option<(Matrix6<f64>, Vector6<f64>)> {
    let f = camera.focal_length();
    let mut jtj = Matrix6::zeros();
    let mut jtr = Vector6::zeros();

    for (p, observed) in object.iter().zip(image) {
        let rotated = pose.rotation * p.coords;
        let p_cam = rotated + pose.translation;
        if p_cam.z <= MIN_DEPTH {
            return None;
        }

        let z_inv = 1.0 / p_cam.z;
        let z_inv_sq = z_inv * z_inv;
        let residual = camera.project(&Point3::from(p_cam)) - observed;

        // d(pixel)/d(p_cam)
        let d_proj = Matrix2x3::new(
            f * z_inv,
            0.0,
            -f * p_cam.x * z_inv_sq,
            0.0,
            f * z_inv,
            -f * p_cam.y * z_inv_sq,
        );

        // d(p_cam)/d(ω, t) for p_cam = exp(ω) R p + t
        let mut d_point = SMatrix::<f64, 3, 6>::zeros();
        d_point.fixed_view_mut::<3, 3>(0, 0).copy_from(&(-skew(&rotated)));
        d_point.fixed_view_mut::<3, 3>(0, 3).copy_from(&Matrix3::identity());

        let j = d_proj * d_point;
        jtj += j.transpose() * j;
        jtr += j.transpose() * residual;
    }

    Some((jtj, jtr))
}

/// Result of one Levenberg-Marquardt run
struct Refined {
    pose: Pose,
    /// Sum of squared pixel residuals at `pose`
    cost: f64,
    iterations: usize,
}

/// Levenberg-Marquardt refinement from `initial`
fn refine(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraModel,
    initial: Pose,
    settings: &SolverSettings,
) -> Option<Refined> {
    let mut pose = initial;
    let mut cost = reprojection_cost(object, image, camera, &pose)?;
    let mut lambda = INITIAL_DAMPING;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        iterations += 1;

        let (jtj, jtr) = normal_equations(object, image, camera, &pose)?;
        if jtr.norm() <= settings.tolerance {
            break;
        }

        let mut step = None;
        for _ in 0..MAX_DAMPING_ATTEMPTS {
            let mut damped = jtj;
            for i in 0..6 {
                damped[(i, i)] += lambda * jtj[(i, i)].max(EPSILON);
            }

            let Some(delta) = damped.lu().solve(&(-jtr)) else {
                lambda *= 10.0;
                continue;
            };

            let candidate = pose.apply_update(&delta);
            match reprojection_cost(object, image, camera, &candidate) {
                Some(candidate_cost) if candidate_cost < cost => {
                    step = Some((candidate, candidate_cost, delta.norm()));
                    lambda = (lambda * 0.1).max(EPSILON);
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        let Some((candidate, candidate_cost, step_norm)) = step else {
            break;
        };
        pose = candidate;
        cost = candidate_cost;

        if step_norm <= settings.tolerance {
            break;
        }
    }

    Some(Refined { pose, cost, iterations })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground_truth() -> PoseSolution {
        PoseSolution::new(Vector3::new(0.15, -0.25, 0.05), Vector3::new(0.5, -0.3, 40.0))
    }

    fn face_like_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, -0.5, 7.0),
            Point3::new(-4.5, -3.5, 3.0),
            Point3::new(4.5, -3.5, 3.0),
            Point3::new(-2.8, 3.2, 4.0),
            Point3::new(2.8, 3.2, 4.0),
            Point3::new(0.0, 7.5, 4.5),
            Point3::new(0.0, -4.0, 5.5),
            Point3::new(0.0, 4.2, 5.0),
            Point3::new(-5.0, 0.5, 2.5),
            Point3::new(5.0, 0.5, 2.5),
            Point3::new(-7.5, -1.0, -3.0),
            Point3::new(7.5, -1.0, -3.0),
        ]
    }

    fn project_all(points: &[Point3<f64>], pose: &PoseSolution, camera: &CameraModel) -> Vec<Point2<f64>> {
        points.iter().map(|p| camera.project(&pose.transform_point(p))).collect()
    }

    fn max_reprojection_error(solution: &PoseSolution, object: &[Point3<f64>], image: &[Point2<f64>], camera: &CameraModel) -> f64 {
        project_all(object, solution, camera)
            .iter()
            .zip(image)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_recovers_non_planar_pose() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object = face_like_points();
        let truth = ground_truth();
        let image = project_all(&object, &truth, &camera);

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();

        assert!(solution.success);
        assert!((solution.rotation - truth.rotation).norm() < 1e-6);
        assert!((solution.translation - truth.translation).norm() < 1e-5);
        assert!(max_reprojection_error(&solution, &object, &image, &camera) < 1e-6);
    }

    #[test]
    fn test_recovers_planar_pose() {
        let camera = CameraModel::from_frame_size(800, 600);
        let object = vec![
            Point3::new(-3.0, -3.0, 0.0),
            Point3::new(3.0, -3.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(-3.0, 3.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let truth = ground_truth();
        let image = project_all(&object, &truth, &camera);

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();

        assert!(solution.success);
        assert!(max_reprojection_error(&solution, &object, &image, &camera) < 1e-6);
        assert!((solution.translation - truth.translation).norm() < 1e-5);
    }

    #[test]
    fn test_small_non_planar_set_converges() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object: Vec<Point3<f64>> = face_like_points().into_iter().take(5).collect();
        let truth = PoseSolution::new(Vector3::new(0.05, 0.1, -0.05), Vector3::new(0.2, 0.1, 35.0));
        let image = project_all(&object, &truth, &camera);

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();

        assert!(solution.success);
        assert!(max_reprojection_error(&solution, &object, &image, &camera) < 1e-4);
    }

    #[test]
    fn test_four_points_success_implies_small_residual() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object: Vec<Point3<f64>> = face_like_points().into_iter().take(4).collect();
        let solver = IterativePnp::default();

        for &rx in &[-0.6, -0.3, 0.0, 0.3, 0.6] {
            for &ry in &[-0.6, -0.3, 0.0, 0.3, 0.6] {
                let truth = PoseSolution::new(Vector3::new(rx, ry, 0.1), Vector3::new(1.0, 1.0, 50.0));
                let image = project_all(&object, &truth, &camera);

                let solution = solver.solve(&object, &image, &camera).unwrap();
                if solution.success {
                    let max_error = max_reprojection_error(&solution, &object, &image, &camera);
                    // Four residuals with RMS r cannot exceed 2r individually
                    assert!(
                        max_error <= 2.0 * MAX_RMS_REPROJECTION_PX + 1e-9,
                        "pose ({rx}, {ry}) reported success at {max_error}px"
                    );
                }
            }
        }
    }

    #[test]
    fn test_three_points_fail_softly() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object: Vec<Point3<f64>> = face_like_points().into_iter().take(3).collect();
        let image = project_all(&object, &ground_truth(), &camera);

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();
        assert!(!solution.success);
    }

    #[test]
    fn test_collinear_points_fail_softly() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object: Vec<Point3<f64>> = (0..6).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
        let image = project_all(&object, &ground_truth(), &camera);

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();
        assert!(!solution.success);
    }

    #[test]
    fn test_coincident_image_points_fail_softly() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object = face_like_points();
        let image = vec![Point2::new(320.0, 240.0); object.len()];

        let solution = IterativePnp::default().solve(&object, &image, &camera).unwrap();
        assert!(!solution.success);
    }

    #[test]
    fn test_mismatched_lengths_are_an_error() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object = face_like_points();
        let image = vec![Point2::new(0.0, 0.0); 4];
        assert!(matches!(
            IterativePnp::default().solve(&object, &image, &camera),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_solve_is_deterministic() {
        let camera = CameraModel::from_frame_size(640, 480);
        let object = face_like_points();
        let image = project_all(&object, &ground_truth(), &camera);
        let solver = IterativePnp::default();

        let first = solver.solve(&object, &image, &camera).unwrap();
        let second = solver.solve(&object, &image, &camera).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nearest_rotation_is_orthonormal() {
        let m = Matrix3::new(1.1, 0.1, 0.0, -0.05, 0.9, 0.2, 0.0, -0.1, 1.2);
        let r = nearest_rotation(&m).unwrap();
        assert!((r * r.transpose() - Matrix3::identity()).norm() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
    }
}
