//! Benchmarks for pose estimation and rotation conversions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use face_pnp::{
    camera::CameraModel,
    canonical_model::CanonicalModel,
    constants::DEFAULT_LANDMARK_INDICES,
    pnp::{IterativePnp, PnpSolver, PoseSolution},
    rotation::{roll_pitch_yaw_from_matrix, rotation_matrix_from_vector},
    PoseEstimator,
};
use nalgebra::{Point3, Vector3};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn face_vertices() -> Vec<Point3<f64>> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..468)
        .map(|i| {
            let y = 1.0 - 2.0 * (f64::from(i) + 0.5) / 468.0;
            let radius = (1.0 - y * y).sqrt();
            let phi = golden_angle * f64::from(i);
            Point3::new(7.0 * radius * phi.cos(), 9.0 * y, 4.0 * (radius * phi.sin()).abs())
        })
        .collect()
}

fn normalized_landmarks(vertices: &[Point3<f64>], pose: &PoseSolution) -> Vec<(f64, f64)> {
    let camera = CameraModel::from_frame_size(WIDTH, HEIGHT);
    vertices
        .iter()
        .map(|v| {
            let pixel = camera.project(&pose.transform_point(v));
            (pixel.x / f64::from(WIDTH), pixel.y / f64::from(HEIGHT))
        })
        .collect()
}

fn benchmark_pose_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_estimation");

    let vertices = face_vertices();
    let pose = PoseSolution::new(Vector3::new(0.15, -0.25, 0.1), Vector3::new(1.5, -2.0, 60.0));
    let landmarks = normalized_landmarks(&vertices, &pose);

    let model = CanonicalModel::from_points(vertices.clone()).expect("Failed to build model");
    let mut estimator = PoseEstimator::from_model(model, WIDTH, HEIGHT, DEFAULT_LANDMARK_INDICES.to_vec())
        .expect("Failed to create pose estimator");
    estimator
        .set_landmarks_2d(&landmarks, WIDTH, HEIGHT)
        .expect("Failed to set landmarks");

    group.bench_function("set_landmarks_468", |b| {
        let mut estimator = estimator.clone();
        b.iter(|| {
            estimator
                .set_landmarks_2d(black_box(&landmarks), WIDTH, HEIGHT)
                .expect("Failed to set landmarks");
        });
    });

    group.bench_function("solve_pose_default_indices", |b| {
        b.iter(|| {
            let solution = estimator.solve_pose().expect("Pose estimation failed");
            black_box(solution);
        });
    });

    group.bench_function("estimate_default_indices", |b| {
        b.iter(|| {
            let estimate = estimator.estimate().expect("Pose estimation failed");
            black_box(estimate);
        });
    });

    group.finish();
}

fn benchmark_solver_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterative_pnp");

    let vertices = face_vertices();
    let pose = PoseSolution::new(Vector3::new(0.1, 0.2, -0.05), Vector3::new(0.0, 1.0, 55.0));
    let camera = CameraModel::from_frame_size(WIDTH, HEIGHT);
    let solver = IterativePnp::default();

    for count in [6_usize, 12, 50, 200, 468] {
        let step = vertices.len() / count;
        let object: Vec<Point3<f64>> = vertices.iter().step_by(step).take(count).copied().collect();
        let image: Vec<_> = object.iter().map(|p| camera.project(&pose.transform_point(p))).collect();

        group.bench_with_input(BenchmarkId::new("solve", count), &count, |b, _| {
            b.iter(|| {
                let solution = solver
                    .solve(black_box(&object), black_box(&image), &camera)
                    .expect("Solve failed");
                black_box(solution);
            });
        });
    }

    group.finish();
}

fn benchmark_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotation");

    let rotation_vector = Vector3::new(0.1, -0.4, 0.25);
    let rotation_matrix = rotation_matrix_from_vector(&rotation_vector);

    group.bench_function("rodrigues", |b| {
        b.iter(|| black_box(rotation_matrix_from_vector(black_box(&rotation_vector))));
    });

    group.bench_function("roll_pitch_yaw", |b| {
        b.iter(|| black_box(roll_pitch_yaw_from_matrix(black_box(&rotation_matrix))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_pose_estimation, benchmark_solver_scaling, benchmark_rotation);
criterion_main!(benches);
