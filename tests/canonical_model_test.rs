//! Tests for loading the canonical face model from disk


use face_pnp::{canonical_model::CanonicalModel, Error, PoseEstimator};
use nalgebra::Point3;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use test_helpers::*;

#[test]
fn test_vertex_order_defines_index() {
    let vertices = synthetic_face_vertices();
    let model_file = write_model_file(&vertices);

    let model = CanonicalModel::load(model_file.path()).unwrap();
    assert_eq!(model.len(), NUM_VERTICES);

    for index in [0, 1, 33, 263, 454, NUM_VERTICES - 1] {
        let loaded = model.get(index).unwrap();
        assert!((loaded - vertices[index]).norm() < 1e-8, "Vertex {index} moved");
    }
    assert!(model.get(NUM_VERTICES).is_none());
}

#[test]
fn test_non_vertex_lines_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# header").unwrap();
    writeln!(file, "mtllib face.mtl").unwrap();
    writeln!(file, "v 0.0 1.0 2.0").unwrap();
    writeln!(file, "vt 0.5 0.5").unwrap();
    writeln!(file, "vn 0.0 0.0 1.0").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "v 3.0 4.0 5.0 1.0").unwrap();
    writeln!(file, "f 1/1/1 2/1/1 1/1/1").unwrap();
    file.flush().unwrap();

    let model = CanonicalModel::load(file.path()).unwrap();
    assert_eq!(
        model.vertices(),
        &[Point3::new(0.0, 1.0, 2.0), Point3::new(3.0, 4.0, 5.0)]
    );
}

#[test]
fn test_short_vertex_line_names_file_and_line() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "v 0.0 1.0 2.0").unwrap();
    writeln!(file, "v 1.0 2.0").unwrap();
    file.flush().unwrap();

    match CanonicalModel::load(file.path()) {
        Err(Error::ModelLoad { path, reason }) => {
            assert_eq!(path, file.path());
            assert!(reason.contains("line 2"), "unexpected reason: {reason}");
        }
        other => panic!("Expected ModelLoad error, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("canonical_face_model.obj");

    assert!(matches!(CanonicalModel::load(&path), Err(Error::ModelLoad { .. })));
    assert!(matches!(
        PoseEstimator::new(&path, WIDTH, HEIGHT),
        Err(Error::ModelLoad { .. })
    ));
}

#[test]
fn test_file_without_vertices() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# only a comment").unwrap();
    writeln!(file, "vn 0.0 0.0 1.0").unwrap();
    file.flush().unwrap();

    let err = CanonicalModel::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("no vertices"));
}

#[test]
fn test_model_is_shared_between_clones() {
    let model_file = write_model_file(&synthetic_face_vertices());
    let estimator = PoseEstimator::new(model_file.path(), WIDTH, HEIGHT).unwrap();
    let clone = estimator.clone();

    assert!(std::ptr::eq(estimator.model(), clone.model()));
}
