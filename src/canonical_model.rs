//! Canonical 3D face model loading.
//!
//! The model is a plain-text vertex file in the Wavefront OBJ layout. Only
//! vertex lines (`v x y z`) contribute points; their order in the file
//! defines the landmark index, which must match the indexing used by the
//! upstream 2D landmark detector.

use crate::{Error, Result};
use nalgebra::Point3;
use std::fs;
use std::path::{Path, PathBuf};

/// Classification of a single line of a vertex file by its leading tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `v x y z [w]`
    Vertex,
    /// `vn x y z`
    Normal,
    /// `vt u v [w]`
    TextureCoord,
    /// `f a b c ...`
    Face,
    /// `# ...`
    Comment,
    /// Empty or whitespace-only line
    Blank,
    /// Any other tag (`o`, `g`, `s`, `usemtl`, ...)
    Other,
}

impl LineKind {
    /// Classify a line by its first whitespace-separated token
    #[must_use]
    pub fn classify(line: &str) -> Self {
        match line.split_whitespace().next() {
            None => Self::Blank,
            Some("v") => Self::Vertex,
            Some("vn") => Self::Normal,
            Some("vt") => Self::TextureCoord,
            Some("f") => Self::Face,
            Some(tag) if tag.starts_with('#') => Self::Comment,
            Some(_) => Self::Other,
        }
    }
}

/// Immutable canonical 3D landmark set, indexed by file order
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalModel {
    vertices: Vec<Point3<f64>>,
}

impl CanonicalModel {
    /// Load the canonical model from a vertex file
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if:
    /// - The file is missing or unreadable
    /// - A vertex line has fewer than 3 numeric fields
    /// - The file contains no vertices
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading canonical face model: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = Self::parse_with_source(&content, path)?;

        log::debug!("Parsed {} canonical vertices", model.len());
        Ok(model)
    }

    /// Parse a canonical model held in memory
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] under the same conditions as [`CanonicalModel::load`]
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_with_source(content, Path::new("<memory>"))
    }

    /// Build a model from explicit points; index `i` is `points[i]`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if `points` is empty
    pub fn from_points(points: Vec<Point3<f64>>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::ModelLoad {
                path: PathBuf::from("<memory>"),
                reason: "model contains no vertices".to_string(),
            });
        }
        Ok(Self { vertices: points })
    }

    fn parse_with_source(content: &str, source: &Path) -> Result<Self> {
        let mut vertices = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            match LineKind::classify(line) {
                LineKind::Vertex => {
                    let vertex = parse_vertex(line).map_err(|reason| Error::ModelLoad {
                        path: source.to_path_buf(),
                        reason: format!("line {}: {reason}", line_no + 1),
                    })?;
                    vertices.push(vertex);
                }
                LineKind::Normal
                | LineKind::TextureCoord
                | LineKind::Face
                | LineKind::Comment
                | LineKind::Blank
                | LineKind::Other => {}
            }
        }

        if vertices.is_empty() {
            return Err(Error::ModelLoad {
                path: source.to_path_buf(),
                reason: "model contains no vertices".to_string(),
            });
        }

        Ok(Self { vertices })
    }

    /// Vertex at a landmark index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point3<f64>> {
        self.vertices.get(index)
    }

    /// Number of vertices
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the model has no vertices (never true for a loaded model)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertices in index order
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }
}

/// Parse the three coordinates of a `v` line
fn parse_vertex(line: &str) -> std::result::Result<Point3<f64>, String> {
    let mut coords = [0.0_f64; 3];
    let mut tokens = line.split_whitespace().skip(1);

    for (axis, slot) in coords.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| format!("expected 3 vertex coordinates, found {axis}"))?;
        *slot = token
            .trim_end_matches(['\r', '\n'])
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{token}': {e}"))?;
    }

    Ok(Point3::new(coords[0], coords[1], coords[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineKind::classify("v 1 2 3"), LineKind::Vertex);
        assert_eq!(LineKind::classify("vn 0 0 1"), LineKind::Normal);
        assert_eq!(LineKind::classify("vt 0.5 0.5"), LineKind::TextureCoord);
        assert_eq!(LineKind::classify("f 1/1 2/2 3/3"), LineKind::Face);
        assert_eq!(LineKind::classify("# comment"), LineKind::Comment);
        assert_eq!(LineKind::classify("#comment"), LineKind::Comment);
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
        assert_eq!(LineKind::classify("usemtl skin"), LineKind::Other);
    }

    #[test]
    fn test_parse_assigns_indices_in_file_order() {
        let content = "# header\nv 0.0 1.0 2.0\nvn 0 0 1\nv 3.0 4.0 5.0\nf 1 2 3\nv -1.5 2.5 -3.5\n";
        let model = CanonicalModel::parse(content).unwrap();

        assert_eq!(model.len(), 3);
        assert_eq!(model.get(0), Some(&Point3::new(0.0, 1.0, 2.0)));
        assert_eq!(model.get(1), Some(&Point3::new(3.0, 4.0, 5.0)));
        assert_eq!(model.get(2), Some(&Point3::new(-1.5, 2.5, -3.5)));
        assert_eq!(model.get(3), None);
    }

    #[test]
    fn test_parse_strips_line_terminators() {
        let model = CanonicalModel::parse("v 1.0 2.0 3.0\r\nv 4.0 5.0 6.0\r\n").unwrap();
        assert_eq!(model.get(1), Some(&Point3::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn test_parse_ignores_extra_tokens() {
        let model = CanonicalModel::parse("v 1.0 2.0 3.0 1.0").unwrap();
        assert_eq!(model.get(0), Some(&Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_parse_rejects_two_coordinates() {
        let err = CanonicalModel::parse("v 1.0 2.0 3.0\nv 1.0 2.0\n").unwrap_err();
        match err {
            Error::ModelLoad { reason, .. } => {
                assert!(reason.contains("line 2"), "unexpected reason: {reason}");
                assert!(reason.contains("found 2"), "unexpected reason: {reason}");
            }
            other => panic!("Expected ModelLoad, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            CanonicalModel::parse("v 1.0 abc 3.0"),
            Err(Error::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_model() {
        assert!(CanonicalModel::parse("").is_err());
        assert!(CanonicalModel::parse("vn 0 0 1\nf 1 2 3\n").is_err());
        assert!(CanonicalModel::from_points(Vec::new()).is_err());
    }
}
