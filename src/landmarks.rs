//! Per-frame 2D facial landmarks.

use crate::{Error, Result};
use nalgebra::Point2;

/// Pixel-space 2D landmarks for one frame, indexed by detector order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLandmarks2D {
    points: Vec<Point2<f64>>,
}

impl FrameLandmarks2D {
    /// Rescale normalized `[0,1]²` landmarks to pixel coordinates.
    ///
    /// Point `i` of the input becomes landmark index `i`. No range or count
    /// checks happen here; out-of-range values are scaled as given.
    #[must_use]
    pub fn from_normalized(landmarks: &[(f64, f64)], width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let points = landmarks.iter().map(|&(x, y)| Point2::new(x * w, y * h)).collect();
        Self { points }
    }

    /// Landmark at an index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point2<f64>> {
        self.points.get(index)
    }

    /// Number of landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no landmarks were ingested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All landmarks in index order
    #[must_use]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Parse normalized landmarks from text.
    ///
    /// One landmark per line as `x y` or `x y z`, separated by whitespace or
    /// commas. A trailing `z` (detector depth) is ignored. Blank lines and
    /// lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a line has fewer than two values or
    /// a value is not a number
    pub fn parse_normalized(content: &str) -> Result<Vec<(f64, f64)>> {
        let mut landmarks = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::InvalidInput(format!("Landmark line {}: {e}", line_no + 1)))?;

            match values.as_slice() {
                [x, y] | [x, y, _] => landmarks.push((*x, *y)),
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "Landmark line {}: expected 2 or 3 values, got {}",
                        line_no + 1,
                        values.len()
                    )))
                }
            }
        }

        Ok(landmarks)
    }
}
