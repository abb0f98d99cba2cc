use anyhow::Error;
use nalgebra::Point2;
use ndarray::Array2;

use crate::error::LipstickError;

/// Number of points in the face mesh topology the index tables below are
/// written against.
pub const NUM_MESH_LANDMARKS: usize = 468;

/// Mesh indices tracing the outside of the lips as a closed loop.
pub const OUTER_LIP_INDICES: [usize; 40] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 308, 324, 318, 402, 317, 14, 87, 178, 88,
    95, 185, 40, 39, 37, 0, 267, 269, 270, 409, 415, 310, 311, 312, 13, 82, 81, 42, 183, 78,
];

/// Mesh indices tracing the inner mouth opening, closed (first == last).
pub const INNER_LIP_INDICES: [usize; 21] = [
    78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308, 324, 318, 402, 317, 14, 87, 178, 88, 95, 78,
];

#[derive(Debug, Clone)]
pub struct LipHelper {
    outer_indices: Vec<usize>,
    inner_indices: Vec<usize>,
}

impl LipHelper {
    /// new initializes a new instance of the lip helper module.
    ///
    /// # Arguments
    /// * `in_outer_indices` - Option<Vec<usize>> overriding the outer lip topology
    /// * `in_inner_indices` - Option<Vec<usize>> overriding the inner mouth topology
    pub fn new(in_outer_indices: Option<Vec<usize>>, in_inner_indices: Option<Vec<usize>>) -> Self {
        let mut outer_indices: Vec<usize> = OUTER_LIP_INDICES.to_vec();
        if let Some(_in_outer_indices) = in_outer_indices {
            outer_indices = _in_outer_indices;
        }

        let mut inner_indices: Vec<usize> = INNER_LIP_INDICES.to_vec();
        if let Some(_in_inner_indices) = in_inner_indices {
            inner_indices = _in_inner_indices;
        }

        LipHelper {
            outer_indices,
            inner_indices,
        }
    }

    /// select_lip_contours picks the outer and inner lip contours out of a
    /// full landmark set by the fixed topology tables.
    ///
    /// Fails with `LipstickError::IndexOutOfRange` when the landmark set is
    /// shorter than an index table expects, which indicates the landmark
    /// model and this topology disagree and must not be ignored.
    ///
    /// # Arguments
    /// * `landmarks` - `(n, 2)` or `(n, 3)` array of normalized landmarks
    ///
    /// # Returns
    /// * `Result<(Array2<f32>, Array2<f32>), Error>` - (outer, inner), each `(k, 2)`
    pub fn select_lip_contours(
        &self,
        landmarks: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), Error> {
        let outer = gather_contour(landmarks, &self.outer_indices)?;
        let inner = gather_contour(landmarks, &self.inner_indices)?;
        Ok((outer, inner))
    }

    /// denormalize_contour maps a normalized contour into pixel space.
    ///
    /// # Arguments
    /// * `contour` - `(k, 2)` array of normalized points
    /// * `width` - image width in pixels
    /// * `height` - image height in pixels
    ///
    /// # Returns
    /// * `Vec<Point2<f32>>`
    pub fn denormalize_contour(contour: &Array2<f32>, width: i32, height: i32) -> Vec<Point2<f32>> {
        let mut points: Vec<Point2<f32>> = Vec::with_capacity(contour.nrows());
        for row in contour.rows() {
            points.push(Point2::new(row[0] * width as f32, row[1] * height as f32));
        }
        points
    }

    /// vertical_span returns the min and max y over a pixel-space contour,
    /// the vertical extent the gradient is stretched across.
    pub fn vertical_span(points: &[Point2<f32>]) -> Option<(f32, f32)> {
        if points.is_empty() {
            return None;
        }

        let mut top_y = f32::INFINITY;
        let mut bottom_y = f32::NEG_INFINITY;
        for point in points {
            top_y = top_y.min(point.y);
            bottom_y = bottom_y.max(point.y);
        }
        Some((top_y, bottom_y))
    }

    /// contour_area computes the absolute shoelace area of a closed
    /// polygon in px^2. A collapsed contour (closed mouth) comes out near
    /// zero.
    pub fn contour_area(points: &[Point2<f32>]) -> f32 {
        if points.len() < 3 {
            return 0.0;
        }

        let mut doubled_area = 0.0f32;
        for i in 0..points.len() {
            let a = &points[i];
            let b = &points[(i + 1) % points.len()];
            doubled_area += a.coords.perp(&b.coords);
        }
        doubled_area.abs() / 2.0
    }
}

fn gather_contour(landmarks: &Array2<f32>, indices: &[usize]) -> Result<Array2<f32>, Error> {
    let len = landmarks.nrows();

    let mut result: Vec<f32> = Vec::with_capacity(indices.len() * 2);
    for &index in indices {
        if index >= len {
            return Err(Error::from(LipstickError::IndexOutOfRange { index, len }));
        }
        result.extend_from_slice(&[landmarks[[index, 0]], landmarks[[index, 1]]]);
    }

    let contour = match Array2::from_shape_vec((indices.len(), 2), result) {
        Ok(contour) => contour,
        Err(e) => return Err(Error::from(e)),
    };

    Ok(contour)
}
