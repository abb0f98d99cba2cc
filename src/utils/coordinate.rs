use anyhow::Error;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A single face-mesh point with coordinates normalized to `[0, 1]`
/// relative to image width/height. `z` carries relative depth and is
/// ignored by the lip renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// Per-image face mesh result, one entry per detected face. The field
/// naming mirrors the JSON the mesh model emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMeshResult {
    pub multi_face_landmarks: Vec<Vec<NormalizedLandmark>>,
}

impl FaceMeshResult {
    /// to_landmark_sets converts every detected face into an `(n, 3)`
    /// landmark array.
    ///
    /// # Returns
    /// * `Result<Vec<Array2<f32>>, Error>`
    pub fn to_landmark_sets(&self) -> Result<Vec<Array2<f32>>, Error> {
        let mut sets: Vec<Array2<f32>> = Vec::with_capacity(self.multi_face_landmarks.len());
        for landmarks in &self.multi_face_landmarks {
            sets.push(convert_landmarks_to_ndarray(landmarks)?);
        }
        Ok(sets)
    }
}

/// convert_landmarks_to_ndarray flattens a landmark list into an `(n, 3)`
/// float array, the layout the selector indexes into.
///
/// # Arguments
/// * `landmarks` - ordered mesh points for one face
///
/// # Returns
/// * `Result<Array2<f32>, Error>`
pub fn convert_landmarks_to_ndarray(landmarks: &[NormalizedLandmark]) -> Result<Array2<f32>, Error> {
    let nrows = landmarks.len();
    let ncols = 3;

    let mut result: Vec<f32> = Vec::with_capacity(nrows * ncols);
    for landmark in landmarks {
        result.extend_from_slice(&[landmark.x, landmark.y, landmark.z]);
    }

    let arr = match Array2::from_shape_vec((nrows, ncols), result) {
        Ok(arr) => arr,
        Err(e) => return Err(Error::from(e)),
    };

    Ok(arr)
}
