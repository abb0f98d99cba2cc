use std::io::Cursor;

use anyhow::Error;
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use opencv::core::Mat;

use crate::config::config::FaceMeshConfig;
use crate::utils::coordinate::FaceMeshResult;

/// Seam to the external face-mesh inference service.
///
/// An implementation returns zero or more landmark sets for one image,
/// each an `(n, 2|3)` array of normalized coordinates in a fixed topology
/// understood by the lip index tables. Zero results means no face was
/// detected and the pipeline leaves the image untouched.
#[allow(async_fn_in_trait)]
pub trait FaceMeshClient: Send + Sync {
    async fn detect(&self, img: &Mat) -> Result<Vec<Array2<f32>>, Error>;
}

/// A mesh client that replays landmark sets supplied up front, for tests
/// and for hosts that run inference elsewhere and only want the renderer.
#[derive(Debug, Clone, Default)]
pub struct StaticFaceMeshClient {
    landmark_sets: Vec<Array2<f32>>,
}

impl StaticFaceMeshClient {
    /// new initializes a new instance of the static mesh client, keeping
    /// at most `max_num_faces` landmark sets like the live model options
    /// would.
    ///
    /// # Arguments
    /// * `landmark_sets` - one `(n, 2|3)` array per detected face
    /// * `config` - mesh options
    pub fn new(mut landmark_sets: Vec<Array2<f32>>, config: FaceMeshConfig) -> Self {
        let max_num_faces = config.max_num_faces.max(0) as usize;
        landmark_sets.truncate(max_num_faces);

        StaticFaceMeshClient { landmark_sets }
    }

    /// from_mesh_result builds a client from a deserialized mesh result.
    ///
    /// # Arguments
    /// * `result` - per-image mesh result
    /// * `config` - mesh options
    ///
    /// # Returns
    /// * `Result<StaticFaceMeshClient, Error>`
    pub fn from_mesh_result(result: &FaceMeshResult, config: FaceMeshConfig) -> Result<Self, Error> {
        let landmark_sets = result.to_landmark_sets()?;
        Ok(Self::new(landmark_sets, config))
    }

    /// from_npy_bytes builds a single-face client from an `.npy` landmark
    /// dump, the interchange format the offline tooling emits.
    ///
    /// # Arguments
    /// * `npy_bytes` - serialized `(n, 2|3)` float32 array
    /// * `config` - mesh options
    ///
    /// # Returns
    /// * `Result<StaticFaceMeshClient, Error>`
    pub fn from_npy_bytes(npy_bytes: &[u8], config: FaceMeshConfig) -> Result<Self, Error> {
        let landmarks = Array2::<f32>::read_npy(Cursor::new(npy_bytes))?;
        Ok(Self::new(vec![landmarks], config))
    }
}

impl FaceMeshClient for StaticFaceMeshClient {
    async fn detect(&self, _img: &Mat) -> Result<Vec<Array2<f32>>, Error> {
        Ok(self.landmark_sets.clone())
    }
}
