use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Error;
use ndarray::Array2;
use opencv::core::{Mat, MatTraitConst};
use tracing::{debug, warn};

use crate::config::config::LipRenderConfig;
use crate::helper::lip_helper::LipHelper;
use crate::modules::face_mesh_client::FaceMeshClient;
use crate::modules::lip_compositor::LipCompositor;
use crate::utils::color::LipColor;
use crate::utils::image::decode_image;

/// Monotonic stamp of the most recent try-on input. The pipeline advances
/// it at the start of every run; the host may also advance it when the
/// user picks a new photo or shade, which makes any run still in flight
/// come back as `Superseded` instead of committing stale pixels.
#[derive(Debug, Clone, Default)]
pub struct InputGeneration(Arc<AtomicU64>);

impl InputGeneration {
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clears the processing flag on every exit path, so an aborted run never
/// leaves the spinner stuck.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        BusyGuard { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The rendered try-on image plus how many faces were painted. Zero faces
/// means the photo passed through unmodified.
#[derive(Debug, Clone)]
pub struct TryOnResult {
    pub image: Mat,
    pub faces_rendered: usize,
}

/// Outcome of one try-on run.
#[derive(Debug, Clone)]
pub enum TryOnOutcome {
    Rendered(TryOnResult),
    /// A newer input generation was observed while this run was in
    /// flight; its pixels were dropped without rendering.
    Superseded,
}

#[derive(Debug)]
pub struct LipstickPipeline<C: FaceMeshClient> {
    face_mesh: C,
    lip_helper: LipHelper,
    compositor: LipCompositor,
    debug_contours: bool,
    generation: InputGeneration,
    busy: AtomicBool,
}

impl<C: FaceMeshClient> LipstickPipeline<C> {
    /// new initializes a new instance of the pipeline.
    ///
    /// # Arguments
    /// * `face_mesh_client` - landmark provider for the source photo
    /// * `lip_helper_client` - landmark selector, usually the stock topology
    /// * `config` - rendering options
    pub fn new(face_mesh_client: C, lip_helper_client: LipHelper, config: LipRenderConfig) -> Self {
        LipstickPipeline {
            face_mesh: face_mesh_client,
            lip_helper: lip_helper_client,
            compositor: LipCompositor::new(config.clone()),
            debug_contours: config.debug_contours,
            generation: InputGeneration::default(),
            busy: AtomicBool::new(false),
        }
    }

    /// input_generation returns a shared handle to the input stamp, for
    /// hosts that want to invalidate in-flight runs on new user input.
    pub fn input_generation(&self) -> InputGeneration {
        self.generation.clone()
    }

    /// is_busy reports whether a try-on run is currently in flight, for
    /// UI spinner state.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// apply_lip_color decodes the source photo, detects face landmarks
    /// and paints the requested shade onto every detected lip region.
    ///
    /// The shade is validated before any other work, an undecodable photo
    /// aborts before masking, and a run that loses the input-recency race
    /// returns `TryOnOutcome::Superseded` without producing pixels.
    ///
    /// # Arguments
    /// * `im_bytes` - encoded source photo
    /// * `color` - requested lip shade
    ///
    /// # Returns
    /// * `Result<TryOnOutcome, Error>`
    pub async fn apply_lip_color(
        &self,
        im_bytes: &[u8],
        color: &LipColor,
    ) -> Result<TryOnOutcome, Error> {
        color.rgb()?;

        let img = decode_image(im_bytes)?;
        self.apply_to_image(img, color).await
    }

    /// apply_to_image runs the try-on against an already decoded RGB
    /// matrix, consuming and returning it.
    ///
    /// # Arguments
    /// * `img` - decoded RGB matrix
    /// * `color` - requested lip shade
    ///
    /// # Returns
    /// * `Result<TryOnOutcome, Error>`
    pub async fn apply_to_image(&self, mut img: Mat, color: &LipColor) -> Result<TryOnOutcome, Error> {
        color.rgb()?;

        let generation = self.generation.advance();
        let _busy = BusyGuard::hold(&self.busy);

        let landmark_sets = self.face_mesh.detect(&img).await?;
        if self.generation.current() != generation {
            warn!(generation, "dropping stale try-on run");
            return Ok(TryOnOutcome::Superseded);
        }

        debug!(faces = landmark_sets.len(), "face mesh inference complete");

        let mut faces_rendered: usize = 0;
        for landmarks in &landmark_sets {
            self.render_landmark_set(&mut img, landmarks, color)?;
            faces_rendered += 1;
        }

        Ok(TryOnOutcome::Rendered(TryOnResult {
            image: img,
            faces_rendered,
        }))
    }

    /// render_landmark_set paints the lip region of a single face in
    /// place: select the contours, rasterize the ring mask, derive the
    /// gradient, blend. Every fallible step runs before the first pixel
    /// write, so a failed run leaves the image exactly as it was.
    ///
    /// # Arguments
    /// * `img` - decoded RGB matrix, mutated in place
    /// * `landmarks` - `(n, 2|3)` normalized landmark set for one face
    /// * `color` - requested lip shade
    ///
    /// # Returns
    /// * `Result<(), Error>`
    pub fn render_landmark_set(
        &self,
        img: &mut Mat,
        landmarks: &Array2<f32>,
        color: &LipColor,
    ) -> Result<(), Error> {
        let (outer, inner) = self.lip_helper.select_lip_contours(landmarks)?;

        let width = img.cols();
        let height = img.rows();
        let outer_px = LipHelper::denormalize_contour(&outer, width, height);
        let inner_px = LipHelper::denormalize_contour(&inner, width, height);

        let (top_y, bottom_y) = match LipHelper::vertical_span(&outer_px) {
            None => {
                debug!("empty outer contour, nothing to paint");
                return Ok(());
            }
            Some(span) => span,
        };

        let mask = self.compositor.build_lip_mask(height, width, &outer_px, &inner_px)?;
        let gradient = self.compositor.build_gradient(color, top_y, bottom_y)?;
        self.compositor.composite(img, &mask, &gradient)?;

        if self.debug_contours {
            self.compositor.stroke_contours(img, &outer_px, &inner_px)?;
        }

        Ok(())
    }
}
