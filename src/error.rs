//! Error types for the lipstick rendering pipeline

use thiserror::Error;

/// Failures the compositing engine can surface to its caller.
///
/// Zero detected faces is deliberately not represented here: an empty
/// detection result is a successful no-op run, not an error.
#[derive(Error, Debug)]
pub enum LipstickError {
    /// A lip topology index does not exist in the supplied landmark set,
    /// which means the landmark model and the index tables disagree.
    #[error("lip landmark index {index} is out of range for a {len}-point face mesh")]
    IndexOutOfRange { index: usize, len: usize },

    /// The color string is not of the form `#RRGGBB`.
    #[error("invalid lip color {0:?}, expected a #RRGGBB hex string")]
    InvalidColor(String),

    /// The source image bytes did not decode to a raster with known
    /// dimensions.
    #[error("failed to decode source image: {0}")]
    DecodeFailure(String),
}
