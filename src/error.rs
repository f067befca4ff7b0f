//! Crate-level error type.
//!
//! Every codec and render operation is a deterministic transform, so none of
//! these are retryable; callers decide whether to skip the item or abort.

use thiserror::Error;

use crate::color::ColorError;
use crate::payload::PayloadError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Zero-size, unreadable, or otherwise unusable image input
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// More palette entries than an operation can address
    #[error("palette has {colors} colors, limit is {limit}")]
    PaletteOverflow { colors: usize, limit: usize },

    /// Animated input frames of different dimensions
    #[error("frame {index} is {found:?}, expected {expected:?}")]
    FrameSizeMismatch { index: usize, expected: (u32, u32), found: (u32, u32) },

    /// Malformed packed payload or run model data
    #[error("payload parse error: {0}")]
    PayloadParse(#[from] PayloadError),

    /// Palette override does not match the model palette one-for-one
    #[error("palette override has {found} colors, model palette has {expected}")]
    PaletteSizeMismatch { expected: usize, found: usize },

    /// A stacked layer differs in size from the first layer
    #[error("layer '{name}' is {found:?}, expected {expected:?}")]
    LayerSizeMismatch { name: String, expected: (u32, u32), found: (u32, u32) },

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }
}

impl From<crate::output::OutputError> for Error {
    fn from(e: crate::output::OutputError) -> Self {
        match e {
            crate::output::OutputError::Io(e) => Error::Io(e),
            crate::output::OutputError::Image(e) => Error::Image(e),
        }
    }
}
