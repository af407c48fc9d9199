mod raw;
mod still;

pub use raw::RawStreamSource;
pub use still::{ImageSequenceSource, StillImageSource};

use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

/// Trait for frame sources
pub trait CaptureSource {
    /// Capture the next frame, `None` once the source is exhausted
    fn capture_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

/// Why a source could not deliver frames
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("input unavailable: {path}")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no image files found in {0}")]
    EmptySequence(PathBuf),

    #[error("frame is {found:?} but the session is {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("frame size must be non-zero, got {0}x{1}")]
    ZeroSized(u32, u32),

    #[error("stream ended mid-frame: got {got} of {expected} bytes")]
    Truncated { expected: usize, got: usize },
}
