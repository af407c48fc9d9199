mod morphology;
mod range;

pub use morphology::close;
pub use range::HsvRange;

use crate::color::rgb_to_hsv;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Mask value for pixels that pass
pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Coarse HSV-range masker
///
/// Marks backdrop-coloured pixels by thresholding in HSV space. Cheap enough
/// to run ahead of the full key model or to stand in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdMask {
    pub range: HsvRange,
    /// Dilate-then-erode the foreground mask to drop speckle
    pub morphology: bool,
}

impl ThresholdMask {
    pub fn new(range: HsvRange, morphology: bool) -> Self {
        Self { range, morphology }
    }

    /// `MASK_ON` where the pixel's HSV lies inside the range
    pub fn key_mask(&self, frame: &RgbImage) -> GrayImage {
        let _span = tracing::debug_span!("threshold_mask").entered();

        let (width, height) = frame.dimensions();
        let src = frame.as_raw();
        let mut mask = GrayImage::new(width, height);
        let w = width as usize;
        if w == 0 {
            return mask;
        }

        mask.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let src_row = &src[y * w * 3..(y + 1) * w * 3];
            for (out, px) in row.iter_mut().zip(src_row.chunks_exact(3)) {
                let hsv = rgb_to_hsv([px[0], px[1], px[2]]);
                *out = if self.range.contains(hsv) {
                    MASK_ON
                } else {
                    MASK_OFF
                };
            }
        });

        mask
    }

    /// `MASK_ON` where the pixel should be kept as foreground
    ///
    /// The inverse of [`key_mask`](Self::key_mask), cleaned up when
    /// `morphology` is set.
    pub fn foreground_mask(&self, frame: &RgbImage) -> GrayImage {
        let mut mask = self.key_mask(frame);
        invert(&mut mask);
        if self.morphology {
            let _span = tracing::debug_span!("morphology").entered();
            mask = close(&mask);
        }
        mask
    }
}

pub fn invert(mask: &mut GrayImage) {
    mask.par_iter_mut().for_each(|v| *v = u8::MAX - *v);
}
