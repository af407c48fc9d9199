use super::engine::FALLBACK_ALPHA;
use crate::color::{to_device, to_device_channel};
use image::{GrayImage, Luma, RgbImage};

/// Alpha matte: 0.0 = background, 1.0 = foreground
///
/// Row-major, same dimensions as the frame it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Matte {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Matte {
    pub(crate) fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mean alpha over the frame, 1.0 when every pixel is kept
    pub fn coverage(&self) -> f32 {
        let data = self.as_slice();
        if data.is_empty() {
            return 0.0;
        }
        data.iter().sum::<f32>() / data.len() as f32
    }

    /// One-channel mask for writing alongside the keyed frame
    pub fn to_gray(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            Luma([to_device_channel(self.get(x, y).unwrap_or(FALLBACK_ALPHA))])
        })
    }

    /// Convert matte to grayscale RGB image for visualization
    pub fn to_rgb(&self) -> RgbImage {
        let (width, height) = self.dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb(to_device([self.get(x, y).unwrap_or(FALLBACK_ALPHA); 3]))
        })
    }
}
