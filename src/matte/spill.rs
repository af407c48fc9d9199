use crate::color::{rgb_to_hsv, DevicePixel};
use image::RgbImage;
use rayon::prelude::*;

/// Post-matte pass that lifts red and blue on pixels still carrying
/// backdrop green
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpillSuppression {
    /// Inclusive 8-bit hue band (degrees / 2) treated as backdrop spill
    pub hue_low: u8,
    pub hue_high: u8,
    /// Minimum saturation as a fraction of full scale
    pub min_saturation: f32,
    /// Minimum value as a fraction of full scale
    pub min_value: f32,
    /// Integer quotient `G^2 / (R * B)` above this selects the strong boost
    pub ratio_threshold: f32,
    pub strong_boost: f32,
    pub weak_boost: f32,
}

impl Default for SpillSuppression {
    fn default() -> Self {
        Self {
            hue_low: 35,
            hue_high: 130,
            min_saturation: 0.15,
            min_value: 0.15,
            ratio_threshold: 1.5,
            strong_boost: 1.7,
            weak_boost: 1.5,
        }
    }
}

impl SpillSuppression {
    /// Correct one RGB pixel, leaving it untouched outside the spill band
    pub fn suppress_pixel(&self, pixel: DevicePixel) -> DevicePixel {
        let [h, s, v] = rgb_to_hsv(pixel);
        let in_band = h >= self.hue_low
            && h <= self.hue_high
            && s as f32 >= self.min_saturation * 255.0
            && v as f32 >= self.min_value * 255.0;
        if !in_band {
            return pixel;
        }

        let [r, g, b] = pixel.map(u32::from);
        let rb = r * b;
        // Ratio is undefined with a zero channel, take the weak boost
        let boost = if rb != 0 && ((g * g) / rb) as f32 > self.ratio_threshold {
            self.strong_boost
        } else {
            self.weak_boost
        };

        [boost_channel(pixel[0], boost), pixel[1], boost_channel(pixel[2], boost)]
    }

    /// Apply to every pixel of `image`; returns how many were changed
    pub fn apply(&self, image: &mut RgbImage) -> usize {
        let _span = tracing::debug_span!("spill").entered();

        image
            .par_chunks_exact_mut(3)
            .map(|px| {
                let before = [px[0], px[1], px[2]];
                let after = self.suppress_pixel(before);
                px.copy_from_slice(&after);
                usize::from(after != before)
            })
            .sum()
    }
}

#[inline]
fn boost_channel(value: u8, boost: f32) -> u8 {
    (f32::from(value) * boost).clamp(0.0, 255.0) as u8
}
