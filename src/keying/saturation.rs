use super::error::KeyError;
use super::types::{KeyColor, MattingParameters};
use super::KeyModel;
use crate::color::Rgb;

/// Index of the dominant channel of `color`
///
/// Ties go to the lower index.
pub fn primary_channel(color: Rgb) -> usize {
    let [x, y, z] = color.map(f32::abs);
    if x >= y {
        if x >= z {
            0
        } else {
            2
        }
    } else if y >= z {
        1
    } else {
        2
    }
}

/// How far `pixel` leans towards its `primary` channel
///
/// The two remaining channels are ordered by index, not by value, and
/// `balance` weights the lower-indexed one.
pub fn saturation(pixel: Rgb, balance: f32, primary: usize) -> f32 {
    let other_1 = (primary + 1) % 3;
    let other_2 = (primary + 2) % 3;
    let min_channel = other_1.min(other_2);
    let max_channel = other_1.max(other_2);

    let blend = balance * pixel[min_channel] + (1.0 - balance) * pixel[max_channel];

    (pixel[primary] - blend) * (1.0 - blend).abs()
}

/// Screen-saturation keyer working directly on normalized RGB
#[derive(Debug, Clone)]
pub struct SaturationKey {
    balance: f32,
    primary: usize,
    screen_saturation: f32,
}

impl SaturationKey {
    pub fn new(key: KeyColor, params: &MattingParameters) -> Result<Self, KeyError> {
        params.validate_saturation()?;

        let screen = key.rgb();
        let primary = primary_channel(screen);
        let screen_saturation = saturation(screen, params.screen_balance, primary);

        if screen_saturation <= 0.0 {
            tracing::warn!(
                "key colour {} has no dominant channel, every non-negative pixel will key out",
                key
            );
        }
        tracing::debug!(
            "saturation key: primary={} screen_saturation={:.6} balance={}",
            primary,
            screen_saturation,
            params.screen_balance
        );

        Ok(Self {
            balance: params.screen_balance,
            primary,
            screen_saturation,
        })
    }
}

impl KeyModel for SaturationKey {
    fn alpha(&self, pixel: Rgb) -> f32 {
        let min_pixel = pixel[0].min(pixel[1]).min(pixel[2]);
        if min_pixel > 1.0 {
            // Clipped highlights carry no usable saturation
            return 1.0;
        }

        let pixel_saturation = saturation(pixel, self.balance, self.primary);

        if pixel_saturation < 0.0 {
            1.0
        } else if pixel_saturation >= self.screen_saturation {
            0.0
        } else {
            1.0 - pixel_saturation / self.screen_saturation
        }
    }

    fn name(&self) -> &'static str {
        "saturation"
    }
}
