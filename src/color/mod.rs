mod hsv;
mod ycc;

pub use hsv::{rgb_to_hsv, HUE_MAX, SV_MAX};
pub use ycc::{recenter_chroma, to_ycc, Ycc};

/// 8-bit-per-channel pixel as stored in a frame buffer
pub type DevicePixel = [u8; 3];

/// Pixel with channels scaled to [0, 1], gamma left as received
pub type Rgb = [f32; 3];

/// Order of the colour channels in an interleaved 8-bit buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Reorder a pixel read in this channel order into RGB
    pub fn to_rgb(self, pixel: DevicePixel) -> DevicePixel {
        match self {
            ChannelOrder::Rgb => pixel,
            ChannelOrder::Bgr => swap_red_blue(pixel),
        }
    }

    /// Reorder an RGB pixel into this channel order
    pub fn from_rgb(self, pixel: DevicePixel) -> DevicePixel {
        // The swap is its own inverse
        self.to_rgb(pixel)
    }
}

#[inline]
pub fn swap_red_blue([a, b, c]: DevicePixel) -> DevicePixel {
    [c, b, a]
}

/// Scale a device pixel into [0, 1]
#[inline]
pub fn to_normalized(pixel: DevicePixel) -> Rgb {
    [
        pixel[0] as f32 / 255.0,
        pixel[1] as f32 / 255.0,
        pixel[2] as f32 / 255.0,
    ]
}

/// Scale a normalized pixel back to device range, clamping anything that
/// matting pushed outside [0, 1]
#[inline]
pub fn to_device(pixel: Rgb) -> DevicePixel {
    [
        to_device_channel(pixel[0]),
        to_device_channel(pixel[1]),
        to_device_channel(pixel[2]),
    ]
}

#[inline]
pub fn to_device_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bounds() {
        assert_eq!(to_normalized([0, 0, 0]), [0.0, 0.0, 0.0]);
        assert_eq!(to_normalized([255, 255, 255]), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_round_trip_every_device_value() {
        for v in 0..=255u8 {
            let p = [v, 255 - v, v / 2];
            let n = to_normalized(p);
            let back = to_normalized(to_device(n));
            for c in 0..3 {
                assert!((back[c] - n[c]).abs() <= 1.0 / 255.0 + 1e-6);
            }
            assert_eq!(to_device(n), p);
        }
    }

    #[test]
    fn test_to_device_clamps() {
        assert_eq!(to_device([1.7, -0.2, 0.5]), [255, 0, 128]);
        assert_eq!(to_device_channel(f32::NAN), 0);
        assert_eq!(to_device_channel(f32::INFINITY), 255);
    }

    #[test]
    fn test_channel_order() {
        let bgr = [10, 20, 30];
        assert_eq!(ChannelOrder::Bgr.to_rgb(bgr), [30, 20, 10]);
        assert_eq!(ChannelOrder::Rgb.to_rgb(bgr), bgr);
        assert_eq!(ChannelOrder::Bgr.from_rgb(ChannelOrder::Bgr.to_rgb(bgr)), bgr);
    }
}
