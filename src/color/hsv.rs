use super::DevicePixel;

/// Largest hue value on the 8-bit scale (degrees / 2)
pub const HUE_MAX: u8 = 180;
/// Largest saturation / value on the 8-bit scale
pub const SV_MAX: u8 = 255;

/// Convert an RGB device pixel into 8-bit HSV
///
/// Hue is halved to fit a byte (0..180), saturation and value span 0..=255.
pub fn rgb_to_hsv(pixel: DevicePixel) -> [u8; 3] {
    let r = pixel[0] as f32;
    let g = pixel[1] as f32;
    let b = pixel[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let mut h_byte = (h / 2.0).round() as u16;
    if h_byte >= HUE_MAX as u16 {
        h_byte -= HUE_MAX as u16;
    }

    [h_byte as u8, s.round() as u8, max as u8]
}
