use image::GrayImage;
use rayon::prelude::*;

/// 3x3 max filter; pixels past the edge are ignored
pub fn dilate(mask: &GrayImage) -> GrayImage {
    let _span = tracing::debug_span!("dilate").entered();
    filter_3x3(mask, u8::max, u8::MIN)
}

/// 3x3 min filter; pixels past the edge are ignored
pub fn erode(mask: &GrayImage) -> GrayImage {
    let _span = tracing::debug_span!("erode").entered();
    filter_3x3(mask, u8::min, u8::MAX)
}

/// Dilate then erode, closing pinholes without growing the mask
pub fn close(mask: &GrayImage) -> GrayImage {
    erode(&dilate(mask))
}

fn filter_3x3(mask: &GrayImage, pick: fn(u8, u8) -> u8, identity: u8) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let src = mask.as_raw();
    let mut dst = GrayImage::new(width, height);

    if w == 0 || h == 0 {
        return dst;
    }

    dst.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let top = y.saturating_sub(1);
        let bottom = (y + 1).min(h - 1);
        for (x, out) in row.iter_mut().enumerate() {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(w - 1);

            let mut acc = identity;
            for sy in top..=bottom {
                for sx in left..=right {
                    acc = pick(acc, src[sy * w + sx]);
                }
            }
            *out = acc;
        }
    });

    dst
}
