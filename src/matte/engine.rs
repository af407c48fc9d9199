use super::spill::SpillSuppression;
use super::types::Matte;
use crate::color::to_normalized;
use crate::config::KeyingConfig;
use crate::keying::{create_model, KeyError, KeyModel};
use crate::mask::{ThresholdMask, MASK_ON};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Alpha written in place of a non-finite model result
pub const FALLBACK_ALPHA: f32 = 0.0;

/// Where per-pixel alpha comes from
enum MatteSource {
    /// Full key model, optionally skipped for pixels the threshold mask
    /// already marks as foreground
    Key {
        model: Box<dyn KeyModel>,
        prefilter: Option<ThresholdMask>,
    },
    /// Binary matte straight from the threshold mask
    Threshold(ThresholdMask),
}

/// Output of keying one frame
pub struct MatteResult {
    /// Input scaled by alpha
    pub image: RgbImage,
    pub matte: Matte,
    /// Pixels whose alpha had to be replaced with [`FALLBACK_ALPHA`]
    pub degenerate_pixels: usize,
    /// Pixels altered by spill suppression
    pub spill_pixels: usize,
}

/// Keys whole frames with one fixed configuration
///
/// Built from a configuration snapshot; a new snapshot means a new engine.
pub struct MatteEngine {
    source: MatteSource,
    spill: Option<SpillSuppression>,
}

impl MatteEngine {
    pub fn new(config: &KeyingConfig) -> Result<Self, KeyError> {
        config.validate()?;

        let threshold = ThresholdMask::new(config.hsv, config.morphology);
        let source = match create_model(config.model, config.key, &config.params)? {
            Some(model) => {
                tracing::info!(
                    "Keying with {} model, key colour {}",
                    model.name(),
                    config.key
                );
                if config.prefilter {
                    tracing::info!("Prefiltering with HSV range {}", config.hsv);
                }
                MatteSource::Key {
                    model,
                    prefilter: config.prefilter.then_some(threshold),
                }
            }
            None => {
                tracing::info!("Keying with HSV threshold {}", config.hsv);
                MatteSource::Threshold(threshold)
            }
        };

        Ok(Self {
            source,
            spill: config.spill,
        })
    }

    /// Key one frame: compute alpha, scale the frame by it, then run spill
    /// suppression when enabled
    pub fn composite(&self, frame: &RgbImage) -> MatteResult {
        let _span = tracing::debug_span!("composite").entered();

        let (width, height) = frame.dimensions();
        let w = width as usize;
        let mut alpha = vec![0.0f32; w * height as usize];
        let mut image = RgbImage::new(width, height);

        // Rows are chunked by width, so a zero width is the only shape
        // that cannot be split; zero height just yields no rows
        let degenerate_pixels = if w == 0 {
            0
        } else {
            match &self.source {
                MatteSource::Key { model, prefilter } => {
                    let foreground = prefilter.as_ref().map(|m| m.foreground_mask(frame));
                    key_rows(
                        frame,
                        model.as_ref(),
                        foreground.as_ref(),
                        &mut alpha,
                        &mut image,
                    )
                }
                MatteSource::Threshold(masker) => {
                    let foreground = masker.foreground_mask(frame);
                    mask_rows(frame, &foreground, &mut alpha, &mut image);
                    0
                }
            }
        };

        if degenerate_pixels > 0 {
            tracing::warn!(
                "{} pixels produced a non-finite alpha, using {}",
                degenerate_pixels,
                FALLBACK_ALPHA
            );
        }

        let spill_pixels = self.spill.map_or(0, |spill| spill.apply(&mut image));

        MatteResult {
            image,
            matte: Matte::new(width, height, alpha),
            degenerate_pixels,
            spill_pixels,
        }
    }
}

/// Run the key model over every row in parallel; returns the number of
/// pixels that needed the fallback alpha
fn key_rows(
    frame: &RgbImage,
    model: &dyn KeyModel,
    foreground: Option<&GrayImage>,
    alpha: &mut [f32],
    image: &mut RgbImage,
) -> usize {
    let w = frame.width() as usize;
    let src = frame.as_raw();

    image
        .par_chunks_mut(w * 3)
        .zip(alpha.par_chunks_mut(w))
        .enumerate()
        .map(|(y, (out_row, alpha_row))| {
            let src_row = &src[y * w * 3..(y + 1) * w * 3];
            let mut degenerate = 0;

            for (x, ((out, px), a)) in out_row
                .chunks_exact_mut(3)
                .zip(src_row.chunks_exact(3))
                .zip(alpha_row.iter_mut())
                .enumerate()
            {
                let skip = foreground.is_some_and(|m| m.as_raw()[y * w + x] == MASK_ON);
                let raw = if skip {
                    1.0
                } else {
                    model.alpha(to_normalized([px[0], px[1], px[2]]))
                };

                *a = if raw.is_finite() {
                    raw.clamp(0.0, 1.0)
                } else {
                    degenerate += 1;
                    FALLBACK_ALPHA
                };
                scale_pixel(px, *a, out);
            }

            degenerate
        })
        .sum()
}

fn mask_rows(frame: &RgbImage, foreground: &GrayImage, alpha: &mut [f32], image: &mut RgbImage) {
    let w = frame.width() as usize;
    let src = frame.as_raw();
    let mask = foreground.as_raw();

    image
        .par_chunks_mut(w * 3)
        .zip(alpha.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, (out_row, alpha_row))| {
            let src_row = &src[y * w * 3..(y + 1) * w * 3];
            let mask_row = &mask[y * w..(y + 1) * w];
            for (((out, px), a), m) in out_row
                .chunks_exact_mut(3)
                .zip(src_row.chunks_exact(3))
                .zip(alpha_row.iter_mut())
                .zip(mask_row)
            {
                *a = if *m == MASK_ON { 1.0 } else { 0.0 };
                scale_pixel(px, *a, out);
            }
        });
}

/// Scale each channel by alpha, truncating towards zero like the spill pass
#[inline]
fn scale_pixel(src: &[u8], alpha: f32, out: &mut [u8]) {
    for (o, s) in out.iter_mut().zip(src) {
        *o = (*s as f32 * alpha).clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::keying::{KeyColor, ModelKind};
    use crate::mask::HsvRange;
    use image::Rgb as Px;

    struct ConstantModel(f32);

    impl KeyModel for ConstantModel {
        fn alpha(&self, _pixel: Rgb) -> f32 {
            self.0
        }

        fn name(&self) -> &'static str {
            "constant"
        }
    }

    fn engine_with(model: Box<dyn KeyModel>) -> MatteEngine {
        MatteEngine {
            source: MatteSource::Key {
                model,
                prefilter: None,
            },
            spill: None,
        }
    }

    fn green_screen_frame() -> RgbImage {
        // Left half backdrop, right half a red subject
        RgbImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Px([14, 128, 52])
            } else {
                Px([200, 40, 40])
            }
        })
    }

    #[test]
    fn test_angular_keys_out_backdrop() {
        let mut config = KeyingConfig::new(ModelKind::Angular);
        config.key = KeyColor::new(crate::color::to_normalized([14, 128, 52])).unwrap();
        let engine = MatteEngine::new(&config).unwrap();
        let result = engine.composite(&green_screen_frame());

        assert_eq!(result.image.dimensions(), (8, 4));
        assert_eq!(result.matte.dimensions(), (8, 4));
        assert_eq!(result.degenerate_pixels, 0);
        assert_eq!(result.matte.get(0, 0), Some(0.0));
        assert_eq!(result.matte.get(7, 3), Some(1.0));
        assert_eq!(result.image.get_pixel(1, 1).0, [0, 0, 0]);
        assert_eq!(result.image.get_pixel(6, 2).0, [200, 40, 40]);
    }

    #[test]
    fn test_saturation_keys_out_backdrop() {
        let mut config = KeyingConfig::new(ModelKind::Saturation);
        config.key = KeyColor::new(crate::color::to_normalized([14, 128, 52])).unwrap();
        let result = MatteEngine::new(&config)
            .unwrap()
            .composite(&green_screen_frame());
        assert_eq!(result.matte.get(2, 1), Some(0.0));
        assert_eq!(result.matte.get(5, 1), Some(1.0));
    }

    #[test]
    fn test_alpha_scales_each_channel() {
        let engine = engine_with(Box::new(ConstantModel(0.5)));
        let frame = RgbImage::from_pixel(3, 2, Px([200, 101, 255]));
        let result = engine.composite(&frame);
        assert!(result.image.pixels().all(|p| p.0 == [100, 50, 127]));
    }

    #[test]
    fn test_out_of_range_alpha_is_clamped() {
        let engine = engine_with(Box::new(ConstantModel(1.8)));
        let frame = RgbImage::from_pixel(2, 2, Px([200, 250, 10]));
        let result = engine.composite(&frame);
        assert!(result.matte.as_slice().iter().all(|&a| a == 1.0));
        assert!(result.image.pixels().all(|p| p.0 == [200, 250, 10]));

        let engine = engine_with(Box::new(ConstantModel(-3.0)));
        let result = engine.composite(&frame);
        assert!(result.image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_non_finite_alpha_does_not_abort_frame() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let engine = engine_with(Box::new(ConstantModel(bad)));
            let frame = RgbImage::from_pixel(5, 3, Px([90, 90, 90]));
            let result = engine.composite(&frame);
            assert_eq!(result.degenerate_pixels, 15);
            assert!(result.matte.as_slice().iter().all(|&a| a == FALLBACK_ALPHA));
            assert!(result.image.pixels().all(|p| p.0 == [0, 0, 0]));
        }
    }

    #[test]
    fn test_prefilter_skips_model_outside_key_range() {
        let engine = MatteEngine {
            source: MatteSource::Key {
                model: Box::new(ConstantModel(0.0)),
                prefilter: Some(ThresholdMask::new(
                    HsvRange::new([35, 102, 45], [85, 255, 255]),
                    false,
                )),
            },
            spill: None,
        };
        let result = engine.composite(&green_screen_frame());
        // Backdrop goes through the model, subject is kept untouched
        assert_eq!(result.matte.get(0, 0), Some(0.0));
        assert_eq!(result.matte.get(6, 0), Some(1.0));
        assert_eq!(result.image.get_pixel(6, 0).0, [200, 40, 40]);
    }

    #[test]
    fn test_threshold_model_produces_binary_matte() {
        let mut config = KeyingConfig::new(ModelKind::Hsv);
        config.hsv = HsvRange::new([35, 102, 45], [85, 255, 255]);
        let result = MatteEngine::new(&config)
            .unwrap()
            .composite(&green_screen_frame());
        assert!(result
            .matte
            .as_slice()
            .iter()
            .all(|&a| a == 0.0 || a == 1.0));
        assert_eq!(result.matte.get(1, 1), Some(0.0));
        assert_eq!(result.matte.get(6, 1), Some(1.0));
    }

    #[test]
    fn test_spill_pass_runs_after_matte() {
        let mut config = KeyingConfig::new(ModelKind::Hsv);
        // Nothing in range: every pixel is foreground
        config.hsv = HsvRange::new([170, 254, 254], [171, 255, 255]);
        config.spill = Some(SpillSuppression::default());
        let frame = RgbImage::from_pixel(2, 2, Px([40, 200, 40]));
        let result = MatteEngine::new(&config).unwrap().composite(&frame);
        assert_eq!(result.spill_pixels, 4);
        assert!(result.image.pixels().all(|p| p.0 == [68, 200, 68]));
    }

    #[test]
    fn test_invalid_config_blocks_engine() {
        let mut config = KeyingConfig::new(ModelKind::Angular);
        config.params.gain = 0.0;
        assert!(MatteEngine::new(&config).is_err());
    }

    #[test]
    fn test_empty_frame() {
        let engine = engine_with(Box::new(ConstantModel(0.5)));
        let result = engine.composite(&RgbImage::new(0, 0));
        assert_eq!(result.matte.dimensions(), (0, 0));
        assert_eq!(result.degenerate_pixels, 0);

        for (w, h) in [(0, 3), (3, 0)] {
            let result = engine.composite(&RgbImage::new(w, h));
            assert_eq!(result.image.dimensions(), (w, h));
            assert_eq!(result.matte.coverage(), 0.0);
        }
    }
}
