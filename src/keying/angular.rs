use super::error::KeyError;
use super::types::{KeyColor, MattingParameters};
use super::KeyModel;
use crate::color::{recenter_chroma, to_ycc, Rgb, Ycc};

/// Chroma-angle keyer
///
/// Rotates pixel chroma into the key's frame, accepts pixels inside a cone
/// around the key direction and forces the inner cutoff cone to background.
/// The key's rotation is computed once, at construction.
#[derive(Debug, Clone)]
pub struct AngularKey {
    cos_theta: f32,
    sin_theta: f32,
    tan_half_acceptance: f32,
    half_cutoff: f32,
    gain: f32,
}

impl AngularKey {
    pub fn new(key: KeyColor, params: &MattingParameters) -> Result<Self, KeyError> {
        Self::from_ycc(to_ycc(key.rgb()), params)
    }

    pub fn from_ycc(key: Ycc, params: &MattingParameters) -> Result<Self, KeyError> {
        params.validate_angular()?;

        let chroma = recenter_chroma(key);
        let theta = if chroma.is_origin() {
            // atan2 has no direction to offer, fall back to no rotation
            tracing::warn!("key colour has no chroma, keying without rotation");
            0.0
        } else {
            chroma.cr.atan2(chroma.cb)
        };

        tracing::debug!(
            "angular key: theta={:.4} acceptance={:.4} cutoff={:.4} gain={}",
            theta,
            params.acceptance_angle,
            params.cutoff_angle,
            params.gain
        );

        Ok(Self {
            cos_theta: theta.cos(),
            sin_theta: theta.sin(),
            tan_half_acceptance: (params.acceptance_angle / 2.0).tan(),
            half_cutoff: params.cutoff_angle / 2.0,
            gain: params.gain,
        })
    }

    /// Alpha for a pixel already in YCC; not clamped
    pub fn alpha_ycc(&self, pixel: Ycc) -> f32 {
        let chroma = recenter_chroma(pixel);

        let x = chroma.cb * self.cos_theta + chroma.cr * self.sin_theta;
        let z = chroma.cr * self.cos_theta - chroma.cb * self.sin_theta;

        // Negative means the pixel lies outside the acceptance cone
        let kfg = x - z.abs() / self.tan_half_acceptance;
        if kfg > 0.0 {
            let beta = z.atan2(x);
            if beta.abs() < self.half_cutoff {
                0.0
            } else {
                1.0 - kfg / self.gain
            }
        } else {
            1.0
        }
    }
}

impl KeyModel for AngularKey {
    fn alpha(&self, pixel: Rgb) -> f32 {
        self.alpha_ycc(to_ycc(pixel))
    }

    fn name(&self) -> &'static str {
        "angular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ycc(cb: f32, cr: f32) -> Ycc {
        Ycc { y: 0.5, cb, cr }
    }

    #[test]
    fn test_key_colour_is_background() {
        let key = KeyColor::DEFAULT_ANGULAR;
        let model = AngularKey::new(key, &MattingParameters::default()).unwrap();
        assert_eq!(model.alpha(key.rgb()), 0.0);
    }

    #[test]
    fn test_opposite_hue_is_foreground() {
        let model =
            AngularKey::new(KeyColor::DEFAULT_ANGULAR, &MattingParameters::default()).unwrap();
        // Magenta sits opposite green in the chroma plane
        assert_eq!(model.alpha([1.0, 0.0, 1.0]), 1.0);
        assert_eq!(model.alpha([0.9, 0.2, 0.1]), 1.0);
    }

    #[test]
    fn test_soft_edge_between_cones() {
        // Key along +Cb, theta = 0
        let model = AngularKey::from_ycc(ycc(0.75, 0.5), &MattingParameters::default()).unwrap();
        // Centered chroma (0.4, 0.1)
        let alpha = model.alpha_ycc(ycc(0.7, 0.55));
        let expected = 1.0 - (0.4 - 0.1 / (0.523599f32 / 2.0).tan());
        assert!((alpha - expected).abs() < 1e-4, "alpha={alpha}");
        assert!(alpha > 0.0 && alpha < 1.0);
    }

    #[test]
    fn test_gain_scales_falloff() {
        let params = MattingParameters {
            gain: 0.5,
            ..Default::default()
        };
        let model = AngularKey::from_ycc(ycc(0.75, 0.5), &params).unwrap();
        let alpha = model.alpha_ycc(ycc(0.7, 0.55));
        let kfg = 0.4 - 0.1 / (0.523599f32 / 2.0).tan();
        assert!((alpha - (1.0 - kfg / 0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_outside_cone_is_foreground_regardless_of_beta() {
        let model = AngularKey::from_ycc(ycc(0.75, 0.5), &MattingParameters::default()).unwrap();
        // All of these give kfg <= 0: behind the key, on the z axis, or wide of the cone
        for (cb, cr) in [(0.2, 0.5), (0.5, 0.9), (0.5, 0.1), (0.55, 0.8), (0.5, 0.5)] {
            assert_eq!(model.alpha_ycc(ycc(cb, cr)), 1.0, "cb={cb} cr={cr}");
        }
    }

    #[test]
    fn test_zero_gain_is_a_configuration_error() {
        let params = MattingParameters {
            gain: 0.0,
            ..Default::default()
        };
        assert_eq!(
            AngularKey::new(KeyColor::DEFAULT_ANGULAR, &params).unwrap_err(),
            KeyError::InvalidGain(0.0)
        );
    }

    #[test]
    fn test_achromatic_key_never_yields_nan() {
        let model = AngularKey::from_ycc(ycc(0.5, 0.5), &MattingParameters::default()).unwrap();
        let pixels = [
            ycc(0.5, 0.5),
            ycc(0.9, 0.5),
            ycc(0.1, 0.9),
            ycc(0.75, 0.52),
        ];
        for p in pixels {
            let first = model.alpha_ycc(p);
            assert!(first.is_finite());
            assert_eq!(first, model.alpha_ycc(p));
        }
        // No rotation: the +Cb axis behaves as the key direction
        assert_eq!(model.alpha_ycc(ycc(0.9, 0.5)), 0.0);
        assert_eq!(model.alpha_ycc(ycc(0.1, 0.5)), 1.0);
    }
}
