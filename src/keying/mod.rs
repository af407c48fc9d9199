mod angular;
mod error;
mod saturation;
pub mod types;

pub use angular::AngularKey;
pub use error::KeyError;
pub use saturation::SaturationKey;
pub use types::{KeyColor, MattingParameters, ModelKind};

use crate::color::Rgb;

/// Per-pixel matte formulation
///
/// Implementations hold only values derived from the key colour and the
/// parameters, so one instance can be shared by every worker of a frame.
pub trait KeyModel: Send + Sync {
    /// Alpha for one normalized RGB pixel
    ///
    /// 0.0 = background, 1.0 = foreground. Not clamped, callers clamp.
    fn alpha(&self, pixel: Rgb) -> f32;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Build the per-pixel model for `kind`
///
/// Returns `Ok(None)` for the threshold model, which works on whole masks
/// rather than single pixels.
pub fn create_model(
    kind: ModelKind,
    key: KeyColor,
    params: &MattingParameters,
) -> Result<Option<Box<dyn KeyModel>>, KeyError> {
    let model: Box<dyn KeyModel> = match kind {
        ModelKind::Angular => Box::new(AngularKey::new(key, params)?),
        ModelKind::Saturation => Box::new(SaturationKey::new(key, params)?),
        ModelKind::Hsv => return Ok(None),
    };
    Ok(Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_selects_strategy() {
        let params = MattingParameters::default();
        let angular = create_model(ModelKind::Angular, KeyColor::DEFAULT_ANGULAR, &params)
            .unwrap()
            .unwrap();
        assert_eq!(angular.name(), "angular");

        let saturation =
            create_model(ModelKind::Saturation, KeyColor::DEFAULT_SATURATION, &params)
                .unwrap()
                .unwrap();
        assert_eq!(saturation.name(), "saturation");

        assert!(create_model(ModelKind::Hsv, KeyColor::DEFAULT_ANGULAR, &params)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_create_model_surfaces_configuration_errors() {
        let params = MattingParameters {
            gain: 0.0,
            ..Default::default()
        };
        let result = create_model(ModelKind::Angular, KeyColor::DEFAULT_ANGULAR, &params);
        assert!(matches!(result, Err(KeyError::InvalidGain(_))));
    }
}
