use crate::keying::{KeyColor, KeyError, MattingParameters, ModelKind};
use crate::mask::HsvRange;
use crate::matte::SpillSuppression;
use std::sync::{Arc, RwLock};

/// Everything an engine needs to key a frame
#[derive(Debug, Clone, PartialEq)]
pub struct KeyingConfig {
    pub model: ModelKind,
    pub key: KeyColor,
    pub params: MattingParameters,
    /// Backdrop range for the threshold model and the prefilter
    pub hsv: HsvRange,
    /// Skip the key model for pixels the HSV range marks as foreground
    pub prefilter: bool,
    /// Clean threshold masks with dilate-then-erode
    pub morphology: bool,
    pub spill: Option<SpillSuppression>,
}

impl KeyingConfig {
    /// Defaults for `model`, including its stock key colour
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            key: model.default_key(),
            params: MattingParameters::default(),
            hsv: HsvRange::default(),
            prefilter: false,
            morphology: true,
            spill: None,
        }
    }

    pub fn validate(&self) -> Result<(), KeyError> {
        self.params.validate_for(self.model)
    }
}

/// A configuration together with the update count it was taken at
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub config: KeyingConfig,
}

/// Shared home of the live keying configuration
///
/// One writer (the operator) adjusts it, frame workers take a snapshot at
/// the start of each frame and never see a half-applied update.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    inner: Arc<RwLock<ConfigSnapshot>>,
}

impl ParameterStore {
    pub fn new(config: KeyingConfig) -> Result<Self, KeyError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(ConfigSnapshot { version: 0, config })),
        })
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `change` to a copy of the current configuration and publish it
    /// if it validates. On error the previous configuration stays live.
    pub fn update<F>(&self, change: F) -> Result<u64, KeyError>
    where
        F: FnOnce(&mut KeyingConfig),
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut candidate = guard.config.clone();
        change(&mut candidate);
        candidate.validate()?;

        guard.config = candidate;
        guard.version += 1;
        tracing::debug!("keying configuration now at version {}", guard.version);
        Ok(guard.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_defaults_follow_model() {
        let angular = KeyingConfig::new(ModelKind::Angular);
        assert_eq!(angular.key, KeyColor::DEFAULT_ANGULAR);
        assert!(angular.validate().is_ok());

        let saturation = KeyingConfig::new(ModelKind::Saturation);
        assert_eq!(saturation.key, KeyColor::DEFAULT_SATURATION);
    }

    #[test]
    fn test_store_rejects_invalid_initial_config() {
        let mut config = KeyingConfig::new(ModelKind::Angular);
        config.params.gain = -2.0;
        assert!(ParameterStore::new(config).is_err());
    }

    #[test]
    fn test_update_bumps_version() {
        let store = ParameterStore::new(KeyingConfig::new(ModelKind::Angular)).unwrap();
        assert_eq!(store.snapshot().version, 0);

        let version = store.update(|c| c.params.gain = 2.0).unwrap();
        assert_eq!(version, 1);
        let snap = store.snapshot();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.config.params.gain, 2.0);
    }

    #[test]
    fn test_rejected_update_leaves_config_untouched() {
        let store = ParameterStore::new(KeyingConfig::new(ModelKind::Angular)).unwrap();
        let before = store.snapshot();

        let result = store.update(|c| {
            c.params.acceptance_angle = 0.9;
            c.params.gain = 0.0;
        });
        assert_eq!(result, Err(KeyError::InvalidGain(0.0)));

        let after = store.snapshot();
        assert_eq!(after.version, before.version);
        assert_eq!(after.config, before.config);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let store = ParameterStore::new(KeyingConfig::new(ModelKind::Saturation)).unwrap();
        let snap = store.snapshot();
        store.update(|c| c.params.screen_balance = 0.9).unwrap();
        assert_eq!(snap.config.params.screen_balance, 0.5);
    }

    #[test]
    fn test_readers_never_see_partial_updates() {
        let store = ParameterStore::new(KeyingConfig::new(ModelKind::Angular)).unwrap();

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 1..200 {
                    let v = i as f32;
                    store
                        .update(|c| {
                            c.params.gain = v;
                            c.params.screen_balance = 1.0 / v;
                        })
                        .unwrap();
                }
            })
        };

        for _ in 0..200 {
            let snap = store.snapshot();
            let p = snap.config.params;
            if snap.version > 0 {
                assert!((p.gain * p.screen_balance - 1.0).abs() < 1e-5);
            }
        }
        writer.join().unwrap();
    }
}
