use super::error::KeyError;
use crate::color::Rgb;
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Reference backdrop colour, normalized RGB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyColor(Rgb);

impl KeyColor {
    /// Screen used with the angular model when the operator gives none
    pub const DEFAULT_ANGULAR: KeyColor = KeyColor([0.0545252, 0.5, 0.20443]);
    /// Screen used with the saturation model when the operator gives none
    pub const DEFAULT_SATURATION: KeyColor = KeyColor([0.133293, 0.178868, 0.133967]);

    pub fn new(rgb: Rgb) -> Result<Self, KeyError> {
        if rgb.iter().all(|c| c.is_finite() && (0.0..=1.0).contains(c)) {
            Ok(Self(rgb))
        } else {
            Err(KeyError::InvalidKeyColor(rgb))
        }
    }

    pub fn rgb(&self) -> Rgb {
        self.0
    }
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Parses `r,g,b` with normalized components
impl FromStr for KeyColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected three comma separated values, got '{s}'"));
        }

        let mut rgb = [0.0f32; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|e| format!("invalid component '{part}': {e}"))?;
        }

        KeyColor::new(rgb).map_err(|e| e.to_string())
    }
}

/// Which matte formulation turns pixels into alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ModelKind {
    /// Chroma rotation towards the key with acceptance/cutoff cones
    #[default]
    Angular,
    /// Dominant-channel saturation relative to the screen
    Saturation,
    /// Coarse HSV range threshold with morphological cleanup
    Hsv,
}

impl ModelKind {
    pub fn default_key(self) -> KeyColor {
        match self {
            ModelKind::Saturation => KeyColor::DEFAULT_SATURATION,
            ModelKind::Angular | ModelKind::Hsv => KeyColor::DEFAULT_ANGULAR,
        }
    }
}

/// Tunable scalars for the key models
///
/// Set by the operator, read-only while a frame is being keyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MattingParameters {
    /// Full opening of the acceptance cone, radians
    pub acceptance_angle: f32,
    /// Full opening of the hard-background cone, radians
    pub cutoff_angle: f32,
    /// Divisor applied to the in-cone key distance
    pub gain: f32,
    /// Weight of the lower-indexed secondary channel, 0..=1
    pub screen_balance: f32,
}

impl Default for MattingParameters {
    fn default() -> Self {
        Self {
            acceptance_angle: 0.523599,
            cutoff_angle: 0.18675,
            gain: 1.0,
            screen_balance: 0.5,
        }
    }
}

impl MattingParameters {
    pub fn validate_angular(&self) -> Result<(), KeyError> {
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(KeyError::InvalidGain(self.gain));
        }
        if !(self.acceptance_angle > 0.0 && self.acceptance_angle < PI) {
            return Err(KeyError::InvalidAcceptanceAngle(self.acceptance_angle));
        }
        if !(0.0..=PI).contains(&self.cutoff_angle) {
            return Err(KeyError::InvalidCutoffAngle(self.cutoff_angle));
        }
        Ok(())
    }

    pub fn validate_saturation(&self) -> Result<(), KeyError> {
        if !(0.0..=1.0).contains(&self.screen_balance) {
            return Err(KeyError::InvalidScreenBalance(self.screen_balance));
        }
        Ok(())
    }

    /// Validate the fields the given model reads
    pub fn validate_for(&self, model: ModelKind) -> Result<(), KeyError> {
        match model {
            ModelKind::Angular => self.validate_angular(),
            ModelKind::Saturation => self.validate_saturation(),
            ModelKind::Hsv => Ok(()),
        }
    }
}
