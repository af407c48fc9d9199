use thiserror::Error;

/// Rejected keying configuration
///
/// Any of these blocks frame processing until the operator supplies a
/// valid value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    /// Angular model divides by the gain
    #[error("gain must be a finite value greater than zero, got {0}")]
    InvalidGain(f32),

    #[error("acceptance angle must lie in (0, pi) radians, got {0}")]
    InvalidAcceptanceAngle(f32),

    #[error("cutoff angle must lie in [0, pi] radians, got {0}")]
    InvalidCutoffAngle(f32),

    #[error("screen balance must lie in [0, 1], got {0}")]
    InvalidScreenBalance(f32),

    /// Key colour components must be finite and within [0, 1]
    #[error("key colour must have components in [0, 1], got {0:?}")]
    InvalidKeyColor([f32; 3]),
}
