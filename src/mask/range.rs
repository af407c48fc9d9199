use crate::color::{HUE_MAX, SV_MAX};
use std::fmt;

/// Inclusive `[low, high]` bound on one 8-bit HSV channel
///
/// `low < high` always holds. Moving one end past the other drags the
/// opposite end along instead of leaving an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    low: u8,
    high: u8,
    max: u8,
}

impl ChannelRange {
    /// Full range `[0, max]`
    pub fn full(max: u8) -> Self {
        Self {
            low: 0,
            high: max,
            max,
        }
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn set_low(&mut self, value: u8) {
        // Leave room for high above
        self.low = value.min(self.max - 1);
        if self.high <= self.low {
            tracing::debug!(
                "low bound {} reached high bound {}, raising high",
                self.low,
                self.high
            );
            self.high = self.low + 1;
        }
    }

    pub fn set_high(&mut self, value: u8) {
        self.high = value.clamp(1, self.max);
        if self.low >= self.high {
            tracing::debug!(
                "high bound {} reached low bound {}, lowering low",
                self.high,
                self.low
            );
            self.low = self.high - 1;
        }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.low(), self.high())
    }
}

/// Box in 8-bit HSV space (hue 0..=180, saturation and value 0..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub hue: ChannelRange,
    pub saturation: ChannelRange,
    pub value: ChannelRange,
}

impl Default for HsvRange {
    fn default() -> Self {
        Self {
            hue: ChannelRange::full(HUE_MAX),
            saturation: ChannelRange::full(SV_MAX),
            value: ChannelRange::full(SV_MAX),
        }
    }
}

impl HsvRange {
    /// Build a range by applying lows then highs through the clamping setters
    pub fn new(low: [u8; 3], high: [u8; 3]) -> Self {
        let mut range = Self::default();
        range.set_low_h(low[0]);
        range.set_high_h(high[0]);
        range.set_low_s(low[1]);
        range.set_high_s(high[1]);
        range.set_low_v(low[2]);
        range.set_high_v(high[2]);
        range
    }

    pub fn set_low_h(&mut self, value: u8) {
        self.hue.set_low(value);
    }

    pub fn set_high_h(&mut self, value: u8) {
        self.hue.set_high(value);
    }

    pub fn set_low_s(&mut self, value: u8) {
        self.saturation.set_low(value);
    }

    pub fn set_high_s(&mut self, value: u8) {
        self.saturation.set_high(value);
    }

    pub fn set_low_v(&mut self, value: u8) {
        self.value.set_low(value);
    }

    pub fn set_high_v(&mut self, value: u8) {
        self.value.set_high(value);
    }

    /// Whether an 8-bit HSV triple falls inside every channel's bounds
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.hue.contains(hsv[0]) && self.saturation.contains(hsv[1]) && self.value.contains(hsv[2])
    }
}

impl fmt::Display for HsvRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H {} S {} V {}", self.hue, self.saturation, self.value)
    }
}
