use serde::Serialize;
use std::fmt;

use crate::config::ZoomSettings;

/// A zoom factor, always within [`Zoom::MIN`, `Zoom::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Zoom(f32);

impl Zoom {
    pub const MIN: f32 = 0.40;
    pub const MAX: f32 = 3.00;

    /// Clamp `value` into range. NaN maps to 1.0.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Clamp into the configured bounds, which never widen the hard range.
    pub fn within(value: f32, settings: &ZoomSettings) -> Self {
        let lo = settings.min.max(Self::MIN);
        let hi = settings.max.min(Self::MAX).max(lo);
        let Self(v) = Self::new(value);
        Self(v.clamp(lo, hi))
    }

    /// Move by `delta`, rounding to two decimals so repeated steps do not drift.
    pub fn stepped(self, delta: f32, settings: &ZoomSettings) -> Self {
        let raw = self.0 + delta;
        Self::within((raw * 100.0).round() / 100.0, settings)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Whole percent, used as the render cache key.
    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }

    /// Scale a length in points to device pixels.
    pub fn scale(self, points: f32) -> f32 {
        points * self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
