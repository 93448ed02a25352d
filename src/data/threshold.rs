//! Alert threshold with its range invariant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pitch angle (degrees) above which a calibrated reading counts as slouching.
///
/// Always within [`Threshold::MIN`, `Threshold::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    pub const MIN: f64 = 5.0;
    pub const MAX: f64 = 60.0;
    pub const DEFAULT: f64 = 30.0;

    /// Create a threshold, rejecting values outside the valid range.
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidThreshold(value))
        }
    }

    /// Create a threshold, clamping finite values into range.
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn clamped(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self(value.clamp(Self::MIN, Self::MAX)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Move the threshold by whole degrees, as the slider does.
    ///
    /// The result is rounded to an integer and clamped into range.
    pub fn step(self, delta: i32) -> Self {
        let next = (self.0.round() + f64::from(delta)).clamp(Self::MIN, Self::MAX);
        Self(next)
    }

    /// Wire representation for the control topic.
    ///
    /// Whole values are sent without a fractional part ("35"), others in
    /// shortest decimal form ("32.5").
    pub fn to_payload(self) -> String {
        if self.0.fract() == 0.0 {
            format!("{:.0}", self.0)
        } else {
            self.0.to_string()
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_bounds() {
        assert_eq!(Threshold::new(5.0).unwrap().value(), 5.0);
        assert_eq!(Threshold::new(60.0).unwrap().value(), 60.0);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Threshold::new(4.9).is_err());
        assert!(Threshold::new(60.5).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
    }

    #[test]
    fn test_clamped() {
        assert_eq!(Threshold::clamped(2.0).unwrap().value(), 5.0);
        assert_eq!(Threshold::clamped(90.0).unwrap().value(), 60.0);
        assert_eq!(Threshold::clamped(22.5).unwrap().value(), 22.5);
        assert!(Threshold::clamped(f64::INFINITY).is_none());
    }

    #[test]
    fn test_step_stays_in_range() {
        let t = Threshold::new(59.0).unwrap();
        assert_eq!(t.step(1).value(), 60.0);
        assert_eq!(t.step(5).value(), 60.0);

        let t = Threshold::new(5.0).unwrap();
        assert_eq!(t.step(-1).value(), 5.0);

        let t = Threshold::new(22.6).unwrap();
        assert_eq!(t.step(1).value(), 24.0);
    }

    #[test]
    fn test_payload_format() {
        assert_eq!(Threshold::new(35.0).unwrap().to_payload(), "35");
        assert_eq!(Threshold::new(32.5).unwrap().to_payload(), "32.5");
    }

    #[test]
    fn test_deserialize_validates() {
        let t: Threshold = serde_json::from_str("25").unwrap();
        assert_eq!(t.value(), 25.0);
        assert!(serde_json::from_str::<Threshold>("99").is_err());
    }
}
