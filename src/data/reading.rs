//! Sensor payloads as they arrive on the data topic.
//!
//! These types match the JSON published by the posture device:
//!
//! ```json
//! {"pitch": -12.4, "roll": 3.1, "yaw": -40.2, "calibrated": true, "threshold": 30}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One decoded sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    /// Forward/backward tilt in degrees.
    pub pitch: f64,
    /// Side-to-side tilt in degrees.
    #[serde(default)]
    pub roll: f64,
    /// Rotation around the vertical axis in degrees.
    #[serde(default)]
    pub yaw: f64,
    /// Whether the device has captured its upright reference pose.
    #[serde(default)]
    pub calibrated: bool,
    /// Threshold currently configured on the device, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl SensorReading {
    /// Decode a raw message body.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| Error::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let reading = SensorReading::parse(
            br#"{"pitch": -12.5, "roll": 3.0, "yaw": -40.0, "calibrated": true, "threshold": 25}"#,
        )
        .unwrap();
        assert_eq!(reading.pitch, -12.5);
        assert_eq!(reading.roll, 3.0);
        assert_eq!(reading.yaw, -40.0);
        assert!(reading.calibrated);
        assert_eq!(reading.threshold, Some(25.0));
    }

    #[test]
    fn test_parse_minimal_payload() {
        let reading = SensorReading::parse(br#"{"pitch": 8}"#).unwrap();
        assert_eq!(reading.pitch, 8.0);
        assert!(!reading.calibrated);
        assert!(reading.threshold.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = SensorReading::parse(b"not json").unwrap_err();
        assert!(matches!(err, Error::Payload(_)));

        // pitch is required
        assert!(SensorReading::parse(br#"{"roll": 1}"#).is_err());
    }
}
