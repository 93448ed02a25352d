//! Alert evaluation and session statistics.

use serde::{Deserialize, Serialize};

use super::reading::SensorReading;
use super::retention::RetainedReading;
use super::threshold::Threshold;

/// Whether the current reading should raise a slouch alert.
///
/// Calibration gates the whole alert path: an uncalibrated reading never
/// alerts, whatever its angle.
pub fn is_alerting(reading: &SensorReading, threshold: Threshold) -> bool {
    reading.calibrated && reading.pitch.abs() > threshold.value()
}

/// Fraction of the threshold above which the pitch is shown as a warning.
pub const WARNING_FRACTION: f64 = 0.7;

/// Display band of the current pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostureLevel {
    Good,
    /// Above 70% of the threshold but not alerting.
    Warning,
    Slouching,
}

/// Classify the current reading for display.
///
/// `Slouching` follows [`is_alerting`] exactly, so an uncalibrated reading is
/// at most a warning.
pub fn posture_level(reading: &SensorReading, threshold: Threshold) -> PostureLevel {
    if is_alerting(reading, threshold) {
        PostureLevel::Slouching
    } else if reading.pitch.abs() > threshold.value() * WARNING_FRACTION {
        PostureLevel::Warning
    } else {
        PostureLevel::Good
    }
}

/// Aggregates over the retained readings for the current threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Mean retained pitch in degrees.
    pub average_angle: f64,
    /// Share of retained readings at or below the threshold, 0..=100.
    pub good_posture_percent: u32,
    /// Retained readings above the threshold.
    pub alert_count: usize,
    pub total_readings: usize,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            average_angle: 0.0,
            good_posture_percent: 100,
            alert_count: 0,
            total_readings: 0,
        }
    }
}

impl SessionStats {
    /// Compute stats over `readings` (stored pitch is already absolute).
    ///
    /// An empty sequence counts as fully good posture.
    pub fn compute<'a, I>(readings: I, threshold: Threshold) -> Self
    where
        I: IntoIterator<Item = &'a RetainedReading>,
    {
        let limit = threshold.value();
        let mut total = 0usize;
        let mut alerts = 0usize;
        let mut sum = 0.0;

        for reading in readings {
            total += 1;
            sum += reading.pitch;
            if reading.pitch > limit {
                alerts += 1;
            }
        }

        if total == 0 {
            return Self::default();
        }

        let good = total - alerts;
        Self {
            average_angle: sum / total as f64,
            good_posture_percent: ((good as f64 / total as f64) * 100.0).round() as u32,
            alert_count: alerts,
            total_readings: total,
        }
    }

    /// Percentage of retained readings above the threshold, unrounded.
    pub fn alert_percent(&self) -> f64 {
        if self.total_readings == 0 {
            0.0
        } else {
            self.alert_count as f64 / self.total_readings as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retained(pitches: &[f64]) -> Vec<RetainedReading> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &pitch)| RetainedReading {
                time: "09:00:00".to_string(),
                pitch,
                roll: 0.0,
                yaw: 0.0,
                timestamp: i as i64,
            })
            .collect()
    }

    fn threshold(v: f64) -> Threshold {
        Threshold::new(v).unwrap()
    }

    fn reading(pitch: f64, calibrated: bool) -> SensorReading {
        SensorReading {
            pitch,
            calibrated,
            ..SensorReading::default()
        }
    }

    #[test]
    fn test_posture_level_bands() {
        let t = threshold(30.0);
        assert_eq!(posture_level(&reading(10.0, true), t), PostureLevel::Good);
        assert_eq!(posture_level(&reading(-20.0, true), t), PostureLevel::Good);
        assert_eq!(posture_level(&reading(-22.0, true), t), PostureLevel::Warning);
        assert_eq!(posture_level(&reading(30.0, true), t), PostureLevel::Warning);
        assert_eq!(posture_level(&reading(-31.0, true), t), PostureLevel::Slouching);
        assert_eq!(posture_level(&reading(45.0, false), t), PostureLevel::Warning);
    }

    #[test]
    fn test_empty_defaults_to_good() {
        let stats = SessionStats::compute(&retained(&[]), threshold(30.0));
        assert_eq!(stats.average_angle, 0.0);
        assert_eq!(stats.good_posture_percent, 100);
        assert_eq!(stats.alert_count, 0);
        assert_eq!(stats.total_readings, 0);
    }

    #[test]
    fn test_mixed_session() {
        let stats = SessionStats::compute(&retained(&[10.0, 40.0, 10.0, 40.0]), threshold(30.0));
        assert_eq!(stats.good_posture_percent, 50);
        assert_eq!(stats.alert_count, 2);
        assert_eq!(stats.average_angle, 25.0);
        assert_eq!(stats.total_readings, 4);
    }

    #[test]
    fn test_ties_count_as_good() {
        let stats = SessionStats::compute(&retained(&[30.0, 30.0, 31.0]), threshold(30.0));
        assert_eq!(stats.alert_count, 1);
        assert_eq!(stats.good_posture_percent, 67);
    }

    #[test]
    fn test_good_and_alert_partition() {
        let samples = [
            vec![1.0],
            vec![45.0, 12.0, 9.0],
            vec![5.0, 6.0, 7.0, 50.0, 51.0, 52.0, 53.0],
            (0..100).map(|i| i as f64 * 0.6).collect::<Vec<_>>(),
        ];
        for pitches in samples {
            let stats = SessionStats::compute(&retained(&pitches), threshold(25.0));
            let sum = stats.good_posture_percent as f64 + stats.alert_percent();
            assert!((sum - 100.0).abs() <= 0.5, "sum was {}", sum);
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        let data = retained(&[3.0, 33.0, 17.5]);
        let a = SessionStats::compute(&data, threshold(20.0));
        let b = SessionStats::compute(&data, threshold(20.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_uncalibrated_never_alerts() {
        for pitch in [0.0, 31.0, -59.0, 89.0, -180.0] {
            let reading = SensorReading {
                pitch,
                calibrated: false,
                ..Default::default()
            };
            assert!(!is_alerting(&reading, threshold(5.0)));
        }
    }

    #[test]
    fn test_calibrated_alert_uses_absolute_pitch() {
        let reading = SensorReading {
            pitch: -35.0,
            calibrated: true,
            ..Default::default()
        };
        assert!(is_alerting(&reading, threshold(30.0)));
        assert!(!is_alerting(&reading, threshold(35.0)));
    }
}
