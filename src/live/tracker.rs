//! Live reading pipeline: parse, alert, decimate, aggregate.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::{
    is_alerting, posture_level, PostureLevel, RetainedReading, Retention, RetentionPolicy,
    SensorReading, SessionStats, Threshold,
};
use crate::error::Result;

/// Derived state of the live view.
///
/// Mutated only through [`LiveTracker::ingest`] and
/// [`LiveTracker::set_threshold`]; both recompute the stats.
#[derive(Debug, Clone)]
pub struct LiveTracker {
    current: SensorReading,
    threshold: Threshold,
    retention: Retention,
    stats: SessionStats,
    dropped: u64,
}

/// What a successfully ingested payload changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingested {
    /// The reading was appended to the retained buffer.
    pub retained: bool,
    /// The device reported a threshold different from the local one.
    pub threshold_changed: bool,
}

impl LiveTracker {
    pub fn new(policy: RetentionPolicy, threshold: Threshold) -> Self {
        Self {
            current: SensorReading::default(),
            threshold,
            retention: Retention::new(policy),
            stats: SessionStats::default(),
            dropped: 0,
        }
    }

    /// Feed one raw message body received at `now`.
    ///
    /// Malformed payloads are logged and counted, and leave every other
    /// piece of state untouched.
    pub fn ingest(&mut self, payload: &[u8], now: DateTime<Local>) -> Result<Ingested> {
        let reading = match SensorReading::parse(payload) {
            Ok(reading) => reading,
            Err(e) => {
                self.dropped += 1;
                warn!("Dropping sensor payload: {}", e);
                return Err(e);
            }
        };

        self.current = reading;

        let mut threshold_changed = false;
        if let Some(device) = reading.threshold.and_then(Threshold::clamped) {
            if device != self.threshold {
                debug!("Device threshold {} replaces {}", device.value(), self.threshold.value());
                self.threshold = device;
                threshold_changed = true;
            }
        }

        let retained = self.retention.record(&reading, now).is_some();
        if retained || threshold_changed {
            self.recompute();
        }

        Ok(Ingested {
            retained,
            threshold_changed,
        })
    }

    /// Replace the threshold and recompute the stats.
    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.threshold = threshold;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.stats = SessionStats::compute(self.retention.iter(), self.threshold);
    }

    pub fn current(&self) -> &SensorReading {
        &self.current
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_alerting(&self) -> bool {
        is_alerting(&self.current, self.threshold)
    }

    /// Display band of the current reading.
    pub fn posture_level(&self) -> PostureLevel {
        posture_level(&self.current, self.threshold)
    }

    pub fn readings(&self) -> impl Iterator<Item = &RetainedReading> + Clone {
        self.retention.iter()
    }

    pub fn retention(&self) -> &Retention {
        &self.retention
    }

    /// Payloads that failed to parse.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Serializable view of the session for export.
    pub fn export(&self) -> SessionExport {
        SessionExport {
            threshold: self.threshold.value(),
            current: self.current,
            alerting: self.is_alerting(),
            stats: self.stats,
            received: self.retention.received(),
            dropped: self.dropped,
            readings: self.retention.iter().cloned().collect(),
        }
    }
}

/// Snapshot of a live session written by the export command.
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub threshold: f64,
    pub current: SensorReading,
    pub alerting: bool,
    pub stats: SessionStats,
    pub received: u64,
    pub dropped: u64,
    pub readings: Vec<RetainedReading>,
}
