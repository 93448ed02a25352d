//! Decimation and bounded retention of live readings.
//!
//! The device publishes at roughly 50 Hz. Only every Nth parsed reading is
//! kept for charting, and at most `capacity` of those are retained; the oldest
//! entry is evicted first.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::reading::SensorReading;
use crate::error::{Error, Result};

/// Default sampling factor: 50 Hz input becomes 5 retained points per second.
pub const DEFAULT_DECIMATION: usize = 10;

/// Default number of retained points.
pub const DEFAULT_CAPACITY: usize = 100;

/// Sampling and buffer-size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Keep one reading out of every `decimation` received.
    pub decimation: usize,
    /// Maximum number of retained readings.
    pub capacity: usize,
}

impl RetentionPolicy {
    pub fn new(decimation: usize, capacity: usize) -> Result<Self> {
        let policy = Self {
            decimation,
            capacity,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimation == 0 {
            return Err(Error::InvalidRetention("decimation must be at least 1".into()));
        }
        if self.capacity == 0 {
            return Err(Error::InvalidRetention("capacity must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            decimation: DEFAULT_DECIMATION,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// A reading kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedReading {
    /// Local wall-clock time of receipt, `HH:MM:SS`.
    pub time: String,
    /// Absolute pitch in degrees.
    pub pitch: f64,
    /// Absolute roll in degrees.
    pub roll: f64,
    /// Signed yaw in degrees.
    pub yaw: f64,
    /// Receipt time as epoch milliseconds.
    pub timestamp: i64,
}

impl RetainedReading {
    pub fn from_reading(reading: &SensorReading, received_at: DateTime<Local>) -> Self {
        Self {
            time: received_at.format("%H:%M:%S").to_string(),
            pitch: reading.pitch.abs(),
            roll: reading.roll.abs(),
            yaw: reading.yaw,
            timestamp: received_at.timestamp_millis(),
        }
    }
}

/// Receipt counter plus capped FIFO of retained readings.
#[derive(Debug, Clone)]
pub struct Retention {
    policy: RetentionPolicy,
    received: u64,
    readings: VecDeque<RetainedReading>,
}

impl Default for Retention {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl Retention {
    pub fn new(policy: RetentionPolicy) -> Self {
        // Guard against a policy built by hand with zero fields.
        let policy = RetentionPolicy {
            decimation: policy.decimation.max(1),
            capacity: policy.capacity.max(1),
        };
        Self {
            policy,
            received: 0,
            readings: VecDeque::with_capacity(policy.capacity),
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Count a parsed reading, retaining it if it falls on the sampling step.
    ///
    /// Returns the retained entry when one was appended.
    pub fn record(
        &mut self,
        reading: &SensorReading,
        received_at: DateTime<Local>,
    ) -> Option<&RetainedReading> {
        self.received += 1;
        if self.received % self.policy.decimation as u64 != 0 {
            return None;
        }

        self.readings.push_back(RetainedReading::from_reading(reading, received_at));
        while self.readings.len() > self.policy.capacity {
            self.readings.pop_front();
        }
        self.readings.back()
    }

    /// Total parsed readings seen so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Retained readings, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RetainedReading> + Clone {
        self.readings.iter()
    }

    pub fn latest(&self) -> Option<&RetainedReading> {
        self.readings.back()
    }
}
