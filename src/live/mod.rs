//! The live ingestion view's state.
//!
//! [`LiveSession`] ties a [`ConnectionManager`] to a [`LiveTracker`]. The UI
//! loop calls [`LiveSession::pump`] once per tick; every mutation happens
//! inside that call or inside [`LiveSession::adjust_threshold`], so the
//! state has a single writer.

mod connection;
mod tracker;

pub use connection::ConnectionManager;
pub use tracker::{Ingested, LiveTracker, SessionExport};

use chrono::Local;

use crate::data::{RetentionPolicy, Threshold};
use crate::source::{ConnectionStatus, TelemetrySource};

/// Upper bound on messages applied per pump, so one tick cannot starve
/// input handling when a backlog builds up.
const MAX_MESSAGES_PER_PUMP: usize = 4096;

/// Result of draining the source once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    pub messages: usize,
    pub malformed: usize,
    /// An alert began during this pump.
    pub alert_started: bool,
}

#[derive(Debug)]
pub struct LiveSession {
    connection: ConnectionManager,
    tracker: LiveTracker,
    /// Local-only toggle for the audible alert.
    pub alert_audio: bool,
    was_alerting: bool,
}

impl LiveSession {
    pub fn new(
        source: Box<dyn TelemetrySource>,
        policy: RetentionPolicy,
        threshold: Threshold,
        alert_audio: bool,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(source),
            tracker: LiveTracker::new(policy, threshold),
            alert_audio,
            was_alerting: false,
        }
    }

    /// Apply every pending source event.
    pub fn pump(&mut self) -> PumpSummary {
        let mut summary = PumpSummary::default();

        while summary.messages < MAX_MESSAGES_PER_PUMP {
            let Some(body) = self.connection.next_message() else {
                break;
            };
            summary.messages += 1;
            if self.tracker.ingest(&body, Local::now()).is_err() {
                summary.malformed += 1;
                continue;
            }

            let alerting = self.tracker.is_alerting();
            if alerting && !self.was_alerting {
                summary.alert_started = true;
            }
            self.was_alerting = alerting;
        }

        summary
    }

    /// Move the threshold by `delta` whole degrees and publish it.
    ///
    /// The new value always applies locally. Returns whether it was sent.
    pub fn adjust_threshold(&mut self, delta: i32) -> bool {
        let next = self.tracker.threshold().step(delta);
        self.set_threshold(next)
    }

    /// Apply a threshold locally and publish it if connected.
    pub fn set_threshold(&mut self, threshold: Threshold) -> bool {
        self.tracker.set_threshold(threshold);
        self.connection.publish_threshold(threshold)
    }

    pub fn toggle_alert_audio(&mut self) {
        self.alert_audio = !self.alert_audio;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn tracker(&self) -> &LiveTracker {
        &self.tracker
    }

    /// Tear down the connection.
    pub fn close(&mut self) {
        self.connection.close();
    }
}
