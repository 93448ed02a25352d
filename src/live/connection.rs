//! Connection lifecycle and the threshold control path.

use tracing::{debug, info, warn};

use crate::data::Threshold;
use crate::source::{ConnectionStatus, SourceEvent, TelemetrySource};

/// Owns one telemetry source and tracks its connection status.
///
/// The source is closed when the manager is closed or dropped, which
/// releases the broker connection and its subscriptions.
#[derive(Debug)]
pub struct ConnectionManager {
    source: Box<dyn TelemetrySource>,
    status: ConnectionStatus,
    published: u64,
    closed: bool,
}

impl ConnectionManager {
    pub fn new(source: Box<dyn TelemetrySource>) -> Self {
        Self {
            source,
            status: ConnectionStatus::Connecting,
            published: 0,
            closed: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn description(&self) -> &str {
        self.source.description()
    }

    /// Number of threshold values handed to the source so far.
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Take the next data-channel message, applying any status changes
    /// queued before it.
    pub fn next_message(&mut self) -> Option<Vec<u8>> {
        if self.closed {
            return None;
        }
        loop {
            match self.source.poll()? {
                SourceEvent::Status(status) => self.set_status(status),
                SourceEvent::Message(body) => return Some(body),
            }
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if status != self.status {
            info!("Connection status: {} -> {}", self.status, status);
            self.status = status;
        }
    }

    /// Send the threshold on the control channel if, and only if, connected.
    ///
    /// Returns true when the value was handed to the source. Nothing is
    /// queued for later delivery.
    pub fn publish_threshold(&mut self, threshold: Threshold) -> bool {
        if self.closed || !self.is_connected() {
            debug!(
                "Not publishing threshold {} while {}",
                threshold.to_payload(),
                self.status
            );
            return false;
        }

        match self.source.publish(&threshold.to_payload()) {
            Ok(()) => {
                self.published += 1;
                info!("Published threshold: {}", threshold.to_payload());
                true
            }
            Err(e) => {
                warn!("Threshold publish failed: {}", e);
                false
            }
        }
    }

    /// Close the source. Further polls yield nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.source.close();
        self.closed = true;
        self.set_status(ConnectionStatus::Disconnected);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}
