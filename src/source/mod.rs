//! Telemetry source abstraction.
//!
//! A [`TelemetrySource`] delivers raw message bodies from the sensor's data
//! channel together with connection status changes, and accepts outbound
//! control messages (the alert threshold). Implementations exist for a live
//! MQTT broker, an in-memory channel, and replay of recorded payloads.

mod channel;
mod mqtt;
mod stream;

pub use channel::{ChannelHandle, ChannelSource};
pub use mqtt::{map_event, MqttSource};
pub use stream::StreamSource;

use std::fmt::{self, Debug};

use serde::Serialize;

use crate::error::Result;

/// Connection state as shown in the header bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Something that happened on a source since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The connection moved to a new state.
    Status(ConnectionStatus),
    /// A message body arrived on the data channel.
    Message(Vec<u8>),
}

/// Trait for receiving sensor telemetry and sending control values.
///
/// # Example
///
/// ```
/// use posture_pulse::{ChannelSource, TelemetrySource};
///
/// let (handle, mut source) = ChannelSource::create("demo");
/// handle.send_payload(r#"{"pitch": 12.0, "calibrated": true}"#);
/// assert!(source.poll().is_some());
/// ```
pub trait TelemetrySource: Send + Debug {
    /// Take the next pending event, if any.
    ///
    /// This method must not block.
    fn poll(&mut self) -> Option<SourceEvent>;

    /// Send a payload on the control channel.
    ///
    /// Delivery is fire-and-forget; callers decide whether the connection
    /// state allows sending at all.
    fn publish(&mut self, payload: &str) -> Result<()>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Release the connection and every subscription held by the source.
    ///
    /// Calling `close` more than once is harmless.
    fn close(&mut self);
}
