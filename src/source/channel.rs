//! Channel-based telemetry source.
//!
//! Events are pushed through an in-memory channel instead of a broker. This
//! is useful when embedding the dashboard next to another transport, and it
//! is what the tests drive the live pipeline with.

use tokio::sync::mpsc;

use super::{ConnectionStatus, SourceEvent, TelemetrySource};
use crate::error::{Error, Result};

/// A source fed through an unbounded channel.
///
/// # Example
///
/// ```
/// use posture_pulse::{ChannelSource, ConnectionStatus};
///
/// let (handle, source) = ChannelSource::create("bench-rig");
/// handle.send_status(ConnectionStatus::Connected);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    events: Option<mpsc::UnboundedReceiver<SourceEvent>>,
    published: mpsc::UnboundedSender<String>,
    description: String,
}

/// The producer side of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelHandle {
    events: mpsc::UnboundedSender<SourceEvent>,
    published: mpsc::UnboundedReceiver<String>,
}

impl ChannelSource {
    /// Create a connected (handle, source) pair.
    pub fn create(source_description: &str) -> (ChannelHandle, Self) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();
        let source = Self {
            events: Some(event_rx),
            published: publish_tx,
            description: format!("channel: {}", source_description),
        };
        let handle = ChannelHandle {
            events: event_tx,
            published: publish_rx,
        };
        (handle, source)
    }
}

impl TelemetrySource for ChannelSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    fn publish(&mut self, payload: &str) -> Result<()> {
        if self.events.is_none() {
            return Err(Error::Connection("source closed".to_string()));
        }
        self.published
            .send(payload.to_string())
            .map_err(|_| Error::Connection("control receiver dropped".to_string()))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn close(&mut self) {
        self.events = None;
    }
}

impl ChannelHandle {
    /// Push a status change. Returns false once the source is closed.
    pub fn send_status(&self, status: ConnectionStatus) -> bool {
        self.events.send(SourceEvent::Status(status)).is_ok()
    }

    /// Push a raw data-channel message. Returns false once the source is closed.
    pub fn send_payload(&self, payload: impl Into<Vec<u8>>) -> bool {
        self.events.send(SourceEvent::Message(payload.into())).is_ok()
    }

    /// Drain everything published on the control channel so far.
    pub fn take_published(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(payload) = self.published.try_recv() {
            out.push(payload);
        }
        out
    }

    /// True once the source has been closed or dropped.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll() {
        let (handle, mut source) = ChannelSource::create("test");

        assert!(source.poll().is_none());

        handle.send_status(ConnectionStatus::Connected);
        handle.send_payload(r#"{"pitch": 1}"#);

        assert_eq!(
            source.poll(),
            Some(SourceEvent::Status(ConnectionStatus::Connected))
        );
        assert!(matches!(source.poll(), Some(SourceEvent::Message(_))));
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_channel_source_publish() {
        let (mut handle, mut source) = ChannelSource::create("test");
        source.publish("35").unwrap();
        source.publish("36").unwrap();
        assert_eq!(handle.take_published(), vec!["35", "36"]);
        assert!(handle.take_published().is_empty());
    }

    #[test]
    fn test_channel_source_close_releases() {
        let (handle, mut source) = ChannelSource::create("test");
        assert!(!handle.is_closed());

        source.close();
        source.close();

        assert!(handle.is_closed());
        assert!(!handle.send_payload("{}"));
        assert!(source.poll().is_none());
        assert!(source.publish("30").is_err());
    }

    #[test]
    fn test_channel_source_description() {
        let (_handle, source) = ChannelSource::create("bench");
        assert_eq!(source.description(), "channel: bench");
    }
}
