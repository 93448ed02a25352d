//! Stream-based telemetry source.
//!
//! Replays newline-delimited sensor payloads from an async reader, such as a
//! file recorded from the data topic (`mosquitto_sub -t posture/project/data`).
//! Lines are emitted at a fixed pace to mimic the device's publish rate.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ConnectionStatus, SourceEvent, TelemetrySource};
use crate::error::Result;

/// A source that replays payloads read from an async stream.
///
/// The stream has no control channel: threshold publishes are accepted and
/// dropped.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use posture_pulse::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"pitch\": 4.0}\n";
/// let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example", None);
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<SourceEvent>,
    task: Option<JoinHandle<()>>,
    description: String,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// With `interval` set, one line is emitted per tick; otherwise lines are
    /// forwarded as fast as the receiver drains them.
    pub fn spawn<R>(reader: R, description: &str, interval: Option<Duration>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(256);

        let task = tokio::spawn(async move {
            let mut ticker = interval.map(tokio::time::interval);
            let mut lines = BufReader::new(reader).lines();

            if tx.send(SourceEvent::Status(ConnectionStatus::Connected)).await.is_err() {
                return;
            }

            loop {
                let status = match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if let Some(ticker) = ticker.as_mut() {
                            ticker.tick().await;
                        }
                        if tx.send(SourceEvent::Message(line.as_bytes().to_vec())).await.is_err() {
                            return;
                        }
                        continue;
                    }
                    Ok(None) => {
                        debug!("Replay stream reached end of input");
                        ConnectionStatus::Disconnected
                    }
                    Err(e) => {
                        warn!("Replay stream read error: {}", e);
                        ConnectionStatus::Error
                    }
                };
                let _ = tx.send(SourceEvent::Status(status)).await;
                return;
            }
        });

        Self {
            receiver: rx,
            task: Some(task),
            description: format!("replay: {}", description),
        }
    }
}

impl TelemetrySource for StreamSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        self.receiver.try_recv().ok()
    }

    fn publish(&mut self, payload: &str) -> Result<()> {
        debug!("Replay source has no control channel, dropping {}", payload);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.receiver.close();
    }
}

impl Drop for StreamSource {
    fn drop(&mut self) {
        self.close();
    }
}
