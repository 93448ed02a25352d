//! MQTT broker source.
//!
//! Runs the `rumqttc` event loop on a background tokio task and forwards
//! connection state changes and data-topic messages to the UI thread through
//! a bounded channel. The threshold is published with QoS 0 through the
//! client's non-blocking request queue.

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, StateError,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{ConnectionStatus, SourceEvent, TelemetrySource};
use crate::config::BrokerSettings;
use crate::error::Result;

/// Capacity of the client request queue and of the event channel.
const REQUEST_CAPACITY: usize = 10;
const EVENT_CAPACITY: usize = 1024;

/// How long the event loop may run after `close` to flush DISCONNECT.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// A source connected to an MQTT broker.
#[derive(Debug)]
pub struct MqttSource {
    client: AsyncClient,
    receiver: mpsc::Receiver<SourceEvent>,
    task: Option<JoinHandle<()>>,
    runtime: Handle,
    threshold_topic: String,
    description: String,
}

impl MqttSource {
    /// Connect to the broker described by `settings`.
    ///
    /// Must be called from within a tokio runtime context; the event loop
    /// is spawned onto it.
    pub fn spawn(settings: &BrokerSettings) -> Self {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs.max(1)));
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);

        info!(
            "Connecting to MQTT broker {}:{} as {}",
            settings.host, settings.port, settings.client_id
        );

        let runtime = Handle::current();
        let task = runtime.spawn(run_event_loop(
            eventloop,
            client.clone(),
            settings.data_topic.clone(),
            tx,
            Duration::from_millis(settings.reconnect_delay_ms),
        ));

        Self {
            client,
            receiver: rx,
            task: Some(task),
            runtime,
            threshold_topic: settings.threshold_topic.clone(),
            description: format!("mqtt://{}:{}/{}", settings.host, settings.port, settings.data_topic),
        }
    }
}

/// Drive the client until DISCONNECT has been flushed or the source is gone.
///
/// Sends fail once the source is closed; the loop keeps polling so a queued
/// DISCONNECT still reaches the broker.
async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    data_topic: String,
    tx: mpsc::Sender<SourceEvent>,
    reconnect_delay: Duration,
) {
    let mut connected = false;
    let _ = tx.send(SourceEvent::Status(ConnectionStatus::Connecting)).await;

    loop {
        match eventloop.poll().await {
            Ok(event) => {
                if let Event::Incoming(Packet::ConnAck(ack)) = &event {
                    if ack.code == ConnectReturnCode::Success {
                        connected = true;
                        info!("MQTT connected, subscribing to {}", data_topic);
                        if let Err(e) = client.try_subscribe(&data_topic, QoS::AtMostOnce) {
                            warn!("Failed to subscribe to {}: {}", data_topic, e);
                        }
                    }
                }

                let disconnecting = matches!(event, Event::Outgoing(Outgoing::Disconnect));
                if let Some(mapped) = map_event(&event, &data_topic) {
                    let _ = tx.send(mapped).await;
                }
                if disconnecting {
                    debug!("DISCONNECT sent, stopping MQTT event loop");
                    return;
                }
            }
            Err(e) => {
                if tx.is_closed() {
                    debug!("MQTT source closed, stopping event loop: {}", e);
                    return;
                }

                let status = status_after_error(&e, connected);
                connected = false;
                if status == ConnectionStatus::Disconnected {
                    warn!("MQTT connection lost: {}", e);
                } else {
                    error!("MQTT connection error: {}", e);
                }
                let _ = tx.send(SourceEvent::Status(status)).await;

                // The client reconnects on the next poll.
                tokio::time::sleep(reconnect_delay).await;
                let _ = tx.send(SourceEvent::Status(ConnectionStatus::Connecting)).await;
            }
        }
    }
}

/// Status to report after the client returned `error`.
///
/// A network failure on an established session is a disconnect. Failures
/// while connecting, refused connections and protocol errors are errors.
pub fn status_after_error(error: &ConnectionError, was_connected: bool) -> ConnectionStatus {
    let dropped = matches!(
        error,
        ConnectionError::Io(_)
            | ConnectionError::NetworkTimeout
            | ConnectionError::FlushTimeout
            | ConnectionError::MqttState(StateError::Io(_))
            | ConnectionError::MqttState(StateError::AwaitPingResp)
    );
    if was_connected && dropped {
        ConnectionStatus::Disconnected
    } else {
        ConnectionStatus::Error
    }
}

/// Translate a raw client event into a source event.
///
/// Messages on topics other than `data_topic` are ignored.
pub fn map_event(event: &Event, data_topic: &str) -> Option<SourceEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) => {
            if ack.code == ConnectReturnCode::Success {
                Some(SourceEvent::Status(ConnectionStatus::Connected))
            } else {
                warn!("Broker refused connection: {:?}", ack.code);
                Some(SourceEvent::Status(ConnectionStatus::Error))
            }
        }
        Event::Incoming(Packet::Publish(publish)) if publish.topic == data_topic => {
            Some(SourceEvent::Message(publish.payload.to_vec()))
        }
        Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect) => {
            Some(SourceEvent::Status(ConnectionStatus::Disconnected))
        }
        _ => None,
    }
}

impl TelemetrySource for MqttSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        self.receiver.try_recv().ok()
    }

    fn publish(&mut self, payload: &str) -> Result<()> {
        self.client.try_publish(
            self.threshold_topic.as_str(),
            QoS::AtMostOnce,
            false,
            payload.to_string(),
        )?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn close(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        self.receiver.close();

        match self.client.try_disconnect() {
            Ok(()) => {
                self.runtime.spawn(async move {
                    if tokio::time::timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
                        debug!("MQTT event loop did not stop in time, aborting");
                        task.abort();
                    }
                });
            }
            Err(e) => {
                debug!("MQTT disconnect request failed: {}", e);
                task.abort();
            }
        }
        info!("MQTT source closed");
    }
}

impl Drop for MqttSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, Publish};
    use std::io;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

    const TOPIC: &str = "posture/project/data";

    #[test]
    fn test_connack_maps_to_connected() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(
            map_event(&event, TOPIC),
            Some(SourceEvent::Status(ConnectionStatus::Connected))
        );
    }

    #[test]
    fn test_refused_connack_maps_to_error() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::NotAuthorized,
            false,
        )));
        assert_eq!(
            map_event(&event, TOPIC),
            Some(SourceEvent::Status(ConnectionStatus::Error))
        );
    }

    #[test]
    fn test_publish_on_data_topic_maps_to_message() {
        let body = br#"{"pitch": 3.5}"#.to_vec();
        let event = Event::Incoming(Packet::Publish(Publish::new(
            TOPIC,
            QoS::AtMostOnce,
            body.clone(),
        )));
        assert_eq!(map_event(&event, TOPIC), Some(SourceEvent::Message(body)));
    }

    #[test]
    fn test_other_topics_are_ignored() {
        let event = Event::Incoming(Packet::Publish(Publish::new(
            "posture/project/threshold",
            QoS::AtMostOnce,
            b"30".to_vec(),
        )));
        assert_eq!(map_event(&event, TOPIC), None);
        assert_eq!(map_event(&Event::Outgoing(Outgoing::PingReq), TOPIC), None);
    }

    #[test]
    fn test_disconnect_maps_to_disconnected() {
        assert_eq!(
            map_event(&Event::Incoming(Packet::Disconnect), TOPIC),
            Some(SourceEvent::Status(ConnectionStatus::Disconnected))
        );
        assert_eq!(
            map_event(&Event::Outgoing(Outgoing::Disconnect), TOPIC),
            Some(SourceEvent::Status(ConnectionStatus::Disconnected))
        );
    }

    #[tokio::test]
    async fn test_spawn_reports_connecting_and_closes() {
        let settings = BrokerSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..BrokerSettings::default()
        };
        let mut source = MqttSource::spawn(&settings);
        assert_eq!(source.description(), "mqtt://127.0.0.1:1/posture/project/data");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            source.poll(),
            Some(SourceEvent::Status(ConnectionStatus::Connecting))
        );

        source.close();
        source.close();
    }

    #[test]
    fn test_network_error_after_connect_is_disconnect() {
        let reset = || io::Error::new(io::ErrorKind::ConnectionReset, "reset");

        assert_eq!(
            status_after_error(&ConnectionError::Io(reset()), true),
            ConnectionStatus::Disconnected
        );
        assert_eq!(
            status_after_error(&ConnectionError::MqttState(StateError::Io(reset())), true),
            ConnectionStatus::Disconnected
        );
        assert_eq!(
            status_after_error(&ConnectionError::Io(reset()), false),
            ConnectionStatus::Error
        );
        assert_eq!(
            status_after_error(
                &ConnectionError::ConnectionRefused(ConnectReturnCode::NotAuthorized),
                true
            ),
            ConnectionStatus::Error
        );
    }

    /// Accept one client, answer its CONNECT, then hold the socket for
    /// `hold` before dropping it. Returns the port and everything read after
    /// the CONNACK.
    async fn fake_broker(hold: Option<Duration>) -> (u16, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            socket.read(&mut buf).await.unwrap();
            socket.write_all(&CONNACK).await.unwrap();

            let mut received = Vec::new();
            match hold {
                Some(hold) => tokio::time::sleep(hold).await,
                None => loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                },
            }
            received
        });

        (port, handle)
    }

    fn local_settings(port: u16) -> BrokerSettings {
        BrokerSettings {
            host: "127.0.0.1".to_string(),
            port,
            reconnect_delay_ms: 50,
            ..BrokerSettings::default()
        }
    }

    /// Collect statuses until `count` have arrived or three seconds pass.
    async fn statuses(source: &mut MqttSource, count: usize) -> Vec<ConnectionStatus> {
        let mut seen = Vec::new();
        for _ in 0..300 {
            while let Some(event) = source.poll() {
                if let SourceEvent::Status(status) = event {
                    seen.push(status);
                }
            }
            if seen.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        seen
    }

    #[tokio::test]
    async fn test_broker_drop_reports_disconnected_then_connecting() {
        let (port, _broker) = fake_broker(Some(Duration::from_millis(200))).await;
        let mut source = MqttSource::spawn(&local_settings(port));

        let seen = statuses(&mut source, 4).await;
        assert_eq!(
            &seen[..4],
            &[
                ConnectionStatus::Connecting,
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connecting,
            ]
        );

        source.close();
    }

    #[tokio::test]
    async fn test_close_sends_disconnect_packet() {
        let (port, broker) = fake_broker(None).await;
        let mut source = MqttSource::spawn(&local_settings(port));

        let seen = statuses(&mut source, 2).await;
        assert_eq!(
            seen,
            vec![ConnectionStatus::Connecting, ConnectionStatus::Connected]
        );

        source.close();

        let received = tokio::time::timeout(Duration::from_secs(2), broker)
            .await
            .unwrap()
            .unwrap();
        assert!(received.windows(2).any(|w| w == [0xE0, 0x00]));
    }
}
