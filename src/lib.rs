//! # posture-pulse
//!
//! A terminal dashboard and library for a wearable posture sensor.
//!
//! The sensor publishes its orientation as JSON over MQTT at roughly 50 Hz.
//! This crate ingests that stream, keeps a decimated and bounded window of
//! readings, flags slouching against an adjustable threshold (which it
//! publishes back to the device), derives session statistics, and shows the
//! persisted history fetched from a REST table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   live   │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │ history  │    │(render) │    │         │  │
//! │  └─────────┘    └────┬─────┘    └─────────┘    └─────────┘  │
//! │                      │ uses                                 │
//! │                      ▼                                      │
//! │  ┌─────────┐    ┌──────────┐                                │
//! │  │ source  │───▶│   data   │                                │
//! │  │ (input) │    │ (model)  │                                │
//! │  └─────────┘    └──────────┘                                │
//! │   MqttSource | StreamSource | ChannelSource                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Telemetry input ([`TelemetrySource`] trait) for an MQTT
//!   broker, a replayed recording, or an in-process channel
//! - **[`data`]**: Readings, threshold, retention, statistics and history
//!   aggregation. Pure and synchronous.
//! - **[`live`]**: Connection status tracking and the live session state
//! - **[`history`]**: The REST history store and the non-blocking fetch
//!   state behind the History view
//! - **[`app`]**, **[`events`]**, **[`ui`]**: TUI state, input handling and
//!   ratatui rendering
//! - **[`config`]**: Layered settings (file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Connect to a broker
//! posture-pulse --host 10.192.37.112
//!
//! # Replay a recording of the data topic
//! posture-pulse --replay session.jsonl
//!
//! # Dump the cloud history to a file and exit
//! posture-pulse --config posture.toml --export-history history.json
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use posture_pulse::{ChannelSource, ConnectionStatus, LiveSession, RetentionPolicy, Threshold};
//!
//! let (handle, source) = ChannelSource::create("bench");
//! let mut session = LiveSession::new(
//!     Box::new(source),
//!     RetentionPolicy::default(),
//!     Threshold::default(),
//!     false,
//! );
//!
//! handle.send_status(ConnectionStatus::Connected);
//! handle.send_payload(r#"{"pitch": 42.0, "calibrated": true}"#);
//! let summary = session.pump();
//!
//! assert_eq!(summary.messages, 1);
//! assert!(summary.alert_started);
//! assert!(session.tracker().is_alerting());
//! ```
//!
//! ### As a library with a stream source
//!
//! ```no_run
//! use std::io::Cursor;
//! use posture_pulse::{LiveSession, RetentionPolicy, StreamSource, Threshold};
//!
//! # tokio_test::block_on(async {
//! let data = b"{\"pitch\": 12.0, \"calibrated\": true}\n";
//! let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example", None);
//! let session = LiveSession::new(
//!     Box::new(source),
//!     RetentionPolicy::default(),
//!     Threshold::default(),
//!     true,
//! );
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod history;
pub mod live;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    HistoricalRecord, HistoryPoint, HistorySummary, HourlyAverage, RetainedReading, Retention,
    RetentionPolicy, SensorReading, SessionStats, Threshold,
};
pub use error::{Error, Result};
pub use live::LiveSession;
pub use source::{
    ChannelHandle, ChannelSource, ConnectionStatus, MqttSource, SourceEvent, StreamSource,
    TelemetrySource,
};
