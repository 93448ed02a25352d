//! Data models and derived-state computations.
//!
//! Everything in here is pure: no I/O, no clocks read implicitly. Callers pass
//! receipt times in, which keeps the live pipeline deterministic under test.
//!
//! ## Submodules
//!
//! - [`reading`]: decoded sensor payloads ([`SensorReading`])
//! - [`threshold`]: the alert threshold and its [5, 60] range ([`Threshold`])
//! - [`retention`]: decimation plus the capped buffer of [`RetainedReading`]s
//! - [`stats`]: alert evaluation and [`SessionStats`]
//! - [`history`]: persisted records, chronological ordering and aggregates
//!
//! ## Data Flow
//!
//! ```text
//! payload bytes
//!        │
//!        ▼
//! SensorReading::parse()
//!        │
//!        ├──▶ is_alerting()              (current instant)
//!        │
//!        └──▶ Retention::record()        (every Nth reading)
//!                    │
//!                    ▼
//!             SessionStats::compute()    (with Threshold)
//! ```

pub mod history;
pub mod reading;
pub mod retention;
pub mod stats;
pub mod threshold;

pub use history::{
    chronological, hourly_averages, HistoricalRecord, HistoryPoint, HistorySummary, HourlyAverage,
};
pub use reading::SensorReading;
pub use retention::{RetainedReading, Retention, RetentionPolicy};
pub use stats::{is_alerting, posture_level, PostureLevel, SessionStats};
pub use threshold::Threshold;
