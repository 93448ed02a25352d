//! Persisted posture records and the aggregates shown in the History view.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the `posture_history` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub pitch: f64,
    #[serde(default)]
    pub is_slouching: bool,
}

/// Accepts RFC 3339 (`timestamptz`) and naive ISO timestamps, which are
/// taken to be UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// A record prepared for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// Local time label, `HH:MM:SS`.
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub pitch: f64,
    pub slouching: bool,
}

impl From<HistoricalRecord> for HistoryPoint {
    fn from(record: HistoricalRecord) -> Self {
        Self {
            time: record.created_at.with_timezone(&Local).format("%H:%M:%S").to_string(),
            created_at: record.created_at,
            pitch: record.pitch,
            slouching: record.is_slouching,
        }
    }
}

/// Turn a newest-first query result into oldest-first chart points.
pub fn chronological(mut records: Vec<HistoricalRecord>) -> Vec<HistoryPoint> {
    records.reverse();
    records.into_iter().map(HistoryPoint::from).collect()
}

/// Summary over the displayed history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySummary {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub slouch_count: usize,
    pub total: usize,
}

impl HistorySummary {
    /// Returns `None` for an empty history.
    pub fn from_points(points: &[HistoryPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let total = points.len();
        let sum: f64 = points.iter().map(|p| p.pitch).sum();
        let max = points.iter().map(|p| p.pitch).fold(f64::MIN, f64::max);
        let min = points.iter().map(|p| p.pitch).fold(f64::MAX, f64::min);
        let slouch_count = points.iter().filter(|p| p.slouching).count();

        Some(Self {
            average: sum / total as f64,
            max,
            min,
            slouch_count,
            total,
        })
    }

    pub fn slouch_percent(&self) -> f64 {
        self.slouch_count as f64 / self.total as f64 * 100.0
    }
}

/// Per-hour aggregate of history points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyAverage {
    /// Local calendar date of the bucket.
    pub date: NaiveDate,
    /// Local hour of day, 0..=23.
    pub hour: u32,
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub readings: usize,
}

/// Bucket points by local date and hour, ordered by time.
pub fn hourly_averages(points: &[HistoryPoint]) -> Vec<HourlyAverage> {
    let mut buckets: BTreeMap<(NaiveDate, u32), Vec<f64>> = BTreeMap::new();
    for point in points {
        let local = point.created_at.with_timezone(&Local);
        buckets
            .entry((local.date_naive(), local.hour()))
            .or_default()
            .push(point.pitch);
    }

    buckets
        .into_iter()
        .map(|((date, hour), pitches)| {
            let readings = pitches.len();
            HourlyAverage {
                date,
                hour,
                average: pitches.iter().sum::<f64>() / readings as f64,
                max: pitches.iter().copied().fold(f64::MIN, f64::max),
                min: pitches.iter().copied().fold(f64::MAX, f64::min),
                readings,
            }
        })
        .collect()
}
