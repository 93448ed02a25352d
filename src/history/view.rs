//! State of the History view: the last fetched records and the in-flight
//! request, if any.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::store::HistoryStore;
use crate::data::{
    chronological, hourly_averages, HistoricalRecord, HistoryPoint, HistorySummary, HourlyAverage,
};
use crate::error::Result;

type FetchResult = Result<Vec<HistoricalRecord>>;

/// Fetch-on-demand history state.
///
/// [`HistoryView::refresh`] starts a fetch on the runtime and sets the
/// loading flag; [`HistoryView::poll`] picks up the result without blocking.
/// A failed fetch keeps whatever was displayed before.
#[derive(Debug)]
pub struct HistoryView {
    store: Option<Arc<dyn HistoryStore>>,
    runtime: Handle,
    limit: usize,
    points: Vec<HistoryPoint>,
    summary: Option<HistorySummary>,
    hourly: Vec<HourlyAverage>,
    pending: Option<oneshot::Receiver<FetchResult>>,
    last_loaded: Option<DateTime<Local>>,
}

impl HistoryView {
    /// Create a view. With no store the view stays empty.
    pub fn new(store: Option<Arc<dyn HistoryStore>>, runtime: Handle, limit: usize) -> Self {
        Self {
            store,
            runtime,
            limit,
            points: Vec::new(),
            summary: None,
            hourly: Vec::new(),
            pending: None,
            last_loaded: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a fetch. Ignored while one is already in flight.
    ///
    /// Returns true when a request was started.
    pub fn refresh(&mut self) -> bool {
        let Some(store) = self.store.clone() else {
            return false;
        };
        if self.pending.is_some() {
            return false;
        }

        let (tx, rx) = oneshot::channel();
        let limit = self.limit;
        self.runtime.spawn(async move {
            let _ = tx.send(store.fetch_recent(limit).await);
        });
        self.pending = Some(rx);
        true
    }

    /// Apply a finished fetch, if there is one.
    ///
    /// Returns true when new records were loaded.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("History fetch was cancelled");
                self.pending = None;
                return false;
            }
        };
        self.pending = None;

        match outcome {
            Ok(records) => {
                info!("Loaded {} history records", records.len());
                self.apply(records);
                true
            }
            Err(e) => {
                warn!("History fetch failed: {}", e);
                false
            }
        }
    }

    fn apply(&mut self, records: Vec<HistoricalRecord>) {
        self.points = chronological(records);
        self.summary = HistorySummary::from_points(&self.points);
        self.hourly = hourly_averages(&self.points);
        self.last_loaded = Some(Local::now());
    }

    /// Displayed points, oldest first.
    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn summary(&self) -> Option<&HistorySummary> {
        self.summary.as_ref()
    }

    pub fn hourly(&self) -> &[HourlyAverage] {
        &self.hourly
    }

    pub fn last_loaded(&self) -> Option<DateTime<Local>> {
        self.last_loaded
    }

    pub fn store_description(&self) -> Option<&str> {
        self.store.as_deref().map(|s| s.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Store that replays scripted outcomes, newest-first like the real one.
    #[derive(Debug, Default)]
    struct ScriptedStore {
        outcomes: Mutex<Vec<FetchResult>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl HistoryStore for ScriptedStore {
        async fn fetch_recent(&self, limit: usize) -> Result<Vec<HistoricalRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let next = self.outcomes.lock().unwrap().remove(0);
            next.map(|mut records| {
                records.truncate(limit);
                records
            })
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn records_desc(count: usize) -> Vec<HistoricalRecord> {
        let base = crate::data::history::parse_timestamp("2024-12-02T09:00:00Z").unwrap();
        (0..count)
            .rev()
            .map(|i| HistoricalRecord {
                created_at: base + chrono::Duration::minutes(i as i64),
                pitch: i as f64,
                is_slouching: i % 2 == 0,
            })
            .collect()
    }

    async fn settle(view: &mut HistoryView) -> bool {
        for _ in 0..100 {
            if view.poll() {
                return true;
            }
            if !view.is_loading() {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_refresh_loads_in_ascending_order() {
        let store = Arc::new(ScriptedStore {
            outcomes: Mutex::new(vec![Ok(records_desc(120))]),
            ..Default::default()
        });
        let mut view = HistoryView::new(Some(store), Handle::current(), 100);

        assert!(view.refresh());
        assert!(view.is_loading());
        assert!(settle(&mut view).await);
        assert!(!view.is_loading());

        let points = view.points();
        assert_eq!(points.len(), 100);
        assert!(points.windows(2).all(|w| w[0].created_at < w[1].created_at));
        assert_eq!(view.summary().unwrap().total, 100);
        assert!(!view.hourly().is_empty());
        assert!(view.last_loaded().is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let store = Arc::new(ScriptedStore {
            outcomes: Mutex::new(vec![
                Ok(records_desc(3)),
                Err(Error::Timeout),
            ]),
            ..Default::default()
        });
        let mut view = HistoryView::new(Some(store.clone()), Handle::current(), 100);

        view.refresh();
        assert!(settle(&mut view).await);
        let before = view.points().to_vec();

        view.refresh();
        assert!(!settle(&mut view).await);
        assert!(!view.is_loading());
        assert_eq!(view.points(), before.as_slice());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_ignored_while_loading() {
        let store = Arc::new(ScriptedStore {
            outcomes: Mutex::new(vec![Ok(records_desc(2))]),
            delay: Duration::from_millis(30),
            ..Default::default()
        });
        let mut view = HistoryView::new(Some(store.clone()), Handle::current(), 100);

        assert!(view.refresh());
        assert!(!view.refresh());
        assert!(settle(&mut view).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_view_stays_empty() {
        let mut view = HistoryView::new(None, Handle::current(), 100);
        assert!(!view.is_configured());
        assert!(!view.refresh());
        assert!(!view.is_loading());
        assert!(!view.poll());
        assert!(view.points().is_empty());
    }
}
