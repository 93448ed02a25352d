//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::history::HistoryView;
use crate::live::LiveSession;
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Live sensor readings, threshold and session stats.
    Live,
    /// Persisted records fetched from the history store.
    History,
}

impl View {
    /// Cycle to the other view.
    pub fn next(self) -> Self {
        match self {
            View::Live => View::History,
            View::History => View::Live,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Live => "Live",
            View::History => "History",
        }
    }
}

/// What happened during one [`App::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Sensor messages applied.
    pub messages: usize,
    /// The terminal bell should ring.
    pub ring_bell: bool,
    /// A history fetch completed with new data.
    pub history_loaded: bool,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    pub live: LiveSession,
    pub history: HistoryView,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around a live session and a history view.
    pub fn new(live: LiveSession, history: HistoryView) -> Self {
        Self {
            running: true,
            current_view: View::Live,
            show_help: false,
            live,
            history,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the live data source.
    pub fn source_description(&self) -> &str {
        self.live.connection().description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Apply pending telemetry and finished history fetches.
    pub fn tick(&mut self) -> TickOutcome {
        let pumped = self.live.pump();
        let history_loaded = self.history.poll();

        TickOutcome {
            messages: pumped.messages,
            ring_bell: pumped.alert_started && self.live.alert_audio,
            history_loaded,
        }
    }

    /// Switch to the other view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move the threshold slider by `delta` degrees.
    pub fn adjust_threshold(&mut self, delta: i32) {
        let published = self.live.adjust_threshold(delta);
        let value = self.live.tracker().threshold();
        if published {
            self.set_status_message(format!("Threshold {} sent to device", value));
        } else {
            self.set_status_message(format!(
                "Threshold {} applied locally ({})",
                value,
                self.live.status()
            ));
        }
    }

    /// Toggle the audible alert.
    pub fn toggle_alert_audio(&mut self) {
        self.live.toggle_alert_audio();
        let state = if self.live.alert_audio { "enabled" } else { "disabled" };
        self.set_status_message(format!("Alert audio {}", state));
    }

    /// Start a history fetch.
    pub fn refresh_history(&mut self) {
        if !self.history.is_configured() {
            self.set_status_message("No history store configured".to_string());
        } else if self.history.refresh() {
            self.set_status_message("Loading cloud data...".to_string());
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit and release the broker connection.
    pub fn quit(&mut self) {
        self.running = false;
        self.live.close();
    }

    /// Export the live session and the loaded history summary to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let tracker = self.live.tracker();

        let export = serde_json::json!({
            "source": self.source_description(),
            "status": self.live.status(),
            "published_thresholds": self.live.connection().published_count(),
            "session": tracker.export(),
            "history": {
                "summary": self.history.summary(),
                "hourly": self.history.hourly(),
                "points": self.history.points().len(),
            },
        });

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;

        Ok(())
    }
}
