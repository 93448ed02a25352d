//! Keyboard and mouse input handling.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, View};
use crate::ui::common::tab_at;

/// File written by the export key.
pub const EXPORT_FILE: &str = "posture_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => app.next_view(),
        KeyCode::Char('1') => app.set_view(View::Live),
        KeyCode::Char('2') => app.set_view(View::History),

        // Threshold slider
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_threshold(1),
        KeyCode::Down | KeyCode::Char('-') => app.adjust_threshold(-1),

        KeyCode::Char('a') => app.toggle_alert_audio(),

        KeyCode::Char('r') => app.refresh_history(),

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle mouse events
///
/// A left click on the tab bar selects the tab under the cursor.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, tabs_area: Rect) {
    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        if mouse.row == tabs_area.y {
            if let Some(view) = tab_at(mouse.column, tabs_area) {
                app.set_view(view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RetentionPolicy, Threshold};
    use crate::history::HistoryView;
    use crate::live::LiveSession;
    use crate::source::{ChannelHandle, ChannelSource, ConnectionStatus};
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn app() -> (ChannelHandle, App) {
        let (handle, source) = ChannelSource::create("test");
        let live = LiveSession::new(
            Box::new(source),
            RetentionPolicy::default(),
            Threshold::default(),
            true,
        );
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let history = HistoryView::new(None, runtime.handle().clone(), 100);
        drop(runtime);
        (handle, App::new(live, history))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_view_keys() {
        let (_handle, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.current_view, View::History);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Live);
        handle_key_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.current_view, View::History);
        handle_key_event(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.current_view, View::Live);
    }

    #[test]
    fn test_threshold_keys() {
        let (mut handle, mut app) = app();
        handle.send_status(ConnectionStatus::Connected);
        app.tick();

        handle_key_event(&mut app, key(KeyCode::Up));
        handle_key_event(&mut app, key(KeyCode::Char('+')));
        assert_eq!(app.live.tracker().threshold().value(), 32.0);
        handle_key_event(&mut app, key(KeyCode::Char('-')));
        assert_eq!(app.live.tracker().threshold().value(), 31.0);
        assert_eq!(handle.take_published(), vec!["31", "32", "31"]);
    }

    #[test]
    fn test_threshold_stops_at_bounds() {
        let (_handle, mut app) = app();
        for _ in 0..100 {
            handle_key_event(&mut app, key(KeyCode::Down));
        }
        assert_eq!(app.live.tracker().threshold().value(), Threshold::MIN);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let (_handle, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_audio_toggle_key() {
        let (_handle, mut app) = app();
        assert!(app.live.alert_audio);
        handle_key_event(&mut app, key(KeyCode::Char('a')));
        assert!(!app.live.alert_audio);
    }

    #[test]
    fn test_tab_click_switches_view() {
        let (_handle, mut app) = app();
        let tabs = Rect::new(0, 1, 80, 1);

        handle_mouse_event(&mut app, click(14, 1), tabs);
        assert_eq!(app.current_view, View::History);

        // Clicks outside the tab row are ignored.
        handle_mouse_event(&mut app, click(2, 5), tabs);
        assert_eq!(app.current_view, View::History);

        handle_mouse_event(&mut app, click(2, 1), tabs);
        assert_eq!(app.current_view, View::Live);
    }
}
