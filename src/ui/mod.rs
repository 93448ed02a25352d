//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`live`]: Current orientation, alert state, session stats and pitch chart
//! - [`history`]: Chart, summary and hourly table of fetched records
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (live/history::render)               │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod history;
pub mod live;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::{App, View};

/// Areas of the top-level layout.
#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub tabs: Rect,
    pub content: Rect,
    pub status: Rect,
}

/// Split the terminal into header, tabs, content and status bar.
pub fn layout(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    Areas {
        header: chunks[0],
        tabs: chunks[1],
        content: chunks[2],
        status: chunks[3],
    }
}

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let areas = layout(frame.area());

    common::render_header(frame, app, areas.header);
    common::render_tabs(frame, app, areas.tabs);

    match app.current_view {
        View::Live => live::render(frame, app, areas.content),
        View::History => history::render(frame, app, areas.content),
    }

    common::render_status_bar(frame, app, areas.status);

    if app.show_help {
        common::render_help(frame, app, frame.area());
    }
}
