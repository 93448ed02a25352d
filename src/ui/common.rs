//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

/// Tab titles, in display order.
pub const TAB_TITLES: [&str; 2] = [" 1:Live ", " 2:History "];

/// Render the header bar with connection state and the current alert.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.live.status();
    let tracker = app.live.tracker();

    let mut spans = vec![
        Span::styled(" ● ", app.theme.status_style(status)),
        Span::styled("POSTURE PULSE ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(status.label(), app.theme.status_style(status)),
        Span::raw(" │ "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(" │ "),
        Span::raw(format!("threshold {}", tracker.threshold())),
    ];

    if tracker.is_alerting() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("SLOUCHING", app.theme.posture_style(true)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = TAB_TITLES.iter().map(|t| Line::from(*t)).collect();

    let selected = match app.current_view {
        View::Live => 0,
        View::History => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Map a click column on the tab bar to a view.
///
/// Mirrors the layout [`Tabs`] uses: one space of padding on each side of a
/// title and a one-column divider between titles.
pub fn tab_at(column: u16, area: Rect) -> Option<View> {
    if column < area.x {
        return None;
    }
    let mut offset = column - area.x;
    for (index, title) in TAB_TITLES.iter().enumerate() {
        let width = title.chars().count() as u16 + 2;
        if offset < width {
            return Some(if index == 0 { View::Live } else { View::History });
        }
        // Divider column.
        if offset == width {
            return None;
        }
        offset -= width + 1;
    }
    None
}

/// Render the status bar at the bottom.
///
/// Shows the data counters and available controls, or a temporary status
/// message when one is active.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Live => "↑↓:threshold a:audio e:export Tab:switch ?:help q:quit",
        View::History => "r:refresh e:export Tab:switch ?:help q:quit",
    };

    let context = match app.current_view {
        View::Live => {
            let tracker = app.live.tracker();
            format!(
                "{} received, {} retained, {} dropped",
                tracker.retention().received(),
                tracker.retention().len(),
                tracker.dropped()
            )
        }
        View::History => match app.history.last_loaded() {
            Some(at) if !app.history.is_loading() => {
                format!("Loaded {} at {}", app.history.points().len(), at.format("%H:%M:%S"))
            }
            _ if app.history.is_loading() => "Loading...".to_string(),
            _ => "Not loaded".to_string(),
        },
    };

    let paragraph = Paragraph::new(format!(" {} | {}", context, controls))
        .style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab / ←→    Switch views"),
        Line::from("  1 / 2       Live / History"),
        Line::from("  Click tab   Switch views"),
        Line::from(""),
        section(" Live"),
        Line::from("  ↑ / +       Raise threshold"),
        Line::from("  ↓ / -       Lower threshold"),
        Line::from("  a           Toggle alert sound"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh history"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 21u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
