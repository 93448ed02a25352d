//! Live view rendering.
//!
//! Shows the latest orientation, the alert banner, the session statistics
//! and a chart of the retained pitch samples against the threshold.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Threshold;

/// Render the Live view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_orientation(frame, app, columns[0]);
    render_stats(frame, app, columns[1]);
    render_chart(frame, app, rows[1]);
}

fn block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_orientation(frame: &mut Frame, app: &App, area: Rect) {
    let tracker = app.live.tracker();
    let reading = tracker.current();
    let alerting = tracker.is_alerting();

    let posture = if !reading.calibrated {
        Span::styled("CALIBRATING", Style::default().fg(app.theme.warning))
    } else if alerting {
        Span::styled("SLOUCHING", app.theme.posture_style(true))
    } else {
        Span::styled("GOOD POSTURE", app.theme.posture_style(false))
    };

    let audio = if app.live.alert_audio { "on" } else { "off" };

    let lines = vec![
        Line::from(vec![
            Span::raw(" Pitch "),
            Span::styled(
                format!("{:>7.1}°", reading.pitch),
                app.theme
                    .level_style(tracker.posture_level())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            posture,
        ]),
        Line::from(format!(" Roll  {:>7.1}°", reading.roll)),
        Line::from(format!(" Yaw   {:>7.1}°", reading.yaw)),
        Line::from(vec![
            Span::raw(format!(" Threshold {} ", tracker.threshold())),
            Span::styled(
                format!("[{}-{}]", Threshold::MIN, Threshold::MAX),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Span::raw(format!("   Sound {}", audio)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block(app, " Sensor ")), area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let tracker = app.live.tracker();
    let stats = tracker.stats();

    let lines = vec![
        Line::from(format!(" Average angle   {:.1}°", stats.average_angle)),
        Line::from(vec![
            Span::raw(" Good posture    "),
            Span::styled(
                format!("{}%", stats.good_posture_percent),
                app.theme.posture_style(stats.good_posture_percent < 50),
            ),
        ]),
        Line::from(format!(
            " Alerts          {} of {}",
            stats.alert_count, stats.total_readings
        )),
        Line::from(format!(
            " Received        {} ({} dropped)",
            tracker.retention().received(),
            tracker.dropped()
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block(app, " Session ")), area);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let tracker = app.live.tracker();
    let threshold = tracker.threshold().value();

    let pitch: Vec<(f64, f64)> = tracker
        .readings()
        .enumerate()
        .map(|(i, r)| (i as f64, r.pitch))
        .collect();

    let capacity = tracker.retention().policy().capacity;
    let x_max = (capacity.max(2) - 1) as f64;
    let y_max = pitch
        .iter()
        .map(|(_, p)| *p)
        .fold(threshold, f64::max)
        .max(Threshold::MAX)
        .ceil();

    let line = [(0.0, threshold), (x_max, threshold)];

    let datasets = vec![
        Dataset::default()
            .name("pitch")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.series))
            .data(&pitch),
        Dataset::default()
            .name("threshold")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.alert))
            .data(&line),
    ];

    let first = tracker.readings().next().map(|r| r.time.as_str()).unwrap_or("");
    let last = tracker.retention().latest().map(|r| r.time.as_str()).unwrap_or("");

    let chart = Chart::new(datasets)
        .block(block(app, " Pitch (retained) "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, x_max])
                .labels([first.to_string(), last.to_string()]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, y_max])
                .labels(["0".to_string(), format!("{:.0}", y_max / 2.0), format!("{:.0}", y_max)]),
        );

    frame.render_widget(chart, area);
}
