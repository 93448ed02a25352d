//! History view rendering.
//!
//! Displays the fetched records as a chronological pitch chart, a summary
//! panel and a per-hour table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;

/// Render the History view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.history.is_configured() {
        let text = vec![
            Line::from(""),
            Line::from(" No history store configured."),
            Line::from(""),
            Line::from(" Set [history] url and api_key in the config file, or"),
            Line::from(" POSTURE_HISTORY__URL and POSTURE_HISTORY__API_KEY."),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(block(app, " History ")),
            area,
        );
        return;
    }

    if app.history.points().is_empty() {
        let message = if app.history.is_loading() {
            " Loading cloud data..."
        } else {
            " No records loaded. Press r to refresh."
        };
        frame.render_widget(
            Paragraph::new(vec![Line::from(""), Line::from(message)]).block(block(app, " History ")),
            area,
        );
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(10)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(rows[1]);

    render_chart(frame, app, rows[0]);
    render_summary(frame, app, columns[0]);
    render_hourly(frame, app, columns[1]);
}

fn block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let points = app.history.points();

    let pitch: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.pitch))
        .collect();
    let slouching: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.slouching)
        .map(|(i, p)| (i as f64, p.pitch))
        .collect();

    let x_max = (points.len().max(2) - 1) as f64;
    let y_min = points.iter().map(|p| p.pitch).fold(0.0, f64::min).floor();
    let y_max = points.iter().map(|p| p.pitch).fold(1.0, f64::max).ceil();

    let datasets = vec![
        Dataset::default()
            .name("pitch")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.series))
            .data(&pitch),
        Dataset::default()
            .name("slouching")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(app.theme.alert))
            .data(&slouching),
    ];

    let first = points.first().map(|p| p.time.clone()).unwrap_or_default();
    let last = points.last().map(|p| p.time.clone()).unwrap_or_default();

    let title = match app.history.store_description() {
        Some(source) => format!(" Pitch history ({}) ", source),
        None => " Pitch history ".to_string(),
    };

    let chart = Chart::new(datasets)
        .block(block(app, &title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, x_max])
                .labels([first, last]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels([format!("{:.0}", y_min), format!("{:.0}", y_max)]),
        );

    frame.render_widget(chart, area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.history.summary() {
        Some(summary) => vec![
            Line::from(format!(" Records   {}", summary.total)),
            Line::from(format!(" Average   {:.1}°", summary.average)),
            Line::from(format!(" Max       {:.1}°", summary.max)),
            Line::from(format!(" Min       {:.1}°", summary.min)),
            Line::from(vec![
                Span::raw(" Slouching "),
                Span::styled(
                    format!("{} ({:.0}%)", summary.slouch_count, summary.slouch_percent()),
                    app.theme.posture_style(summary.slouch_count > 0),
                ),
            ]),
        ],
        None => vec![Line::from(" -")],
    };

    frame.render_widget(Paragraph::new(lines).block(block(app, " Summary ")), area);
}

fn render_hourly(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Hour", "Avg", "Max", "Min", "Count"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = app
        .history
        .hourly()
        .iter()
        .map(|h| {
            Row::new(vec![
                Cell::from(format!("{} {:02}:00", h.date.format("%m-%d"), h.hour)),
                Cell::from(format!("{:.1}", h.average)),
                Cell::from(format!("{:.1}", h.max)),
                Cell::from(format!("{:.1}", h.min)),
                Cell::from(h.readings.to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(11),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(app, " By hour "));

    frame.render_widget(table, area);
}
