//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::PostureLevel;
use crate::source::ConnectionStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for good posture and a healthy connection.
    pub good: Color,
    /// Color for transitional states (connecting, loading).
    pub warning: Color,
    /// Color for slouching and connection errors.
    pub alert: Color,
    /// Color for the pitch series in charts.
    pub series: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for section headings.
    pub header: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            good: Color::Green,
            warning: Color::Yellow,
            alert: Color::Red,
            series: Color::LightBlue,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            good: Color::Green,
            warning: Color::Yellow,
            alert: Color::Red,
            series: Color::Blue,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a connection status
    pub fn status_style(&self, status: ConnectionStatus) -> Style {
        match status {
            ConnectionStatus::Connected => Style::default().fg(self.good),
            ConnectionStatus::Connecting => Style::default().fg(self.warning),
            ConnectionStatus::Disconnected => Style::default().fg(self.alert),
            ConnectionStatus::Error => Style::default().fg(self.alert).add_modifier(Modifier::BOLD),
        }
    }

    /// Style for a pitch value relative to the threshold.
    pub fn posture_style(&self, slouching: bool) -> Style {
        if slouching {
            Style::default().fg(self.alert).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.good)
        }
    }

    /// Style for the current pitch band.
    pub fn level_style(&self, level: PostureLevel) -> Style {
        match level {
            PostureLevel::Good => Style::default().fg(self.good),
            PostureLevel::Warning => Style::default().fg(self.warning),
            PostureLevel::Slouching => Style::default().fg(self.alert).add_modifier(Modifier::BOLD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_style_uses_three_colors() {
        let theme = Theme::dark();
        assert_eq!(theme.level_style(PostureLevel::Good).fg, Some(theme.good));
        assert_eq!(theme.level_style(PostureLevel::Warning).fg, Some(theme.warning));
        assert_eq!(theme.level_style(PostureLevel::Slouching).fg, Some(theme.alert));
    }
}
