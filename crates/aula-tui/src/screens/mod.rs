//! Screen implementations. Each screen is a top-level [`Component`].

pub mod analytics;
pub mod audit;
pub mod dashboard;
pub mod settings;
pub mod users;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use aula_core::Loadable;

use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;

pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()) as Box<dyn Component>,
        ),
        (ScreenId::Users, Box::new(users::UsersScreen::new())),
        (ScreenId::Audit, Box::new(audit::AuditScreen::new())),
        (ScreenId::Analytics, Box::new(analytics::AnalyticsScreen::new())),
        (ScreenId::Settings, Box::new(settings::SettingsScreen::new())),
    ]
}

/// Rounded panel block with the shared title and border styling.
pub fn panel(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::border_focused()
        } else {
            theme::border_default()
        })
}

/// Render the placeholder for a panel whose data is not loaded and
/// return the data once it is.
pub fn loaded_or_placeholder<'a, T>(
    frame: &mut Frame,
    area: Rect,
    data: &'a Loadable<T>,
) -> Option<&'a T> {
    let (text, style) = match data {
        Loadable::Loaded(value) => return Some(value),
        Loadable::NotLoaded => ("  Not loaded yet (r to load)".to_owned(), theme::muted()),
        Loadable::Loading => ("  Loading...".to_owned(), theme::muted()),
        Loadable::Failed(message) => (
            format!("  {message}"),
            Style::default().fg(theme::ERROR_RED),
        ),
    };
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
    None
}

/// Move a selection index by `delta` within `len` rows.
pub fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}

/// Flatten a rendered test buffer into one string for `contains` checks.
#[cfg(test)]
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect()
}
