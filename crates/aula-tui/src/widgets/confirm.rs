//! Modal confirmation dialog for destructive actions.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use tui_popup::Popup;

use aula_core::PendingAction;

use crate::theme;

fn body(pending: &PendingAction) -> Text<'static> {
    Text::from(vec![
        Line::from(Span::styled(
            format!(" {} ", pending.prompt()),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y/Enter ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n/Esc ", theme::key_hint_key()),
            Span::styled("cancel ", theme::key_hint()),
        ]),
    ])
}

/// Where the dialog lands inside `area`: the body plus its border,
/// centered. Clicks outside this rect cancel.
pub fn dialog_area(area: Rect, pending: &PendingAction) -> Rect {
    let text = body(pending);
    let width = u16::try_from(text.width())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(area.width);
    let height = u16::try_from(text.height())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn is_outside(area: Rect, pending: &PendingAction, column: u16, row: u16) -> bool {
    !dialog_area(area, pending).contains(Position::new(column, row))
}

pub fn render(frame: &mut Frame, area: Rect, pending: &PendingAction) {
    let popup = Popup::new(body(pending))
        .title(Line::from(format!(" {} ", pending.title())))
        .style(Style::default().bg(theme::BG_DARK))
        .border_style(Style::default().fg(theme::ELECTRIC_YELLOW));
    frame.render_widget(&popup, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn dialog_shows_prompt_and_title() {
        let pending = PendingAction::CleanupLogs { days: 30 };
        let mut terminal =
            Terminal::new(TestBackend::new(90, 12)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| render(frame, frame.area(), &pending))
            .unwrap_or_else(|e| panic!("{e}"));

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Clean up logs"));
        assert!(screen.contains("older than 30 days"));
    }

    #[test]
    fn clicks_outside_the_dialog_are_detected() {
        let pending = PendingAction::power_off();
        let area = Rect::new(0, 0, 100, 30);
        let dialog = dialog_area(area, &pending);
        assert!(!is_outside(area, &pending, dialog.x + 1, dialog.y + 1));
        assert!(is_outside(area, &pending, 0, 0));
    }
}
