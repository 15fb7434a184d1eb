//! Transient notification toast, drawn in the bottom-right corner.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use aula_core::Notice;

use crate::theme;

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct Toast {
    pub notice: Notice,
    shown_at: Instant,
}

impl Toast {
    pub fn new(notice: Notice) -> Self {
        Self {
            notice,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= TOAST_TTL
    }

    /// Draw the toast; `slot` 0 is the lowest, later slots stack upwards.
    pub fn render(&self, frame: &mut Frame, area: Rect, slot: u16) {
        let (color, icon) = theme::notice_style(self.notice.level);
        let text_width = u16::try_from(self.notice.message.chars().count()).unwrap_or(u16::MAX);
        let width = text_width
            .saturating_add(6)
            .clamp(20, 70)
            .min(area.width);
        let height = 3u16.min(area.height);
        // Sit just above the tab and status bars
        let x = area.x + area.width.saturating_sub(width + 1);
        let Some(y) = area
            .height
            .checked_sub(height + 2 + slot.saturating_mul(height))
            .map(|offset| area.y + offset)
        else {
            return;
        };
        let toast_area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, toast_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(
                self.notice.message.as_str(),
                Style::default().fg(theme::DIM_WHITE),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
