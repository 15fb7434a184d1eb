//! Labelled single-line text input backed by `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tui_input::{Input, InputRequest};

use crate::theme;

/// Rows a field occupies: label line plus a bordered input box.
pub const FIELD_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub label: &'static str,
    input: Input,
    masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
            masked: false,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Trimmed value, `None` when blank.
    pub fn optional(&self) -> Option<String> {
        let v = self.value().trim();
        (!v.is_empty()).then(|| v.to_owned())
    }

    /// Apply an editing key. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match input_request(key) {
            Some(request) => {
                self.input.handle(request);
                true
            }
            None => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool) {
        if area.height < 3 {
            return;
        }

        let label_style = if active {
            Style::default().fg(theme::NEON_CYAN)
        } else {
            Style::default().fg(theme::DIM_WHITE)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let box_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        let width = usize::from(inner.width.max(1));
        let scroll = self.input.visual_scroll(width);
        let shown = if self.masked {
            "\u{25CF}".repeat(self.value().chars().count())
        } else {
            self.value().to_owned()
        };
        let visible: String = shown.chars().skip(scroll).collect();
        frame.render_widget(
            Paragraph::new(Span::styled(visible, Style::default().fg(theme::NEON_CYAN))),
            inner,
        );

        if active {
            let offset = self.input.visual_cursor().saturating_sub(scroll);
            let x = inner
                .x
                .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y));
        }
    }
}

/// Map an editing key to a `tui-input` request. Navigation keys used by
/// forms (Tab, Enter, Esc, Up/Down) are left alone.
fn input_request(key: &KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char('a') if ctrl => Some(InputRequest::GoToStart),
        KeyCode::Char('e') if ctrl => Some(InputRequest::GoToEnd),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_editing() {
        let mut field = TextField::new("User");
        for c in "admim".chars() {
            assert!(field.handle_key(&key(KeyCode::Char(c))));
        }
        field.handle_key(&key(KeyCode::Backspace));
        field.handle_key(&key(KeyCode::Char('n')));
        assert_eq!(field.value(), "admin");

        field.handle_key(&KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(field.value(), "");
        assert_eq!(field.optional(), None);
    }

    #[test]
    fn form_navigation_keys_pass_through() {
        let mut field = TextField::new("Days");
        assert!(!field.handle_key(&key(KeyCode::Tab)));
        assert!(!field.handle_key(&key(KeyCode::Enter)));
        assert!(!field.handle_key(&key(KeyCode::Esc)));
    }

    #[test]
    fn optional_trims() {
        let field = TextField::new("Email").with_value("  ana@aula.local ");
        assert_eq!(field.optional().as_deref(), Some("ana@aula.local"));
    }
}
