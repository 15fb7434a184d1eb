//! Inline tab strip used inside a screen (settings categories).

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::theme;

/// One line of labels with the active one bracketed and highlighted.
pub fn render_sub_tabs<'a, S: AsRef<str>>(labels: &'a [S], active_index: usize) -> Line<'a> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        let label = label.as_ref();
        if i == active_index {
            spans.push(Span::styled(
                format!("[{label}]"),
                theme::tab_active().add_modifier(Modifier::UNDERLINED),
            ));
        } else {
            spans.push(Span::styled(label, theme::tab_inactive()));
        }
    }

    Line::from(spans)
}
