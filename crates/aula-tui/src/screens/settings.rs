//! Settings screen: server configuration entries, filterable by category.
//!
//! Booleans toggle in place; other kinds open an inline editor. The
//! server validates nothing, so the core checks the value against the
//! entry's kind before submitting.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Cell as TableCell, Clear, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};

use aula_core::{ConfigEntry, ConfigKind, ControlId, ControlMap, SettingsView};

use crate::action::Action;
use crate::component::Component;
use crate::screens::{loaded_or_placeholder, panel, step};
use crate::theme;
use crate::widgets::sub_tabs::render_sub_tabs;
use crate::widgets::text_field::{FIELD_HEIGHT, TextField};

const ALL_CATEGORIES: &str = "All";

struct Editor {
    key: String,
    kind: ConfigKind,
    field: TextField,
}

pub struct SettingsScreen {
    focused: bool,
    view: Arc<SettingsView>,
    controls: Arc<ControlMap>,
    /// Categories seen in the last unfiltered load.
    categories: Vec<String>,
    /// 0 is "All", then `categories[i - 1]`.
    category_index: usize,
    table_state: TableState,
    editor: Option<Editor>,
    throbber: ThrobberState,
}

impl SettingsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            view: Arc::new(SettingsView::default()),
            controls: Arc::new(ControlMap::new()),
            categories: Vec::new(),
            category_index: 0,
            table_state: TableState::default().with_selected(Some(0)),
            editor: None,
            throbber: ThrobberState::default(),
        }
    }

    fn entries(&self) -> &[ConfigEntry] {
        self.view.entries.loaded().map_or(&[], Vec::as_slice)
    }

    fn selected_entry(&self) -> Option<&ConfigEntry> {
        self.table_state
            .selected()
            .and_then(|i| self.entries().get(i))
    }

    fn is_saving(&self, key: &str) -> bool {
        self.controls
            .get(&ControlId::SaveSetting(key.to_owned()))
            .is_some_and(|c| c.busy)
    }

    fn any_saving(&self) -> bool {
        self.controls
            .iter()
            .any(|(id, c)| matches!(id, ControlId::SaveSetting(_)) && c.busy)
    }

    fn shift_category(&mut self, delta: isize) -> Option<Action> {
        let count = self.categories.len() + 1;
        let next = (self.category_index + count).saturating_add_signed(delta) % count;
        if next == self.category_index {
            return None;
        }
        self.category_index = next;
        let category = next.checked_sub(1).and_then(|i| self.categories.get(i)).cloned();
        Some(Action::FilterSettings(category))
    }

    fn activate_selected(&mut self) -> Option<Action> {
        let entry = self.selected_entry()?;
        if self.is_saving(&entry.key) {
            return None;
        }
        if entry.kind == ConfigKind::Boolean {
            return Some(Action::SaveSetting {
                key: entry.key.clone(),
                value: (!entry.is_enabled()).to_string(),
            });
        }
        self.editor = Some(Editor {
            key: entry.key.clone(),
            kind: entry.kind,
            field: TextField::new("Value").with_value(entry.value.clone()),
        });
        None
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<Action> {
        let editor = self.editor.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.editor = None;
                None
            }
            KeyCode::Enter => {
                let editor = self.editor.take()?;
                Some(Action::SaveSetting {
                    key: editor.key,
                    value: editor.field.value().to_owned(),
                })
            }
            _ => {
                editor.field.handle_key(&key);
                None
            }
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let block = panel("Configuration", self.focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(entries) = loaded_or_placeholder(frame, inner, &self.view.entries) else {
            return;
        };
        if entries.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No configuration entries", theme::muted())),
                inner,
            );
            return;
        }

        let header = Row::new(["Key", "Value", "Type", "Category", "Description", "Updated"])
            .style(theme::table_header());
        let rows = entries.iter().map(|entry| {
            let value = if self.is_saving(&entry.key) {
                Span::styled(
                    aula_core::control::BUSY_LABEL,
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                )
            } else if entry.kind == ConfigKind::Boolean {
                let (marker, color) = if entry.is_enabled() {
                    ("[\u{2713}] on", theme::SUCCESS_GREEN)
                } else {
                    ("[ ] off", theme::BORDER_GRAY)
                };
                Span::styled(marker, Style::default().fg(color))
            } else {
                Span::styled(entry.value.clone(), Style::default().fg(theme::NEON_CYAN))
            };
            let updated = match (&entry.updated_at, &entry.updated_by) {
                (Some(at), Some(by)) => format!("{at} by {by}"),
                (Some(at), None) => at.clone(),
                _ => String::new(),
            };
            Row::new(vec![
                TableCell::from(entry.key.clone()),
                TableCell::from(value),
                TableCell::from(Span::styled(entry.kind.to_string(), theme::muted())),
                TableCell::from(entry.category.clone().unwrap_or_default()),
                TableCell::from(entry.description.clone().unwrap_or_default()),
                TableCell::from(Span::styled(updated, theme::muted())),
            ])
            .style(theme::table_row())
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(22),
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Length(12),
                Constraint::Min(16),
                Constraint::Length(24),
            ],
        )
        .header(header)
        .row_highlight_style(theme::table_selected());
        frame.render_stateful_widget(table, inner, &mut self.table_state.clone());
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect, editor: &Editor) {
        let width = 50u16.min(area.width.saturating_sub(2));
        let height = (FIELD_HEIGHT + 4).min(area.height);
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, popup);
        let block = panel(&format!("{} ({})", editor.key, editor.kind), true)
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [field, _, hint] = Layout::vertical([
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);
        editor.field.render(frame, field, true);
        frame.render_widget(
            Paragraph::new(Span::styled(" Enter save  Esc cancel", theme::key_hint())),
            hint,
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if self.any_saving() {
            let throbber = Throbber::default()
                .label(" Saving...")
                .style(Style::default().fg(theme::DIM_WHITE))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber.clone());
            return;
        }
        let description = self
            .selected_entry()
            .and_then(|e| e.description.clone())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {description}"), theme::muted())),
            area,
        );
    }
}

impl Component for SettingsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.editor.is_some() {
            return Ok(self.handle_editor_key(key));
        }

        let len = self.entries().len();
        let selected = self.table_state.selected().unwrap_or(0);
        let action = match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.table_state.select(Some(step(selected, 1, len)));
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table_state.select(Some(step(selected, -1, len)));
                None
            }
            KeyCode::Left | KeyCode::Char('h') => self.shift_category(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_category(1),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_selected(),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SettingsUpdated(view) => {
                self.view = Arc::clone(view);
                if self.view.category.is_none() {
                    if let Some(entries) = self.view.entries.loaded() {
                        let mut categories: Vec<String> =
                            entries.iter().filter_map(|e| e.category.clone()).collect();
                        categories.sort();
                        categories.dedup();
                        self.categories = categories;
                        self.category_index = 0;
                    }
                }
                let len = self.entries().len();
                let selected = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(step(selected, 0, len)));
            }
            Action::ControlsUpdated(controls) => self.controls = Arc::clone(controls),
            Action::Tick if self.any_saving() => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [tabs, table, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .areas(area);

        let labels: Vec<&str> = std::iter::once(ALL_CATEGORIES)
            .chain(self.categories.iter().map(String::as_str))
            .collect();
        frame.render_widget(Paragraph::new(render_sub_tabs(&labels, self.category_index)), tabs);
        self.render_table(frame, table);
        self.render_footer(frame, footer);
        if let Some(editor) = &self.editor {
            self.render_editor(frame, area, editor);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn captures_input(&self) -> bool {
        self.editor.is_some()
    }

    fn hints(&self) -> &'static str {
        if self.editor.is_some() {
            "Enter save  Esc cancel"
        } else {
            "j/k select  h/l category  Enter edit  Space toggle"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::Loadable;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::screens::buffer_text;

    fn entry(key: &str, value: &str, kind: ConfigKind, category: &str) -> ConfigEntry {
        ConfigEntry {
            id: 1,
            key: key.into(),
            value: value.into(),
            kind,
            description: Some(format!("{key} description")),
            category: Some(category.into()),
            updated_at: None,
            updated_by: None,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(category: Option<&str>, entries: Vec<ConfigEntry>) -> SettingsScreen {
        let mut screen = SettingsScreen::new();
        let view = SettingsView {
            category: category.map(String::from),
            entries: Loadable::Loaded(entries),
        };
        screen
            .update(&Action::SettingsUpdated(Arc::new(view)))
            .unwrap_or_else(|e| panic!("{e}"));
        screen
    }

    fn sample() -> Vec<ConfigEntry> {
        vec![
            entry("modo_debug", "false", ConfigKind::Boolean, "sistema"),
            entry("max_volumen", "85", ConfigKind::Integer, "audio"),
            entry("nombre_sala", "Aula Magna", ConfigKind::Text, "sistema"),
        ]
    }

    #[test]
    fn boolean_toggles_immediately() {
        let mut screen = loaded(None, sample());
        let action = screen
            .handle_key_event(key(KeyCode::Char(' ')))
            .unwrap_or_else(|e| panic!("{e}"));
        let Some(Action::SaveSetting { key, value }) = action else {
            panic!("expected a save");
        };
        assert_eq!(key, "modo_debug");
        assert_eq!(value, "true");
        assert!(!screen.captures_input());
    }

    #[test]
    fn integer_opens_editor_and_saves_text() {
        let mut screen = loaded(None, sample());
        screen
            .handle_key_event(key(KeyCode::Down))
            .unwrap_or_else(|e| panic!("{e}"));
        screen
            .handle_key_event(key(KeyCode::Enter))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(screen.captures_input());

        screen
            .handle_key_event(key(KeyCode::Backspace))
            .unwrap_or_else(|e| panic!("{e}"));
        screen
            .handle_key_event(key(KeyCode::Char('0')))
            .unwrap_or_else(|e| panic!("{e}"));
        let action = screen
            .handle_key_event(key(KeyCode::Enter))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            action,
            Some(Action::SaveSetting { ref key, ref value }) if key == "max_volumen" && value == "80"
        ));
        assert!(!screen.captures_input());
    }

    #[test]
    fn categories_come_from_unfiltered_load() {
        let mut screen = loaded(None, sample());
        assert_eq!(screen.categories, vec!["audio".to_owned(), "sistema".to_owned()]);

        let action = screen
            .handle_key_event(key(KeyCode::Right))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(action, Some(Action::FilterSettings(Some(ref c))) if c == "audio"));

        // A filtered reload keeps the strip
        let view = SettingsView {
            category: Some("audio".into()),
            entries: Loadable::Loaded(vec![entry("max_volumen", "85", ConfigKind::Integer, "audio")]),
        };
        screen
            .update(&Action::SettingsUpdated(Arc::new(view)))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(screen.categories.len(), 2);

        let action = screen
            .handle_key_event(key(KeyCode::Left))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(action, Some(Action::FilterSettings(None))));
    }

    #[test]
    fn renders_entries_with_category_strip() {
        let screen = loaded(None, sample());
        let mut terminal =
            Terminal::new(TestBackend::new(120, 10)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap_or_else(|e| panic!("{e}"));
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("[All]"));
        assert!(text.contains("max_volumen"));
        assert!(text.contains("Aula Magna"));
    }
}
