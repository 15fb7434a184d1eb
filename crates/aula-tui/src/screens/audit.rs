//! Audit screen: filtered log search, cleanup and CSV export.

use std::sync::Arc;

use chrono::NaiveDate;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell as TableCell, Clear, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};

use aula_core::admin::{DEFAULT_EXPORT_LIMIT, MAX_SEARCH_LIMIT};
use aula_core::model::log::DEFAULT_SEARCH_LIMIT;
use aula_core::{AuditView, ControlId, ControlMap, LogFilter};

use crate::action::Action;
use crate::component::Component;
use crate::screens::{loaded_or_placeholder, panel, step};
use crate::theme;
use crate::widgets::text_field::{FIELD_HEIGHT, TextField};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Search filters as typed, validated on submit.
struct FilterForm {
    fields: [TextField; 6],
    active: usize,
    error: Option<String>,
}

impl FilterForm {
    fn from_filter(filter: &LogFilter) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default();
        Self {
            fields: [
                TextField::new("User").with_value(filter.user.clone().unwrap_or_default()),
                TextField::new("Level").with_value(filter.level.clone().unwrap_or_default()),
                TextField::new("From (YYYY-MM-DD)").with_value(date(filter.from)),
                TextField::new("To (YYYY-MM-DD)").with_value(date(filter.to)),
                TextField::new("Event").with_value(filter.event.clone().unwrap_or_default()),
                TextField::new("Limit").with_value(filter.limit.to_string()),
            ],
            active: 0,
            error: None,
        }
    }

    fn filter(&self) -> Result<LogFilter, String> {
        let [user, level, from, to, event, limit] = &self.fields;
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err("'from' date is after 'to' date".into());
            }
        }
        let limit = match limit.optional() {
            None => DEFAULT_SEARCH_LIMIT,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_SEARCH_LIMIT).contains(n))
                .ok_or_else(|| format!("limit must be between 1 and {MAX_SEARCH_LIMIT}"))?,
        };
        Ok(LogFilter {
            user: user.optional(),
            level: level.optional(),
            from,
            to,
            event: event.optional(),
            limit,
        })
    }
}

fn parse_date(field: &TextField) -> Result<Option<NaiveDate>, String> {
    field
        .optional()
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map_err(|_| format!("'{raw}' is not a YYYY-MM-DD date"))
        })
        .transpose()
}

/// Parse a positive whole number from a one-field prompt.
fn parse_positive(field: &TextField, what: &str) -> Result<u32, String> {
    field
        .value()
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("{what} must be a positive whole number"))
}

enum Prompt {
    None,
    Filters(FilterForm),
    Cleanup(TextField, Option<String>),
    Export(TextField, Option<String>),
}

pub struct AuditScreen {
    focused: bool,
    view: Arc<AuditView>,
    controls: Arc<ControlMap>,
    table_state: TableState,
    prompt: Prompt,
    throbber: ThrobberState,
}

impl AuditScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            view: Arc::new(AuditView::default()),
            controls: Arc::new(ControlMap::new()),
            table_state: TableState::default().with_selected(Some(0)),
            prompt: Prompt::None,
            throbber: ThrobberState::default(),
        }
    }

    fn cleaning(&self) -> bool {
        self.controls
            .get(&ControlId::CleanupLogs)
            .is_some_and(|c| c.busy)
    }

    fn result_count(&self) -> usize {
        self.view.results.loaded().map_or(0, |r| r.entries.len())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Esc {
            self.prompt = Prompt::None;
            return None;
        }
        match &mut self.prompt {
            Prompt::None => None,
            Prompt::Filters(form) => match key.code {
                KeyCode::Tab | KeyCode::Down => {
                    form.active = (form.active + 1) % form.fields.len();
                    None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.active = (form.active + form.fields.len() - 1) % form.fields.len();
                    None
                }
                KeyCode::Enter => match form.filter() {
                    Ok(filter) => {
                        self.prompt = Prompt::None;
                        Some(Action::SearchLogs(Box::new(filter)))
                    }
                    Err(message) => {
                        form.error = Some(message);
                        None
                    }
                },
                _ => {
                    form.fields[form.active].handle_key(&key);
                    None
                }
            },
            Prompt::Cleanup(field, error) => {
                if key.code != KeyCode::Enter {
                    field.handle_key(&key);
                    return None;
                }
                match parse_positive(field, "Days") {
                    Ok(days) => {
                        self.prompt = Prompt::None;
                        Some(Action::CleanupLogs(days))
                    }
                    Err(message) => {
                        *error = Some(message);
                        None
                    }
                }
            }
            Prompt::Export(field, error) => {
                if key.code != KeyCode::Enter {
                    field.handle_key(&key);
                    return None;
                }
                match parse_positive(field, "Limit") {
                    Ok(limit) => {
                        self.prompt = Prompt::None;
                        Some(Action::ExportLogs(limit))
                    }
                    Err(message) => {
                        *error = Some(message);
                        None
                    }
                }
            }
        }
    }

    fn filter_summary(&self) -> Line<'static> {
        let f = &self.view.filter;
        let mut parts = Vec::new();
        if let Some(user) = &f.user {
            parts.push(format!("user={user}"));
        }
        if let Some(level) = &f.level {
            parts.push(format!("level={level}"));
        }
        if let Some(from) = f.from {
            parts.push(format!("from={from}"));
        }
        if let Some(to) = f.to {
            parts.push(format!("to={to}"));
        }
        if let Some(event) = &f.event {
            parts.push(format!("event={event}"));
        }
        parts.push(format!("limit={}", f.limit));
        Line::from(vec![
            Span::styled(" Filters: ", theme::key_hint()),
            Span::styled(parts.join("  "), Style::default().fg(theme::NEON_CYAN)),
        ])
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.cleaning() {
            let throbber = Throbber::default()
                .label(" Cleaning up old records...")
                .style(Style::default().fg(theme::DIM_WHITE))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber.clone());
            return;
        }
        let text = match self.view.last_cleanup {
            Some(removed) => format!(" Last cleanup removed {removed} record(s)"),
            None => " f filters  c clean up  x export".to_owned(),
        };
        frame.render_widget(Paragraph::new(Span::styled(text, theme::muted())), area);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let count = self
            .view
            .results
            .loaded()
            .map(|r| format!(" {} of {} ", r.entries.len(), r.total))
            .unwrap_or_default();
        let block = panel("Audit log", self.focused)
            .title_bottom(Line::from(Span::styled(count, theme::muted())).right_aligned());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(results) = loaded_or_placeholder(frame, inner, &self.view.results) else {
            return;
        };
        if results.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No records match these filters", theme::muted())),
                inner,
            );
            return;
        }

        let header = Row::new(["Time", "Level", "User", "Event", "Detail", "IP"])
            .style(theme::table_header());
        let rows = results.entries.iter().map(|entry| {
            let detail = match (&entry.previous_mode, &entry.new_mode) {
                (Some(from), Some(to)) => format!("{from} → {to}"),
                _ => entry.detail.clone(),
            };
            Row::new(vec![
                TableCell::from(Span::styled(
                    entry.timestamp.clone(),
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                )),
                TableCell::from(Span::styled(
                    entry.level.to_string(),
                    Style::default().fg(theme::level_color(&entry.level)),
                )),
                TableCell::from(entry.user.clone()),
                TableCell::from(entry.event.clone()),
                TableCell::from(detail),
                TableCell::from(entry.source_ip.clone().unwrap_or_default()),
            ])
            .style(theme::table_row())
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(19),
                Constraint::Length(9),
                Constraint::Length(12),
                Constraint::Length(16),
                Constraint::Min(12),
                Constraint::Length(15),
            ],
        )
        .header(header)
        .row_highlight_style(theme::table_selected());
        frame.render_stateful_widget(table, inner, &mut self.table_state.clone());
    }

    fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
        let (title, height) = match prompt {
            Prompt::None => return,
            Prompt::Filters(_) => ("Search filters", 3 * FIELD_HEIGHT + 4),
            Prompt::Cleanup(..) => ("Clean up records older than", FIELD_HEIGHT + 4),
            Prompt::Export(..) => ("Export CSV", FIELD_HEIGHT + 4),
        };
        let width = match prompt {
            Prompt::Filters(_) => 72,
            _ => 44,
        }
        .min(area.width.saturating_sub(2));
        let height = height.min(area.height);
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, popup);
        let block = panel(title, true).style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [body, error, hint] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let error_text = match prompt {
            Prompt::Filters(form) => {
                let rows = Layout::vertical([Constraint::Length(FIELD_HEIGHT); 3]).split(body);
                for (i, field) in form.fields.iter().enumerate() {
                    let [left, right] =
                        Layout::horizontal([Constraint::Percentage(50); 2]).areas(rows[i / 2]);
                    let cell = if i % 2 == 0 { left } else { right };
                    field.render(frame, cell, form.active == i);
                }
                form.error.as_deref()
            }
            Prompt::Cleanup(field, error) | Prompt::Export(field, error) => {
                field.render(frame, body, true);
                error.as_deref()
            }
            Prompt::None => None,
        };
        if let Some(message) = error_text {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" {message}"),
                    Style::default().fg(theme::ERROR_RED),
                )),
                error,
            );
        }
        frame.render_widget(
            Paragraph::new(Span::styled(" Enter submit  Esc cancel", theme::key_hint())),
            hint,
        );
    }
}

impl Component for AuditScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !matches!(self.prompt, Prompt::None) {
            return Ok(self.handle_prompt_key(key));
        }

        let len = self.result_count();
        let selected = self.table_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.table_state.select(Some(step(selected, 1, len)));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table_state.select(Some(step(selected, -1, len)));
            }
            KeyCode::PageDown => self.table_state.select(Some(step(selected, 10, len))),
            KeyCode::PageUp => self.table_state.select(Some(step(selected, -10, len))),
            KeyCode::Char('f' | '/') => {
                self.prompt = Prompt::Filters(FilterForm::from_filter(&self.view.filter));
            }
            KeyCode::Char('c') if !self.cleaning() => {
                self.prompt = Prompt::Cleanup(TextField::new("Days").with_value("90"), None);
            }
            KeyCode::Char('x') => {
                self.prompt = Prompt::Export(
                    TextField::new("Records").with_value(DEFAULT_EXPORT_LIMIT.to_string()),
                    None,
                );
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::AuditUpdated(view) => {
                self.view = Arc::clone(view);
                let len = self.result_count();
                let selected = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(step(selected, 0, len)));
            }
            Action::ControlsUpdated(controls) => self.controls = Arc::clone(controls),
            Action::Tick if self.cleaning() => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [filters, results, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(self.filter_summary()), filters);
        self.render_results(frame, results);
        self.render_status(frame, status);
        Self::render_prompt(frame, area, &self.prompt);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn captures_input(&self) -> bool {
        !matches!(self.prompt, Prompt::None)
    }

    fn hints(&self) -> &'static str {
        match self.prompt {
            Prompt::None => "j/k scroll  f filters  c clean up  x export",
            _ => "Tab next  Enter submit  Esc cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::{LogEntry, LogLevel, Loadable, SearchResults};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::screens::buffer_text;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(screen: &mut AuditScreen, text: &str) {
        for c in text.chars() {
            screen
                .handle_key_event(key(KeyCode::Char(c)))
                .unwrap_or_else(|e| panic!("{e}"));
        }
    }

    fn open_filters(screen: &mut AuditScreen) {
        screen
            .handle_key_event(key(KeyCode::Char('f')))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(screen.captures_input());
    }

    fn tab(screen: &mut AuditScreen, times: usize) {
        for _ in 0..times {
            screen
                .handle_key_event(key(KeyCode::Tab))
                .unwrap_or_else(|e| panic!("{e}"));
        }
    }

    #[test]
    fn submits_validated_filters() {
        let mut screen = AuditScreen::new();
        open_filters(&mut screen);
        type_text(&mut screen, "admin");
        tab(&mut screen, 2);
        type_text(&mut screen, "2026-01-10");
        tab(&mut screen, 1);
        type_text(&mut screen, "2026-01-12");

        let action = screen
            .handle_key_event(key(KeyCode::Enter))
            .unwrap_or_else(|e| panic!("{e}"));
        let Some(Action::SearchLogs(filter)) = action else {
            panic!("expected a search");
        };
        assert_eq!(filter.user.as_deref(), Some("admin"));
        assert_eq!(filter.level, None);
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2026, 1, 10));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2026, 1, 12));
        assert_eq!(filter.limit, DEFAULT_SEARCH_LIMIT);
        assert!(!screen.captures_input());
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let mut screen = AuditScreen::new();
        open_filters(&mut screen);
        tab(&mut screen, 2);
        type_text(&mut screen, "2026-02-01");
        tab(&mut screen, 1);
        type_text(&mut screen, "2026-01-01");

        let action = screen
            .handle_key_event(key(KeyCode::Enter))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(action.is_none());
        assert!(screen.captures_input());
    }

    #[test]
    fn cleanup_prompt_sends_days() {
        let mut screen = AuditScreen::new();
        screen
            .handle_key_event(key(KeyCode::Char('c')))
            .unwrap_or_else(|e| panic!("{e}"));
        let action = screen
            .handle_key_event(key(KeyCode::Enter))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(action, Some(Action::CleanupLogs(90))));
    }

    #[test]
    fn empty_search_shows_no_records_row() {
        let mut screen = AuditScreen::new();
        let view = AuditView {
            results: Loadable::Loaded(SearchResults::default()),
            ..AuditView::default()
        };
        screen
            .update(&Action::AuditUpdated(Arc::new(view)))
            .unwrap_or_else(|e| panic!("{e}"));

        let mut terminal =
            Terminal::new(TestBackend::new(100, 10)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(buffer_text(terminal.backend().buffer()).contains("No records match"));
    }

    #[test]
    fn results_show_count_and_mode_change() {
        let mut screen = AuditScreen::new();
        let entry = LogEntry {
            id: Some(7),
            timestamp: "2026-01-10 09:00:00".into(),
            level: LogLevel::Info,
            user: "admin".into(),
            event: "CAMBIO_MODO".into(),
            detail: String::new(),
            source_ip: None,
            previous_mode: Some("STANDBY".into()),
            new_mode: Some("CINE".into()),
        };
        let view = AuditView {
            results: Loadable::Loaded(SearchResults {
                entries: vec![entry],
                total: 12,
            }),
            ..AuditView::default()
        };
        screen
            .update(&Action::AuditUpdated(Arc::new(view)))
            .unwrap_or_else(|e| panic!("{e}"));

        let mut terminal =
            Terminal::new(TestBackend::new(120, 10)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap_or_else(|e| panic!("{e}"));
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("1 of 12"));
        assert!(text.contains("STANDBY → CINE"));
    }
}
