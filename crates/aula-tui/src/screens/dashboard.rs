//! Dashboard screen: system state, mode controls and the live log list.
//!
//! Layout:
//! ┌─ System ───────────────────┐┌─ Summary ──────────────────┐
//! │ ● CINE 3D   CPU   Latency  ││ logs / users / changes     │
//! └────────────────────────────┘└────────────────────────────┘
//! [ CONFERENCIA ] [ CINE ] [ STANDBY ] [ OFF ]
//! ┌─ Recent activity ─────────────────────────────────────────┐
//! │ time  level  user  event  detail                          │
//! └───────────────────────────────────────────────────────────┘

use std::cell::Cell;
use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell as TableCell, Paragraph, Row, Table};
use throbber_widgets_tui::{Throbber, ThrobberState};

use aula_core::{
    ControlId, ControlMap, Loadable, LogWindow, Mode, Statistics, SystemState,
};

use crate::action::Action;
use crate::component::Component;
use crate::screens::{loaded_or_placeholder, panel};
use crate::theme;

/// Mode buttons in display order with their shortcut keys.
const MODES: [(Mode, char); 4] = [
    (Mode::Conferencia, 'c'),
    (Mode::Cine, 'i'),
    (Mode::Standby, 's'),
    (Mode::Off, 'o'),
];

const PAGE: isize = 10;

pub struct DashboardScreen {
    focused: bool,
    state: Option<Arc<SystemState>>,
    logs: Arc<LogWindow>,
    controls: Arc<ControlMap>,
    statistics: Arc<Loadable<Statistics>>,
    selected: usize,
    throbber: ThrobberState,
    buttons_area: Cell<Rect>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            state: None,
            logs: Arc::new(LogWindow::default()),
            controls: Arc::new(ControlMap::new()),
            statistics: Arc::new(Loadable::NotLoaded),
            selected: 0,
            throbber: ThrobberState::default(),
            buttons_area: Cell::new(Rect::default()),
        }
    }

    fn is_busy(&self, mode: Mode) -> bool {
        self.controls
            .get(&ControlId::Mode(mode))
            .is_some_and(|c| c.busy)
    }

    /// Activate `mode` unless its control is still waiting on a reply.
    fn activate(&self, mode: Mode) -> Option<Action> {
        (!self.is_busy(mode)).then_some(Action::ActivateMode(mode))
    }

    fn render_state(&self, frame: &mut Frame, area: Rect) {
        let block = panel("System", self.focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(state) = self.state.as_deref() else {
            frame.render_widget(
                Paragraph::new(Span::styled("  Waiting for the server...", theme::muted())),
                inner,
            );
            return;
        };

        let indicator = state.indicator();
        let color = theme::indicator_color(indicator);
        let metric = |m: &aula_core::Metric| {
            if m.display.is_empty() {
                "-".to_owned()
            } else {
                m.display.clone()
            }
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("  ● ", Style::default().fg(color)),
                Span::styled(
                    state.mode_label.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  ({indicator})"), theme::muted()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  CPU load  ", theme::key_hint()),
                Span::styled(metric(&state.cpu_load), theme::table_row()),
            ]),
            Line::from(vec![
                Span::styled("  Latency   ", theme::key_hint()),
                Span::styled(metric(&state.latency), theme::table_row()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let block = panel("Summary", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(stats) = loaded_or_placeholder(frame, inner, &self.statistics) else {
            return;
        };

        let row = |label: &str, value: u64| {
            Line::from(vec![
                Span::styled(format!("  {label:<15}"), theme::key_hint()),
                Span::styled(value.to_string(), theme::table_row()),
            ])
        };
        let mut lines = vec![
            row("Log entries", stats.total_logs),
            row("Active users", stats.active_users),
            row("Changes today", stats.changes_today),
        ];
        let errors = stats.errors();
        if errors > 0 {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<15}", "Errors"), theme::key_hint()),
                Span::styled(errors.to_string(), Style::default().fg(theme::ERROR_RED)),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect) {
        self.buttons_area.set(area);
        let cells = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        let active_mode = self.state.as_deref().and_then(|s| s.mode);

        for (i, ((mode, key), cell)) in MODES.iter().zip(cells.iter()).enumerate() {
            let control = self.controls.get(&ControlId::Mode(*mode));
            let busy = control.is_some_and(|c| c.busy);
            let label = control.map_or_else(|| mode.to_string(), |c| c.label.clone());

            let border = if i == self.selected && self.focused {
                theme::border_focused()
            } else if active_mode == Some(*mode) {
                Style::default().fg(theme::SUCCESS_GREEN)
            } else {
                theme::border_default()
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border);
            let inner = block.inner(*cell);
            frame.render_widget(block, *cell);

            if busy {
                let throbber = Throbber::default()
                    .label(label)
                    .style(theme::muted())
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                frame.render_stateful_widget(throbber, inner, &mut self.throbber.clone());
            } else {
                let style = if *mode == Mode::Off {
                    Style::default().fg(theme::ERROR_RED)
                } else {
                    theme::table_row()
                };
                let line = Line::from(vec![
                    Span::styled(format!("[{key}] "), theme::key_hint_key()),
                    Span::styled(label, style.add_modifier(Modifier::BOLD)),
                ])
                .centered();
                frame.render_widget(Paragraph::new(line), inner);
            }
        }
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect) {
        let refreshed = self.logs.refreshed_at.map_or_else(
            || "never".to_owned(),
            |at| {
                let age = (Utc::now() - at).to_std().unwrap_or_default();
                let secs = std::time::Duration::from_secs(age.as_secs());
                format!("{} ago", humantime::format_duration(secs))
            },
        );
        let block = panel("Recent activity", false).title_bottom(
            Line::from(Span::styled(format!(" refreshed {refreshed} "), theme::muted()))
                .right_aligned(),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No log entries", theme::muted())),
                inner,
            );
            return;
        }

        let header = Row::new(["Time", "Level", "User", "Event", "Detail"]).style(theme::table_header());
        let rows = self.logs.visible().iter().map(|entry| {
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
                TableCell::from(entry.detail.clone()),
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
                Constraint::Min(10),
            ],
        )
        .header(header)
        .column_spacing(1);
        frame.render_widget(table, inner);
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected = (self.selected + 1).min(MODES.len() - 1);
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => MODES
                .get(self.selected)
                .and_then(|(mode, _)| self.activate(*mode)),
            KeyCode::Char(c) if MODES.iter().any(|(_, k)| *k == c) => MODES
                .iter()
                .find(|(_, k)| *k == c)
                .and_then(|(mode, _)| self.activate(*mode)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollLogs(1)),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollLogs(-1)),
            KeyCode::PageDown => Some(Action::ScrollLogs(PAGE)),
            KeyCode::PageUp => Some(Action::ScrollLogs(-PAGE)),
            KeyCode::Home | KeyCode::Char('g') => Some(Action::ScrollLogs(
                -isize::try_from(self.logs.offset).unwrap_or(isize::MAX),
            )),
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let area = self.buttons_area.get();
            if area.contains(Position::new(mouse.column, mouse.row)) {
                let cells = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
                if let Some(i) = cells
                    .iter()
                    .position(|c| c.contains(Position::new(mouse.column, mouse.row)))
                {
                    self.selected = i;
                    return Ok(MODES.get(i).and_then(|(mode, _)| self.activate(*mode)));
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateUpdated(state) => self.state.clone_from(state),
            Action::LogsUpdated(window) => self.logs = Arc::clone(window),
            Action::ControlsUpdated(controls) => self.controls = Arc::clone(controls),
            Action::StatisticsUpdated(stats) => self.statistics = Arc::clone(stats),
            Action::Tick => {
                if MODES.iter().any(|(mode, _)| self.is_busy(*mode)) {
                    self.throbber.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(5),
        ])
        .split(area);
        let top = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        self.render_state(frame, top[0]);
        self.render_summary(frame, top[1]);
        self.render_buttons(frame, rows[1]);
        self.render_logs(frame, rows[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        "←/→ select  Enter activate  c/i/s/o mode  j/k scroll  r reload"
    }
}
