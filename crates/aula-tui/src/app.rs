//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aula_core::{ControlMap, Console, CoreError, Notice, PendingAction};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::confirm;
use crate::widgets::toast::Toast;

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Connection lost or refused, with the reason.
    Failed(String),
}

/// Top-level application state and event loop.
pub struct App {
    console: Console,
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    /// Destructive action awaiting yes/no. Blocks all other input.
    pending: Option<PendingAction>,
    /// Visible notices, oldest first.
    toasts: Vec<Toast>,
    controls: Arc<ControlMap>,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(console: Console) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();

        Self {
            console,
            active_screen: ScreenId::Dashboard,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            pending: None,
            toasts: Vec::new(),
            controls: Arc::new(ControlMap::new()),
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_screens()?;

        let console = self.console.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(console, tx, cancel).await;
        });

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    fn active(&self) -> Option<&dyn Component> {
        self.screens.get(&self.active_screen).map(Box::as_ref)
    }

    /// Map a key event to an action. The confirmation prompt takes every
    /// key first, then global keys, then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.pending.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        // Forms own the keyboard while open
        if self.active().is_some_and(Component::captures_input) {
            if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                return screen.handle_key_event(key);
            }
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                return Ok(Some(Action::ToggleHelp));
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => return Ok(Some(Action::Reload)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='5')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (_, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if let Some(pending) = &self.pending {
            let area = self.content_area();
            let outside = confirm::is_outside(area, pending, mouse.column, mouse.row);
            return Ok(match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) if outside => Some(Action::ConfirmNo),
                _ => None,
            });
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_mouse_event(mouse);
        }
        Ok(None)
    }

    fn content_area(&self) -> Rect {
        let (w, h) = self.terminal_size;
        Rect::new(0, 0, w, h)
    }

    /// Run a console request in the background. Failures are already
    /// published as notices by the console, so they are only logged.
    fn spawn_request<F, Fut, T>(&self, what: &'static str, request: F)
    where
        F: FnOnce(Console) -> Fut,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
        T: Send + 'static,
    {
        let fut = request(self.console.clone());
        tokio::spawn(async move {
            if let Err(e) = fut.await {
                debug!(error = %e, what, "request failed");
            }
        });
    }

    /// Load the panels behind `screen` that have not been loaded yet.
    fn activate_tabs(&self, screen: ScreenId) {
        if self.connection_status != ConnectionStatus::Connected {
            return;
        }
        for &tab in screen.tabs() {
            self.spawn_request("activate tab", move |c| async move { c.activate_tab(tab).await });
        }
    }

    fn reload_active(&self) {
        if self.connection_status != ConnectionStatus::Connected {
            return;
        }
        for &tab in self.active_screen.tabs() {
            self.spawn_request("reload tab", move |c| async move { c.reload_tab(tab).await });
        }
        if self.active_screen == ScreenId::Dashboard {
            self.spawn_request("refresh state", |c| async move { c.refresh_state().await });
            self.spawn_request("refresh logs", |c| async move { c.refresh_logs().await });
        }
    }

    fn export_logs(&self, limit: u32) {
        let tx = self.action_tx.clone();
        let console = self.console.clone();
        tokio::spawn(async move {
            let path = PathBuf::from(format!(
                "aula-logs-{}.csv",
                Local::now().format("%Y%m%d-%H%M%S")
            ));
            let notice = match console.export_logs(limit).await {
                Ok(csv) => match tokio::fs::write(&path, &csv).await {
                    Ok(()) => {
                        info!(path = %path.display(), bytes = csv.len(), "audit log exported");
                        Notice::success(format!("Exported to {}", path.display()))
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to write export");
                        Notice::error(format!("Could not write {}: {e}", path.display()))
                    }
                },
                Err(e) => Notice::error(e.notice_text()),
            };
            let _ = tx.send(Action::Notify(notice));
        });
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Apply one action to app state and forward it where it belongs.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Resize(w, h) => self.terminal_size = (*w, *h),

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                    self.activate_tabs(*target);
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Reload => self.reload_active(),

            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,

            Action::Connected => {
                let first = self.connection_status != ConnectionStatus::Connected;
                self.connection_status = ConnectionStatus::Connected;
                if first {
                    self.activate_tabs(self.active_screen);
                }
            }

            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Failed(reason.clone());
            }

            Action::Render => {}

            Action::Tick => {
                let now = Instant::now();
                self.toasts.retain(|t| !t.is_expired(now));
                self.broadcast(action)?;
            }

            Action::ControlsUpdated(controls) => {
                self.controls = Arc::clone(controls);
                self.broadcast(action)?;
            }

            Action::StateUpdated(_)
            | Action::LogsUpdated(_)
            | Action::StatisticsUpdated(_)
            | Action::UsersUpdated(_)
            | Action::AuditUpdated(_)
            | Action::AnalyticsUpdated(_)
            | Action::SettingsUpdated(_) => self.broadcast(action)?,

            Action::ConfirmationChanged(pending) => self.pending.clone_from(pending),

            Action::ActivateMode(mode) => {
                let mode = *mode;
                self.spawn_request("activate mode", move |c| async move {
                    c.activate_mode(mode).await
                });
            }

            Action::ScrollLogs(delta) => self.console.scroll_logs(*delta),

            Action::SaveUser(draft) => {
                let draft = (**draft).clone();
                self.spawn_request("save user", move |c| async move { c.save_user(draft).await });
            }

            Action::DeactivateUser(user) => self.console.request_deactivate(user),

            Action::SearchLogs(filter) => {
                let filter = (**filter).clone();
                self.spawn_request("search logs", move |c| async move {
                    c.search_logs(filter).await
                });
            }

            Action::CleanupLogs(days) => {
                // Zero days is reported as a notice by the console
                let _ = self.console.request_cleanup(*days);
            }

            Action::ExportLogs(limit) => self.export_logs(*limit),

            Action::SaveSetting { key, value } => {
                let (key, value) = (key.clone(), value.clone());
                self.spawn_request("save setting", move |c| async move {
                    c.save_setting(&key, &value).await
                });
            }

            Action::FilterSettings(category) => {
                let category = category.clone();
                self.spawn_request("load settings", move |c| async move {
                    c.load_settings(category).await
                });
            }

            Action::ConfirmYes => {
                self.spawn_request("confirm", |c| async move { c.confirm().await });
            }

            Action::ConfirmNo => {
                self.console.cancel_confirmation();
            }

            Action::Notify(notice) => self.toasts.push(Toast::new(notice.clone())),
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content, tab_bar, status_bar] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.active() {
            screen.render(frame, content);
        }
        self.render_tab_bar(frame, tab_bar);
        self.render_status_bar(frame, status_bar);

        // Topmost last
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
        if let Some(pending) = &self.pending {
            confirm::render(frame, area, pending);
        }
        for (slot, toast) in self.toasts.iter().rev().enumerate() {
            let slot = u16::try_from(slot).unwrap_or(u16::MAX);
            toast.render(frame, area, slot);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection = match &self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Failed(reason) => Span::styled(
                format!("○ {reason}"),
                Style::default().fg(theme::ERROR_RED),
            ),
        };

        let busy = self.controls.values().filter(|c| c.busy).count();
        let mut spans = vec![
            Span::raw(" "),
            connection,
            Span::styled(format!("  {}", self.console.config().url), theme::muted()),
        ];
        if busy > 0 {
            spans.push(Span::styled(
                format!("  {busy} in flight"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        let hints = self.active().map_or("", Component::hints);
        if !hints.is_empty() {
            spans.push(Span::styled(format!(" │ {hints}"), theme::key_hint()));
        }
        spans.push(Span::styled(" │ ? help  q quit", theme::key_hint()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 60u16.min(area.width.saturating_sub(4));
        let height = 20u16.min(area.height.saturating_sub(4));
        let help_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::NEON_CYAN)))
        };
        let binding = |keys: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {keys:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let lines = vec![
            Line::from(""),
            section("Navigation"),
            binding("1-5", "Jump to screen"),
            binding("Tab/S-Tab", "Next / previous screen"),
            binding("j/k ↑/↓", "Move selection"),
            binding("r", "Reload this screen"),
            Line::from(""),
            section("Dashboard"),
            binding("c i s o", "Conferencia / Cine / Standby / Off"),
            binding("h/l Enter", "Pick and press a mode button"),
            Line::from(""),
            section("Admin"),
            binding("n e d", "New / edit / deactivate user"),
            binding("f c x", "Filter / clean up / export logs"),
            binding("Enter Space", "Edit / toggle a setting"),
            Line::from(""),
            binding("? Esc", "Close this help"),
            binding("q Ctrl+C", "Quit"),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use aula_core::ConsoleConfig;

    use crate::screens::buffer_text;

    fn app() -> App {
        let url = "http://aula.local:5000"
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));
        App::new(Console::new(ConsoleConfig::new(url)))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) -> Option<Action> {
        app.handle_key_event(key(code))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn pending_confirmation_takes_every_key() {
        let mut app = app();
        app.process_action(&Action::ConfirmationChanged(Some(PendingAction::power_off())))
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(press(&mut app, KeyCode::Enter), Some(Action::ConfirmYes)));
        assert!(matches!(press(&mut app, KeyCode::Char('y')), Some(Action::ConfirmYes)));
        assert!(matches!(press(&mut app, KeyCode::Esc), Some(Action::ConfirmNo)));
        assert!(press(&mut app, KeyCode::Char('q')).is_none());
        assert!(press(&mut app, KeyCode::Char('2')).is_none());
    }

    fn click(app: &mut App, column: u16, row: u16) -> Option<Action> {
        app.handle_mouse_event(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
        .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn click_outside_dialog_cancels_confirmation() {
        let mut app = app();
        app.process_action(&Action::Resize(80, 24))
            .unwrap_or_else(|e| panic!("{e}"));
        let pending = PendingAction::power_off();
        app.process_action(&Action::ConfirmationChanged(Some(pending.clone())))
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(click(&mut app, 0, 0), Some(Action::ConfirmNo)));

        let dialog = confirm::dialog_area(Rect::new(0, 0, 80, 24), &pending);
        let inside = click(
            &mut app,
            dialog.x + dialog.width / 2,
            dialog.y + dialog.height / 2,
        );
        assert!(inside.is_none());
    }

    #[test]
    fn number_keys_switch_screens() {
        let mut app = app();
        let action = press(&mut app, KeyCode::Char('3'));
        assert!(matches!(action, Some(Action::SwitchScreen(ScreenId::Audit))));

        app.process_action(&Action::SwitchScreen(ScreenId::Audit))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(app.active_screen, ScreenId::Audit);
        let action = press(&mut app, KeyCode::Tab);
        assert!(matches!(action, Some(Action::SwitchScreen(ScreenId::Analytics))));
    }

    #[test]
    fn open_form_swallows_global_keys() {
        let mut app = app();
        app.process_action(&Action::SwitchScreen(ScreenId::Users))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(press(&mut app, KeyCode::Char('n')).is_none());
        // 'q' is typed into the username field
        assert!(press(&mut app, KeyCode::Char('q')).is_none());
        assert!(app.running);
    }

    #[test]
    fn notices_become_toasts_and_render() {
        let mut app = app();
        app.process_action(&Action::Notify(Notice::success("Modo CINE activado")))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(app.toasts.len(), 1);

        let mut terminal =
            Terminal::new(TestBackend::new(120, 30)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| app.render(frame))
            .unwrap_or_else(|e| panic!("{e}"));
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Modo CINE activado"));
        assert!(text.contains("1 Dashboard"));
        assert!(text.contains("5 Settings"));
        assert!(text.contains("aula.local"));
    }

    #[test]
    fn confirm_dialog_renders_prompt() {
        let mut app = app();
        let pending = PendingAction::CleanupLogs { days: 30 };
        app.process_action(&Action::ConfirmationChanged(Some(pending.clone())))
            .unwrap_or_else(|e| panic!("{e}"));

        let mut terminal =
            Terminal::new(TestBackend::new(120, 30)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| app.render(frame))
            .unwrap_or_else(|e| panic!("{e}"));
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains(pending.title()));
    }
}
