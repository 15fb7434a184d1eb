//! Every state transition in the TUI is an [`Action`].

use std::sync::Arc;

use aula_core::{
    AuditView, AnalyticsView, ControlMap, LogFilter, LogWindow, Loadable, Mode, Notice,
    PendingAction, SettingsView, Statistics, SystemState, User, UserDraft,
};

use crate::screen::ScreenId;

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,
    /// Re-fetch the active screen's panels.
    Reload,

    // ── Connection ────────────────────────────────────────────────
    Connecting,
    Connected,
    Disconnected(String),

    // ── Console channels ──────────────────────────────────────────
    StateUpdated(Option<Arc<SystemState>>),
    LogsUpdated(Arc<LogWindow>),
    ControlsUpdated(Arc<ControlMap>),
    StatisticsUpdated(Arc<Loadable<Statistics>>),
    UsersUpdated(Arc<Loadable<Vec<User>>>),
    AuditUpdated(Arc<AuditView>),
    AnalyticsUpdated(Arc<AnalyticsView>),
    SettingsUpdated(Arc<SettingsView>),
    ConfirmationChanged(Option<PendingAction>),

    // ── Requests ──────────────────────────────────────────────────
    ActivateMode(Mode),
    ScrollLogs(isize),
    SaveUser(Box<UserDraft>),
    DeactivateUser(Box<User>),
    SearchLogs(Box<LogFilter>),
    CleanupLogs(u32),
    ExportLogs(u32),
    SaveSetting { key: String, value: String },
    /// Reload settings for one category (`None` = all).
    FilterSettings(Option<String>),

    // ── Confirm dialog ────────────────────────────────────────────
    ConfirmYes,
    ConfirmNo,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notice),
}
