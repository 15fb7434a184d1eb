//! Client-side state and behaviour between `aula-api` and the CLI / TUI.
//!
//! - **[`Console`]**: facade over one server session.
//!   [`connect()`](Console::connect) logs in and starts the periodic log
//!   refresh; [`Console::oneshot()`](Console::oneshot) runs a single
//!   request cycle for CLI invocations. All displayed data lives in
//!   `watch` channels the views subscribe to; outcomes are published as
//!   [`Notice`]s.
//!
//! - **Components**: the state poller ([`Console::refresh_state`]), the
//!   command dispatcher ([`Console::activate_mode`]), the
//!   [`ConfirmationGuard`] in front of destructive actions, the
//!   [`LogWindow`] refreshed on a timer, and the admin panels behind
//!   [`AdminTab`].
//!
//! - **Busy controls**: [`ControlBoard`] marks the triggering control busy
//!   for the duration of its own request and restores it on every exit
//!   path via [`BusyGuard`].
//!
//! - **Domain model** ([`model`]): read-only copies of what the server
//!   last sent (`SystemState`, `LogEntry`, `User`, `ConfigEntry`, ...).

pub mod admin;
pub mod config;
pub mod console;
pub mod control;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod logs;
pub mod model;
pub mod notice;
pub mod poller;

// ── Primary re-exports ──────────────────────────────────────────────
pub use admin::{
    AdminTab, AnalyticsSection, AnalyticsView, AuditView, Loadable, SearchResults, SettingsView,
};
pub use config::{ConsoleConfig, Credentials, TlsVerification};
pub use console::{ConnectionState, Console};
pub use control::{BusyGuard, ControlBoard, ControlId, ControlMap, ControlState};
pub use dispatch::{ConfirmOutcome, DispatchOutcome};
pub use error::CoreError;
pub use guard::{ConfirmationGuard, PendingAction};
pub use logs::LogWindow;
pub use notice::{Notice, NoticeLevel};

pub use model::{
    ConfigEntry, ConfigKind, DailyEvents, Indicator, LogEntry, LogFilter, LogLevel, Metric, Mode,
    ModeChange, ModeUsage, Role, Statistics, SystemState, User, UserActivity, UserDraft,
};
