// ── Domain model ──
//
// Canonical client-side types. Every value here is a read-only copy of
// what the server last sent; nothing is derived or mutated locally.

pub mod analytics;
pub mod log;
pub mod settings;
pub mod state;
pub mod user;

pub use analytics::{DailyEvents, ModeChange, ModeUsage, Statistics, UserActivity};
pub use log::{LogEntry, LogFilter, LogLevel};
pub use settings::{ConfigEntry, ConfigKind};
pub use state::{Indicator, Metric, Mode, SystemState};
pub use user::{Role, User, UserDraft};
