// ── Audit log domain types ──

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Severity of an audit log entry. A missing level reads as `Info`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
    Other(String),
}

impl LogLevel {
    pub fn from_wire(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Info;
        };
        match raw.to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARN" | "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit trail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Option<i64>,
    pub timestamp: String,
    pub level: LogLevel,
    pub user: String,
    pub event: String,
    pub detail: String,
    pub source_ip: Option<String>,
    /// Mode before/after, present on mode-change rows from the search.
    pub previous_mode: Option<String>,
    pub new_mode: Option<String>,
}

/// Admin log search filters. Empty fields mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub user: Option<String>,
    pub level: Option<String>,
    pub from: Option<NaiveDate>,
    /// Inclusive: entries from any time on this day match.
    pub to: Option<NaiveDate>,
    pub event: Option<String>,
    pub limit: u32,
}

/// Result cap the search uses when none is given.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            user: None,
            level: None,
            from: None,
            to: None,
            event: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl LogFilter {
    /// Date bounds as the server compares them (text against `fecha`).
    pub(crate) fn from_bound(&self) -> Option<String> {
        self.from.map(|d| d.format("%Y-%m-%d 00:00:00").to_string())
    }

    pub(crate) fn to_bound(&self) -> Option<String> {
        self.to.map(|d| d.format("%Y-%m-%d 23:59:59").to_string())
    }
}
