// ── Log viewer ──
//
// A bounded, newest-first window over the audit trail, refreshed on a
// timer. Each refresh replaces the whole window and scrolls back to the
// top. Refresh failures go to the trace log only.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::console::Console;
use crate::error::CoreError;
use crate::model::LogEntry;

/// The displayed log list and its scroll position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogWindow {
    /// Newest first, exactly as served.
    pub entries: Vec<LogEntry>,
    /// Index of the first visible entry. Reset to 0 on every refresh.
    pub offset: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl LogWindow {
    pub fn visible(&self) -> &[LogEntry] {
        self.entries.get(self.offset..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Console {
    /// Fetch the most recent entries and replace the window.
    pub async fn refresh_logs(&self) -> Result<usize, CoreError> {
        let limit = self.inner.config.effective_log_limit();
        let client = self.client().await?;
        let reply = client.recent_logs(limit).await?;

        let entries: Vec<LogEntry> = reply.logs.into_iter().map(LogEntry::from).collect();
        let count = entries.len();
        self.inner.logs.send_replace(LogWindow {
            entries,
            offset: 0,
            refreshed_at: Some(Utc::now()),
        });
        debug!(count, "log window refreshed");
        Ok(count)
    }

    /// Scroll the log window by `delta` rows, clamped to the list.
    pub fn scroll_logs(&self, delta: isize) {
        self.inner.logs.send_if_modified(|window| {
            let last = window.entries.len().saturating_sub(1);
            let next = window.offset.saturating_add_signed(delta).min(last);
            if next == window.offset {
                return false;
            }
            window.offset = next;
            true
        });
    }
}

/// Periodic log refresh. The first tick fires immediately and doubles
/// as the initial load.
pub(crate) async fn log_refresh_task(
    console: Console,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = console.refresh_logs().await {
                    warn!(error = %e, "log refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;

    fn entry(ts: &str) -> LogEntry {
        LogEntry {
            id: None,
            timestamp: ts.into(),
            level: LogLevel::Info,
            user: "Sistema".into(),
            event: "CAMBIO_MODO".into(),
            detail: String::new(),
            source_ip: None,
            previous_mode: None,
            new_mode: None,
        }
    }

    #[test]
    fn visible_starts_at_offset() {
        let window = LogWindow {
            entries: vec![entry("t2"), entry("t1")],
            offset: 1,
            refreshed_at: None,
        };
        assert_eq!(window.visible().len(), 1);
        assert_eq!(window.visible()[0].timestamp, "t1");
    }

    #[test]
    fn out_of_range_offset_shows_nothing() {
        let window = LogWindow {
            entries: vec![entry("t1")],
            offset: 5,
            refreshed_at: None,
        };
        assert!(window.visible().is_empty());
    }
}
