// ── Audit log panel: search, cleanup, export ──

use aula_api::models::LogSearchRequest;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::Loadable;
use crate::console::Console;
use crate::control::ControlId;
use crate::error::CoreError;
use crate::guard::PendingAction;
use crate::model::{LogEntry, LogFilter};
use crate::notice::Notice;

/// Upper bound on search results per request.
pub const MAX_SEARCH_LIMIT: u32 = 1000;

/// Record count the CSV export asks for when none is given.
pub const DEFAULT_EXPORT_LIMIT: u32 = 1000;

/// One search's results. An empty `entries` renders as a "no records" row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub entries: Vec<LogEntry>,
    /// Server-reported match count (may exceed `entries.len()`).
    pub total: u64,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditView {
    /// Filters of the last submitted search.
    pub filter: LogFilter,
    pub results: Loadable<SearchResults>,
    /// Records removed by the last cleanup in this session.
    pub last_cleanup: Option<u64>,
}

impl Console {
    /// Run a filtered search and replace the results table.
    pub async fn search_logs(&self, filter: LogFilter) -> Result<SearchResults, CoreError> {
        let request = search_request(&filter);
        self.inner.admin.audit.send_modify(|view| {
            view.filter = filter;
            view.results = Loadable::Loading;
        });

        let result = async {
            let client = self.client().await?;
            Ok::<_, CoreError>(client.search_logs(&request).await?)
        }
        .await;

        match result {
            Ok(reply) => {
                let entries: Vec<LogEntry> = reply.logs.into_iter().map(LogEntry::from).collect();
                let total = reply
                    .total
                    .unwrap_or_else(|| u64::try_from(entries.len()).unwrap_or(u64::MAX));
                let results = SearchResults { entries, total };
                debug!(total, "log search finished");
                self.inner.admin.audit.send_modify(|view| {
                    view.results = Loadable::Loaded(results.clone());
                });
                Ok(results)
            }
            Err(e) => {
                self.inner.admin.audit.send_modify(|view| {
                    view.results = Loadable::Failed(e.notice_text());
                });
                self.report_load_failure("audit", &e);
                Err(e)
            }
        }
    }

    /// Ask for confirmation before purging records older than `days`.
    pub fn request_cleanup(&self, days: u32) -> Result<(), CoreError> {
        if days == 0 {
            let e = CoreError::ValidationFailed {
                message: "cleanup threshold must be at least one day".into(),
            };
            self.notify(Notice::error(e.notice_text()));
            return Err(e);
        }
        self.request_confirmation(PendingAction::CleanupLogs { days });
        Ok(())
    }

    pub(crate) async fn run_cleanup(&self, days: u32) -> Result<u64, CoreError> {
        let Some(_busy) = self.inner.controls.begin(ControlId::CleanupLogs) else {
            debug!("cleanup already in flight");
            return Ok(0);
        };

        let result = async {
            let client = self.client().await?;
            Ok::<_, CoreError>(client.cleanup_logs(days).await?)
        }
        .await;

        match result {
            Ok(reply) => {
                let removed = reply.eliminados;
                info!(days, removed, "audit log cleaned up");
                self.inner.admin.audit.send_modify(|view| {
                    view.last_cleanup = Some(removed);
                });
                self.notify(Notice::success(format!(
                    "Removed {removed} log record{}",
                    if removed == 1 { "" } else { "s" }
                )));
                self.refresh_after_cleanup().await;
                Ok(removed)
            }
            Err(e) => {
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }

    /// Re-fetch the panels that may still show purged records. Panels
    /// never loaded in this session stay untouched.
    async fn refresh_after_cleanup(&self) {
        let filter = {
            let view = self.inner.admin.audit.borrow();
            (!matches!(view.results, Loadable::NotLoaded)).then(|| view.filter.clone())
        };
        if let Some(filter) = filter {
            let _ = self.search_logs(filter).await;
        }
        if !matches!(*self.inner.admin.statistics.borrow(), Loadable::NotLoaded) {
            let _ = self.load_statistics().await;
        }
    }

    /// URL of the server-rendered CSV download.
    pub async fn export_url(&self, limit: u32) -> Result<Url, CoreError> {
        let client = self.client().await?;
        Ok(client.export_logs_url(limit.max(1))?)
    }

    /// Download the server-rendered CSV.
    pub async fn export_logs(&self, limit: u32) -> Result<bytes::Bytes, CoreError> {
        let client = self.client().await?;
        Ok(client.export_logs(limit.max(1)).await?)
    }
}

fn search_request(filter: &LogFilter) -> LogSearchRequest {
    LogSearchRequest {
        usuario: text(filter.user.as_deref()),
        nivel: text(filter.level.as_deref()).map(|l| l.to_ascii_uppercase()),
        fecha_desde: filter.from_bound(),
        fecha_hasta: filter.to_bound(),
        evento: text(filter.event.as_deref()),
        limite: filter.limit.clamp(1, MAX_SEARCH_LIMIT),
    }
}

fn text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}
