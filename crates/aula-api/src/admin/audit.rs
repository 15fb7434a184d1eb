use tracing::debug;
use url::Url;

use crate::client::AulaClient;
use crate::error::Error;
use crate::models::{CleanupReply, CleanupRequest, LogSearchRequest, LogsReply};

impl AulaClient {
    /// Search the audit log with filters.
    ///
    /// `POST /api/admin/logs/buscar`. User and event filters are substring
    /// matches; level is exact; dates are inclusive bounds.
    pub async fn search_logs(&self, filter: &LogSearchRequest) -> Result<LogsReply, Error> {
        let url = self.url("api/admin/logs/buscar")?;
        debug!(?filter, "searching logs");
        self.post(url, filter).await
    }

    /// Delete log records older than `days`. Returns the removed count.
    ///
    /// `POST /api/admin/logs/limpiar` with `{dias}`
    pub async fn cleanup_logs(&self, days: u32) -> Result<CleanupReply, Error> {
        let url = self.url("api/admin/logs/limpiar")?;
        debug!(days, "cleaning up logs");
        self.post(url, &CleanupRequest { dias: days }).await
    }

    /// Download URL for the CSV export of the latest `limit` records.
    ///
    /// The server renders the file itself; browsers navigate here.
    pub fn export_logs_url(&self, limit: u32) -> Result<Url, Error> {
        let mut url = self.url("api/admin/exportar/logs")?;
        url.query_pairs_mut()
            .append_pair("limite", &limit.to_string());
        Ok(url)
    }

    /// Download the CSV export.
    ///
    /// `GET /api/admin/exportar/logs?limite=N`
    pub async fn export_logs(&self, limit: u32) -> Result<bytes::Bytes, Error> {
        let url = self.export_logs_url(limit)?;
        self.get_bytes(url).await
    }
}
