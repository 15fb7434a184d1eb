use url::Url;

use crate::client::AulaClient;
use crate::error::Error;
use crate::models::{
    DailyEventsReply, ModeUsageReply, RawDailyEvents, RawModeChange, RawModeUsage,
    RawStatistics, RawUserActivity, StatisticsReply, TimelineReply, UserActivityReply,
};

impl AulaClient {
    fn analytics_url(&self, feed: &str, param: Option<(&str, u32)>) -> Result<Url, Error> {
        let mut url = self.url(&format!("api/admin/analiticas/{feed}"))?;
        if let Some((key, value)) = param {
            url.query_pairs_mut().append_pair(key, &value.to_string());
        }
        Ok(url)
    }

    /// Summary counters for the statistics panel.
    ///
    /// `GET /api/admin/estadisticas`
    pub async fn statistics(&self) -> Result<RawStatistics, Error> {
        let url = self.url("api/admin/estadisticas")?;
        let reply: StatisticsReply = self.get(url).await?;
        Ok(reply.estadisticas)
    }

    /// Most active users by action count.
    ///
    /// `GET /api/admin/analiticas/usuarios?limite=N`
    pub async fn user_activity(&self, limit: u32) -> Result<Vec<RawUserActivity>, Error> {
        let url = self.analytics_url("usuarios", Some(("limite", limit)))?;
        let reply: UserActivityReply = self.get(url).await?;
        Ok(reply.actividad)
    }

    /// Event counts per day over the last `days` days, oldest first.
    ///
    /// `GET /api/admin/analiticas/eventos-diarios?dias=N`
    pub async fn daily_events(&self, days: u32) -> Result<Vec<RawDailyEvents>, Error> {
        let url = self.analytics_url("eventos-diarios", Some(("dias", days)))?;
        let reply: DailyEventsReply = self.get(url).await?;
        Ok(reply.eventos)
    }

    /// Recent mode changes, newest first.
    ///
    /// `GET /api/admin/analiticas/timeline-modos?limite=N`
    pub async fn mode_timeline(&self, limit: u32) -> Result<Vec<RawModeChange>, Error> {
        let url = self.analytics_url("timeline-modos", Some(("limite", limit)))?;
        let reply: TimelineReply = self.get(url).await?;
        Ok(reply.timeline)
    }

    /// How often each mode was selected, and by how many users.
    ///
    /// `GET /api/admin/analiticas/uso-por-modo`
    pub async fn mode_usage(&self) -> Result<Vec<RawModeUsage>, Error> {
        let url = self.analytics_url("uso-por-modo", None)?;
        let reply: ModeUsageReply = self.get(url).await?;
        Ok(reply.modos)
    }
}
