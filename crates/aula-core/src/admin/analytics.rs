// ── Analytics panel ──
//
// Independent feeds loaded concurrently. Each section records its own
// outcome, so one failing feed never blanks the others.

use futures_util::future::join_all;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::warn;

use super::Loadable;
use crate::console::Console;
use crate::error::CoreError;
use crate::model::{DailyEvents, ModeChange, ModeUsage, UserActivity};

pub const TOP_USERS_LIMIT: u32 = 10;
pub const TIMELINE_LIMIT: u32 = 20;
pub const DAILY_EVENT_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AnalyticsSection {
    Users,
    Modes,
    Timeline,
    Daily,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub top_users: Loadable<Vec<UserActivity>>,
    pub mode_usage: Loadable<Vec<ModeUsage>>,
    pub timeline: Loadable<Vec<ModeChange>>,
    pub daily: Loadable<Vec<DailyEvents>>,
}

impl AnalyticsView {
    pub fn failures(&self) -> Vec<(AnalyticsSection, &str)> {
        [
            (AnalyticsSection::Users, self.top_users.error()),
            (AnalyticsSection::Modes, self.mode_usage.error()),
            (AnalyticsSection::Timeline, self.timeline.error()),
            (AnalyticsSection::Daily, self.daily.error()),
        ]
        .into_iter()
        .filter_map(|(section, err)| err.map(|e| (section, e)))
        .collect()
    }
}

impl Console {
    /// Load every analytics feed concurrently.
    pub async fn load_analytics(&self) -> AnalyticsView {
        let all: Vec<AnalyticsSection> = AnalyticsSection::iter().collect();
        self.load_analytics_sections(&all).await
    }

    /// Load the given feeds concurrently. Failures are recorded per
    /// section and never stop the other loads.
    pub async fn load_analytics_sections(&self, sections: &[AnalyticsSection]) -> AnalyticsView {
        join_all(sections.iter().map(|s| self.load_analytics_section(*s))).await;
        self.inner.admin.analytics.borrow().clone()
    }

    async fn load_analytics_section(&self, section: AnalyticsSection) {
        let analytics = &self.inner.admin.analytics;
        analytics.send_modify(|view| set_section(view, section, SectionData::Loading));

        let data = match self.fetch_section(section).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, %section, "analytics feed failed");
                SectionData::Failed(e.notice_text())
            }
        };
        analytics.send_modify(|view| set_section(view, section, data));
    }

    async fn fetch_section(&self, section: AnalyticsSection) -> Result<SectionData, CoreError> {
        let client = self.client().await?;
        Ok(match section {
            AnalyticsSection::Users => SectionData::Users(
                client
                    .user_activity(TOP_USERS_LIMIT)
                    .await?
                    .into_iter()
                    .map(UserActivity::from)
                    .collect(),
            ),
            AnalyticsSection::Modes => SectionData::Modes(
                client
                    .mode_usage()
                    .await?
                    .into_iter()
                    .map(ModeUsage::from)
                    .collect(),
            ),
            AnalyticsSection::Timeline => SectionData::Timeline(
                client
                    .mode_timeline(TIMELINE_LIMIT)
                    .await?
                    .into_iter()
                    .map(ModeChange::from)
                    .collect(),
            ),
            AnalyticsSection::Daily => SectionData::Daily(
                client
                    .daily_events(DAILY_EVENT_DAYS)
                    .await?
                    .into_iter()
                    .map(DailyEvents::from)
                    .collect(),
            ),
        })
    }
}

enum SectionData {
    Loading,
    Failed(String),
    Users(Vec<UserActivity>),
    Modes(Vec<ModeUsage>),
    Timeline(Vec<ModeChange>),
    Daily(Vec<DailyEvents>),
}

fn set_section(view: &mut AnalyticsView, section: AnalyticsSection, data: SectionData) {
    fn status<T>(data: SectionData) -> Loadable<T> {
        match data {
            SectionData::Failed(msg) => Loadable::Failed(msg),
            _ => Loadable::Loading,
        }
    }

    match (section, data) {
        (_, SectionData::Users(rows)) => view.top_users = Loadable::Loaded(rows),
        (_, SectionData::Modes(rows)) => view.mode_usage = Loadable::Loaded(rows),
        (_, SectionData::Timeline(rows)) => view.timeline = Loadable::Loaded(rows),
        (_, SectionData::Daily(rows)) => view.daily = Loadable::Loaded(rows),
        (AnalyticsSection::Users, data) => view.top_users = status(data),
        (AnalyticsSection::Modes, data) => view.mode_usage = status(data),
        (AnalyticsSection::Timeline, data) => view.timeline = status(data),
        (AnalyticsSection::Daily, data) => view.daily = status(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_per_section() {
        let mut view = AnalyticsView::default();
        set_section(&mut view, AnalyticsSection::Modes, SectionData::Failed("boom".into()));
        set_section(&mut view, AnalyticsSection::Users, SectionData::Users(Vec::new()));
        assert_eq!(view.failures(), vec![(AnalyticsSection::Modes, "boom")]);
        assert_eq!(view.top_users, Loadable::Loaded(Vec::new()));
        assert_eq!(view.timeline, Loadable::NotLoaded);
    }
}
