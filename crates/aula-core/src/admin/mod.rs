// ── Admin panels ──
//
// Five independent screens (statistics, users, audit log, analytics,
// settings), each a fetch -> render -> submit -> re-fetch cycle. A tab's
// data is loaded the first time it is activated; revisiting does not
// refetch until `reload_tab` is called.

mod analytics;
mod audit;
mod settings;
mod users;

use std::collections::BTreeSet;

use serde::Serialize;
use strum::{Display, EnumIter};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::console::Console;
use crate::error::CoreError;
use crate::model::{Statistics, User};
use crate::notice::Notice;

pub use analytics::{AnalyticsSection, AnalyticsView, DAILY_EVENT_DAYS, TIMELINE_LIMIT, TOP_USERS_LIMIT};
pub use audit::{AuditView, DEFAULT_EXPORT_LIMIT, MAX_SEARCH_LIMIT, SearchResults};
pub use settings::SettingsView;

/// One admin screen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumIter,
)]
pub enum AdminTab {
    Statistics,
    Users,
    Audit,
    Analytics,
    Settings,
}

/// Fetch status of one panel's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum Loadable<T> {
    #[default]
    NotLoaded,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Loadable<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Reactive storage for every admin panel.
pub(crate) struct AdminStore {
    activated: watch::Sender<BTreeSet<AdminTab>>,
    pub(crate) statistics: watch::Sender<Loadable<Statistics>>,
    pub(crate) users: watch::Sender<Loadable<Vec<User>>>,
    pub(crate) audit: watch::Sender<AuditView>,
    pub(crate) analytics: watch::Sender<AnalyticsView>,
    pub(crate) settings: watch::Sender<SettingsView>,
}

impl AdminStore {
    pub(crate) fn new() -> Self {
        Self {
            activated: watch::channel(BTreeSet::new()).0,
            statistics: watch::channel(Loadable::NotLoaded).0,
            users: watch::channel(Loadable::NotLoaded).0,
            audit: watch::channel(AuditView::default()).0,
            analytics: watch::channel(AnalyticsView::default()).0,
            settings: watch::channel(SettingsView::default()).0,
        }
    }
}

impl Console {
    // ── Tab lifecycle ────────────────────────────────────────────

    /// Switch to `tab`, loading its data if this is its first activation.
    ///
    /// Returns whether a load was triggered. A failed first load leaves
    /// the tab unmarked so the next activation tries again.
    pub async fn activate_tab(&self, tab: AdminTab) -> Result<bool, CoreError> {
        let first = self
            .inner
            .admin
            .activated
            .send_if_modified(|set| set.insert(tab));
        if !first {
            debug!(%tab, "tab already loaded");
            return Ok(false);
        }

        if let Err(e) = self.load_tab(tab).await {
            self.inner.admin.activated.send_modify(|set| {
                set.remove(&tab);
            });
            return Err(e);
        }
        Ok(true)
    }

    /// Explicitly re-fetch `tab`, whether or not it was loaded before.
    pub async fn reload_tab(&self, tab: AdminTab) -> Result<(), CoreError> {
        self.inner.admin.activated.send_modify(|set| {
            set.insert(tab);
        });
        self.load_tab(tab).await
    }

    pub fn is_tab_loaded(&self, tab: AdminTab) -> bool {
        self.inner.admin.activated.borrow().contains(&tab)
    }

    async fn load_tab(&self, tab: AdminTab) -> Result<(), CoreError> {
        match tab {
            AdminTab::Statistics => self.load_statistics().await.map(drop),
            AdminTab::Users => self.load_users().await.map(drop),
            AdminTab::Audit => {
                let filter = self.inner.admin.audit.borrow().filter.clone();
                self.search_logs(filter).await.map(drop)
            }
            AdminTab::Analytics => {
                self.load_analytics().await;
                Ok(())
            }
            AdminTab::Settings => {
                let category = self.inner.admin.settings.borrow().category.clone();
                self.load_settings(category).await.map(drop)
            }
        }
    }

    /// Publish a failed panel load as an error notice.
    pub(crate) fn report_load_failure(&self, what: &str, e: &CoreError) {
        warn!(error = %e, panel = what, "admin panel load failed");
        self.notify(Notice::error(e.notice_text()));
    }

    // ── Statistics ───────────────────────────────────────────────

    /// Fetch the summary counters.
    pub async fn load_statistics(&self) -> Result<Statistics, CoreError> {
        self.inner.admin.statistics.send_replace(Loadable::Loading);
        let result = async {
            let client = self.client().await?;
            Ok::<_, CoreError>(Statistics::from(client.statistics().await?))
        }
        .await;

        match result {
            Ok(stats) => {
                self.inner
                    .admin
                    .statistics
                    .send_replace(Loadable::Loaded(stats.clone()));
                Ok(stats)
            }
            Err(e) => {
                self.inner
                    .admin
                    .statistics
                    .send_replace(Loadable::Failed(e.notice_text()));
                self.report_load_failure("statistics", &e);
                Err(e)
            }
        }
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn statistics(&self) -> watch::Receiver<Loadable<Statistics>> {
        self.inner.admin.statistics.subscribe()
    }

    pub fn users(&self) -> watch::Receiver<Loadable<Vec<User>>> {
        self.inner.admin.users.subscribe()
    }

    pub fn audit(&self) -> watch::Receiver<AuditView> {
        self.inner.admin.audit.subscribe()
    }

    pub fn analytics(&self) -> watch::Receiver<AnalyticsView> {
        self.inner.admin.analytics.subscribe()
    }

    pub fn settings(&self) -> watch::Receiver<SettingsView> {
        self.inner.admin.settings.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loadable_from_result() {
        let ok: Loadable<u32> = Ok::<_, CoreError>(3).into();
        assert_eq!(ok.loaded(), Some(&3));

        let failed: Loadable<u32> = Err(CoreError::Disconnected).into();
        assert_eq!(failed.error(), Some("Not connected to the server"));
        assert!(failed.loaded().is_none());
    }
}
