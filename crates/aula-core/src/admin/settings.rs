// ── Configuration editor panel ──

use serde::Serialize;
use tracing::info;

use super::Loadable;
use crate::console::Console;
use crate::control::ControlId;
use crate::error::CoreError;
use crate::model::ConfigEntry;
use crate::notice::Notice;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsView {
    /// Category filter of the last load (`None` = all).
    pub category: Option<String>,
    pub entries: Loadable<Vec<ConfigEntry>>,
}

impl SettingsView {
    pub fn find(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.loaded()?.iter().find(|e| e.key == key)
    }
}

impl Console {
    /// Fetch configuration entries, optionally for one category.
    pub async fn load_settings(
        &self,
        category: Option<String>,
    ) -> Result<Vec<ConfigEntry>, CoreError> {
        let category = category.filter(|c| !c.trim().is_empty());
        self.inner.admin.settings.send_modify(|view| {
            view.category.clone_from(&category);
            view.entries = Loadable::Loading;
        });

        let result = self.fetch_settings(category.as_deref()).await;
        match result {
            Ok(entries) => {
                self.inner.admin.settings.send_modify(|view| {
                    view.entries = Loadable::Loaded(entries.clone());
                });
                Ok(entries)
            }
            Err(e) => {
                self.inner.admin.settings.send_modify(|view| {
                    view.entries = Loadable::Failed(e.notice_text());
                });
                self.report_load_failure("settings", &e);
                Err(e)
            }
        }
    }

    async fn fetch_settings(&self, category: Option<&str>) -> Result<Vec<ConfigEntry>, CoreError> {
        let client = self.client().await?;
        let raw = client.config_entries(category).await?;
        Ok(raw.into_iter().map(ConfigEntry::from).collect())
    }

    /// Validate `input` against the entry's type and submit it as the
    /// entry's whole new value, then re-fetch the list.
    ///
    /// Returns `Ok(None)` if a save of the same key is already in flight.
    pub async fn save_setting(&self, key: &str, input: &str) -> Result<Option<String>, CoreError> {
        let Some(_busy) = self
            .inner
            .controls
            .begin(ControlId::SaveSetting(key.to_owned()))
        else {
            return Ok(None);
        };

        let result = self.submit_setting(key, input).await;
        match result {
            Ok(message) => {
                info!(key, "configuration entry updated");
                self.notify(Notice::success(message.clone()));
                let category = self.inner.admin.settings.borrow().category.clone();
                let _ = self.load_settings(category).await;
                Ok(Some(message))
            }
            Err(e) => {
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }

    async fn submit_setting(&self, key: &str, input: &str) -> Result<String, CoreError> {
        let known = self.inner.admin.settings.borrow().find(key).map(|e| e.kind);
        let kind = match known {
            Some(kind) => kind,
            None => self
                .fetch_settings(None)
                .await?
                .into_iter()
                .find(|e| e.key == key)
                .map(|e| e.kind)
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Configuration entry".into(),
                    identifier: key.to_owned(),
                })?,
        };

        let value = kind.parse_value(key, input)?;
        let client = self.client().await?;
        let reply = client.update_config_entry(key, value).await?;
        Ok(reply.msg.unwrap_or_else(|| format!("{key} updated")))
    }
}
