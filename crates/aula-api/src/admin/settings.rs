use tracing::debug;

use crate::client::AulaClient;
use crate::error::Error;
use crate::models::{ConfigEntriesReply, ConfigUpdate, MessageReply, RawConfigEntry};

impl AulaClient {
    /// List configuration entries, optionally for one category.
    ///
    /// `GET /api/admin/configuraciones[?categoria=C]`
    pub async fn config_entries(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<RawConfigEntry>, Error> {
        let mut url = self.url("api/admin/configuraciones")?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("categoria", category);
        }
        let reply: ConfigEntriesReply = self.get(url).await?;
        Ok(reply.configuraciones)
    }

    /// Replace the value of one configuration entry.
    ///
    /// `PUT /api/admin/configuraciones/{clave}` with `{valor}`
    pub async fn update_config_entry(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<MessageReply, Error> {
        let mut url = self.url("api/admin/configuraciones")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(key);
        debug!(key, %value, "updating configuration entry");
        self.put(url, &ConfigUpdate { valor: value }).await
    }
}
