use tracing::debug;

use crate::client::AulaClient;
use crate::error::Error;
use crate::models::{MessageReply, RawUser, UserUpsert, UsersReply};

impl AulaClient {
    /// List every user account, active or not.
    ///
    /// `GET /api/admin/usuarios`
    pub async fn list_users(&self) -> Result<Vec<RawUser>, Error> {
        let url = self.url("api/admin/usuarios")?;
        let reply: UsersReply = self.get(url).await?;
        Ok(reply.usuarios)
    }

    /// Create or update a user.
    ///
    /// `POST /api/admin/usuarios`. The body carries an optional `id`;
    /// without one the server creates a new account.
    pub async fn save_user(&self, user: &UserUpsert) -> Result<MessageReply, Error> {
        let url = self.url("api/admin/usuarios")?;
        debug!(username = %user.username, id = ?user.id, "saving user");
        self.post(url, user).await
    }

    /// Deactivate (soft-delete) a user.
    ///
    /// `DELETE /api/admin/usuarios/{id}`
    pub async fn deactivate_user(&self, id: i64) -> Result<MessageReply, Error> {
        let url = self.url(&format!("api/admin/usuarios/{id}"))?;
        debug!(id, "deactivating user");
        self.delete(url).await
    }
}
