// ── User management panel ──

use aula_api::models::UserUpsert;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use super::Loadable;
use crate::console::Console;
use crate::control::ControlId;
use crate::error::CoreError;
use crate::guard::PendingAction;
use crate::model::{User, UserDraft};
use crate::notice::Notice;

impl Console {
    /// Fetch the account list, replacing the displayed one.
    pub async fn load_users(&self) -> Result<Vec<User>, CoreError> {
        self.inner.admin.users.send_replace(Loadable::Loading);
        let result = async {
            let client = self.client().await?;
            let raw = client.list_users().await?;
            Ok::<_, CoreError>(raw.into_iter().map(User::from).collect::<Vec<_>>())
        }
        .await;

        match result {
            Ok(users) => {
                self.inner
                    .admin
                    .users
                    .send_replace(Loadable::Loaded(users.clone()));
                Ok(users)
            }
            Err(e) => {
                self.inner
                    .admin
                    .users
                    .send_replace(Loadable::Failed(e.notice_text()));
                self.report_load_failure("users", &e);
                Err(e)
            }
        }
    }

    pub fn users_snapshot(&self) -> Vec<User> {
        self.inner
            .admin
            .users
            .borrow()
            .loaded()
            .cloned()
            .unwrap_or_default()
    }

    /// Create (`draft.id == None`) or update an account, then reload.
    ///
    /// Returns `Ok(None)` if a save is already in flight.
    pub async fn save_user(&self, draft: UserDraft) -> Result<Option<String>, CoreError> {
        let Some(_busy) = self.inner.controls.begin(ControlId::SaveUser) else {
            return Ok(None);
        };

        let result = self.submit_user(&draft).await;
        match result {
            Ok(message) => {
                info!(username = %draft.username, create = draft.is_create(), "user saved");
                self.notify(Notice::success(message.clone()));
                let _ = self.load_users().await;
                Ok(Some(message))
            }
            Err(e) => {
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }

    async fn submit_user(&self, draft: &UserDraft) -> Result<String, CoreError> {
        let body = upsert_body(draft)?;
        let client = self.client().await?;
        let reply = client.save_user(&body).await?;
        Ok(reply.msg.unwrap_or_else(|| {
            if draft.is_create() {
                format!("User {} created", draft.username)
            } else {
                format!("User {} updated", draft.username)
            }
        }))
    }

    /// Ask for confirmation before soft-deleting `user`. Nothing is sent
    /// until [`confirm`](Self::confirm).
    pub fn request_deactivate(&self, user: &User) {
        self.request_confirmation(PendingAction::DeactivateUser {
            id: user.id,
            username: user.username.clone(),
        });
    }

    pub(crate) async fn run_deactivation(&self, id: i64) -> Result<(), CoreError> {
        let Some(_busy) = self.inner.controls.begin(ControlId::DeactivateUser(id)) else {
            debug!(id, "deactivation already in flight");
            return Ok(());
        };

        let result = async {
            let client = self.client().await?;
            Ok::<_, CoreError>(client.deactivate_user(id).await?)
        }
        .await;

        match result {
            Ok(reply) => {
                info!(id, "user deactivated");
                self.notify(Notice::success(
                    reply.msg.unwrap_or_else(|| "User deactivated".into()),
                ));
                let _ = self.load_users().await;
                Ok(())
            }
            Err(e) => {
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }
}

/// Validate the form and build the upsert body.
fn upsert_body(draft: &UserDraft) -> Result<UserUpsert, CoreError> {
    let username = draft.username.trim();
    if username.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "username is required".into(),
        });
    }

    let password = draft
        .password
        .as_ref()
        .map(|p| p.expose_secret().to_owned())
        .filter(|p| !p.is_empty());
    if draft.is_create() && password.is_none() {
        return Err(CoreError::ValidationFailed {
            message: "a password is required for new users".into(),
        });
    }

    Ok(UserUpsert {
        id: draft.id,
        username: username.to_owned(),
        password,
        rol: draft.role.wire_name().to_owned(),
        nombre_completo: draft.full_name.clone().filter(|s| !s.trim().is_empty()),
        email: draft.email.clone().filter(|s| !s.trim().is_empty()),
        activo: draft.active,
    })
}
