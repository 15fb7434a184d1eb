// ── Command dispatcher ──
//
// Mode changes and the confirmation flow in front of destructive
// actions. The triggering control is held busy for exactly the duration
// of its own request; the `BusyGuard` restores it on every exit path.

use aula_api::models::ReplyStatus;
use serde::Serialize;
use tracing::{debug, warn};

use crate::console::Console;
use crate::control::ControlId;
use crate::error::CoreError;
use crate::guard::PendingAction;
use crate::model::{Mode, SystemState};
use crate::notice::Notice;

/// How a mode-change activation settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DispatchOutcome {
    /// The server switched modes; `state` is its authoritative new state.
    Applied {
        state: Option<SystemState>,
        message: String,
    },
    /// The server answered without changing anything (already in that
    /// mode, or it wants confirmation first).
    Unchanged { message: String },
    /// HTTP 429. Nothing changed and nothing is retried automatically.
    RateLimited { retry_after: Option<String> },
    /// The control's previous request has not settled yet.
    Ignored,
    /// The action is parked in the confirmation guard.
    AwaitingConfirmation,
}

/// What a confirmed pending action did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConfirmOutcome {
    ModeChange(DispatchOutcome),
    UserDeactivated { id: i64 },
    LogsRemoved(u64),
}

impl Console {
    /// Activate the control for `mode`.
    ///
    /// `OFF` opens the confirmation prompt instead of sending anything;
    /// every other mode is dispatched right away.
    pub async fn activate_mode(&self, mode: Mode) -> Result<DispatchOutcome, CoreError> {
        if mode.is_destructive() {
            self.request_confirmation(PendingAction::power_off());
            return Ok(DispatchOutcome::AwaitingConfirmation);
        }
        self.dispatch_mode(ControlId::Mode(mode), mode, false).await
    }

    /// Park a destructive action until [`confirm`](Self::confirm) or
    /// [`cancel_confirmation`](Self::cancel_confirmation).
    pub fn request_confirmation(&self, action: PendingAction) {
        debug!(?action, "confirmation requested");
        self.inner.guard.send_modify(|guard| {
            guard.request(action);
        });
    }

    /// Resolve the prompt in favour of the pending action and run it.
    ///
    /// `Ok(None)` when nothing was pending: the prompt just closes and no
    /// request is sent.
    pub async fn confirm(&self) -> Result<Option<ConfirmOutcome>, CoreError> {
        let mut taken = None;
        self.inner.guard.send_if_modified(|guard| {
            taken = guard.confirm();
            taken.is_some()
        });

        let Some(action) = taken else {
            debug!("confirm with nothing pending");
            return Ok(None);
        };

        let outcome = match action {
            PendingAction::PowerOff { control } => {
                ConfirmOutcome::ModeChange(self.dispatch_mode(control, Mode::Off, true).await?)
            }
            PendingAction::DeactivateUser { id, .. } => {
                self.run_deactivation(id).await?;
                ConfirmOutcome::UserDeactivated { id }
            }
            PendingAction::CleanupLogs { days } => {
                ConfirmOutcome::LogsRemoved(self.run_cleanup(days).await?)
            }
        };
        Ok(Some(outcome))
    }

    /// Dismiss the prompt without sending anything or touching a control.
    pub fn cancel_confirmation(&self) -> bool {
        let mut cancelled = false;
        self.inner.guard.send_if_modified(|guard| {
            cancelled = guard.cancel();
            cancelled
        });
        cancelled
    }

    async fn dispatch_mode(
        &self,
        control: ControlId,
        mode: Mode,
        confirmed: bool,
    ) -> Result<DispatchOutcome, CoreError> {
        let Some(_busy) = self.inner.controls.begin(control) else {
            debug!(%mode, "control busy, activation ignored");
            return Ok(DispatchOutcome::Ignored);
        };

        let result = self.send_mode_change(mode, confirmed).await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(CoreError::RateLimited { retry_after }) => {
                self.notify(Notice::warning(
                    CoreError::RateLimited {
                        retry_after: retry_after.clone(),
                    }
                    .notice_text(),
                ));
                Ok(DispatchOutcome::RateLimited { retry_after })
            }
            Err(e) => {
                warn!(error = %e, %mode, "mode change failed");
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }

    async fn send_mode_change(
        &self,
        mode: Mode,
        confirmed: bool,
    ) -> Result<DispatchOutcome, CoreError> {
        let client = self.client().await?;
        let reply = client.change_mode(mode.wire_name(), confirmed).await?;

        match reply.status {
            ReplyStatus::Success => {
                let state = reply.estado.map(SystemState::from);
                if let Some(ref state) = state {
                    self.inner.state.send_replace(Some(state.clone()));
                }
                let message = reply
                    .msg
                    .unwrap_or_else(|| format!("Mode changed to {mode}"));
                self.notify(Notice::success(message.clone()));
                Ok(DispatchOutcome::Applied { state, message })
            }
            ReplyStatus::Error => Err(CoreError::Rejected {
                message: reply
                    .msg
                    .unwrap_or_else(|| "the server rejected the mode change".into()),
            }),
            ReplyStatus::Info | ReplyStatus::ConfirmationRequired | ReplyStatus::Unknown => {
                let message = reply.msg.unwrap_or_else(|| format!("{mode}: no change"));
                self.notify(Notice::info(message.clone()));
                Ok(DispatchOutcome::Unchanged { message })
            }
        }
    }
}
