// ── Confirmation guard ──
//
// Destructive actions (power off, deactivating a user, purging logs) are
// parked here until the user explicitly confirms. The guard owns the
// record of what is pending; nothing else keeps a copy.

use serde::{Deserialize, Serialize};

use crate::control::ControlId;
use crate::model::Mode;

/// Two-state confirmation machine: `Idle` or `Pending(action)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationGuard<A> {
    Idle,
    Pending(A),
}

impl<A> Default for ConfirmationGuard<A> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<A> ConfirmationGuard<A> {
    /// Park `action` until resolved. A previously pending action is
    /// replaced and returned.
    pub fn request(&mut self, action: A) -> Option<A> {
        match std::mem::replace(self, Self::Pending(action)) {
            Self::Pending(previous) => Some(previous),
            Self::Idle => None,
        }
    }

    /// Resolve in favour of the pending action, returning it for dispatch.
    /// With nothing pending this just returns `None`.
    pub fn confirm(&mut self) -> Option<A> {
        match std::mem::take(self) {
            Self::Pending(action) => Some(action),
            Self::Idle => None,
        }
    }

    /// Dismiss the prompt. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        matches!(std::mem::take(self), Self::Pending(_))
    }

    pub fn pending(&self) -> Option<&A> {
        match self {
            Self::Pending(action) => Some(action),
            Self::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// A destructive action waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    /// Switch the system to `OFF`, triggered from `control`.
    PowerOff { control: ControlId },
    /// Soft-delete a user account.
    DeactivateUser { id: i64, username: String },
    /// Purge audit records older than `days`.
    CleanupLogs { days: u32 },
}

impl PendingAction {
    pub fn power_off() -> Self {
        Self::PowerOff {
            control: ControlId::Mode(Mode::Off),
        }
    }

    /// The control that is marked busy once the action is dispatched.
    pub fn control(&self) -> ControlId {
        match self {
            Self::PowerOff { control } => control.clone(),
            Self::DeactivateUser { id, .. } => ControlId::DeactivateUser(*id),
            Self::CleanupLogs { .. } => ControlId::CleanupLogs,
        }
    }

    /// Question shown in the confirmation prompt.
    pub fn prompt(&self) -> String {
        match self {
            Self::PowerOff { .. } => {
                "Turn the whole system OFF? Every AV device will shut down.".into()
            }
            Self::DeactivateUser { username, .. } => {
                format!("Deactivate user '{username}'? They will no longer be able to sign in.")
            }
            Self::CleanupLogs { days } => {
                format!("Permanently delete audit records older than {days} days?")
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PowerOff { .. } => "Power off",
            Self::DeactivateUser { .. } => "Deactivate user",
            Self::CleanupLogs { .. } => "Clean up logs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_takes_pending_action() {
        let mut guard = ConfirmationGuard::default();
        assert!(guard.request(PendingAction::power_off()).is_none());
        assert!(guard.is_pending());

        let action = guard.confirm();
        assert_eq!(action, Some(PendingAction::power_off()));
        assert!(!guard.is_pending());
    }

    #[test]
    fn confirm_without_pending_is_a_no_op() {
        let mut guard: ConfirmationGuard<PendingAction> = ConfirmationGuard::Idle;
        assert_eq!(guard.confirm(), None);
        assert_eq!(guard, ConfirmationGuard::Idle);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut guard = ConfirmationGuard::default();
        guard.request(PendingAction::CleanupLogs { days: 30 });
        assert!(guard.cancel());
        assert!(!guard.cancel());
        assert_eq!(guard.confirm(), None);
    }

    #[test]
    fn second_request_replaces_first() {
        let mut guard = ConfirmationGuard::default();
        guard.request(PendingAction::CleanupLogs { days: 30 });
        let replaced = guard.request(PendingAction::DeactivateUser {
            id: 3,
            username: "tecnico".into(),
        });
        assert_eq!(replaced, Some(PendingAction::CleanupLogs { days: 30 }));
        assert_eq!(
            guard.pending().map(PendingAction::control),
            Some(ControlId::DeactivateUser(3))
        );
    }

    #[test]
    fn power_off_records_the_off_control() {
        assert_eq!(
            PendingAction::power_off().control(),
            ControlId::Mode(Mode::Off)
        );
    }
}
