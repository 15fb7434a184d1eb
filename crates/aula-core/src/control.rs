// ── Control busy tracking ──
//
// A control (mode button, save button, ...) is disabled and relabelled
// while its own request is in flight. The `BusyGuard` returned by
// `ControlBoard::begin` restores it on drop, so every exit path of the
// request (success, error, early return, cancellation) re-enables it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::model::Mode;

/// Label shown on a control while its request is in flight.
pub const BUSY_LABEL: &str = "Working...";

/// Identifies one user-activatable control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlId {
    Mode(Mode),
    SaveUser,
    DeactivateUser(i64),
    CleanupLogs,
    SaveSetting(String),
}

impl ControlId {
    /// Label the control shows when idle.
    pub fn default_label(&self) -> String {
        match self {
            Self::Mode(mode) => mode.to_string(),
            Self::SaveUser | Self::SaveSetting(_) => "Save".into(),
            Self::DeactivateUser(_) => "Deactivate".into(),
            Self::CleanupLogs => "Clean up".into(),
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => write!(f, "mode:{mode}"),
            Self::SaveUser => f.write_str("save-user"),
            Self::DeactivateUser(id) => write!(f, "deactivate-user:{id}"),
            Self::CleanupLogs => f.write_str("cleanup-logs"),
            Self::SaveSetting(key) => write!(f, "save-setting:{key}"),
        }
    }
}

/// Presentation state of one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub label: String,
    pub busy: bool,
}

impl ControlState {
    pub fn enabled(&self) -> bool {
        !self.busy
    }
}

pub type ControlMap = BTreeMap<ControlId, ControlState>;

/// Shared registry of control states, observable through a `watch` channel.
#[derive(Clone)]
pub struct ControlBoard {
    tx: Arc<watch::Sender<ControlMap>>,
}

impl Default for ControlBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ControlMap::new());
        Self { tx: Arc::new(tx) }
    }

    /// Register a control with its idle label (no-op if already known).
    pub fn register(&self, id: ControlId, label: impl Into<String>) {
        let label = label.into();
        self.tx.send_if_modified(|map| {
            if map.contains_key(&id) {
                return false;
            }
            map.insert(
                id,
                ControlState {
                    label,
                    busy: false,
                },
            );
            true
        });
    }

    /// Mark a control busy. Returns `None` if it already is, which is how
    /// duplicate submissions from the same control are dropped.
    pub fn begin(&self, id: ControlId) -> Option<BusyGuard> {
        let mut original = None;
        self.tx.send_if_modified(|map| {
            let state = map.entry(id.clone()).or_insert_with(|| ControlState {
                label: id.default_label(),
                busy: false,
            });
            if state.busy {
                return false;
            }
            original = Some(std::mem::replace(&mut state.label, BUSY_LABEL.into()));
            state.busy = true;
            true
        });

        original.map(|label| BusyGuard {
            tx: Arc::clone(&self.tx),
            id,
            label,
        })
    }

    pub fn get(&self, id: &ControlId) -> Option<ControlState> {
        self.tx.borrow().get(id).cloned()
    }

    pub fn is_busy(&self, id: &ControlId) -> bool {
        self.get(id).is_some_and(|s| s.busy)
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlMap> {
        self.tx.subscribe()
    }
}

/// Restores a control's idle label and re-enables it when dropped.
pub struct BusyGuard {
    tx: Arc<watch::Sender<ControlMap>>,
    id: ControlId,
    label: String,
}

impl BusyGuard {
    pub fn id(&self) -> &ControlId {
        &self.id
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let label = std::mem::take(&mut self.label);
        self.tx.send_modify(|map| {
            if let Some(state) = map.get_mut(&self.id) {
                state.busy = false;
                state.label = label;
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn busy_then_restored() {
        let board = ControlBoard::new();
        let id = ControlId::Mode(Mode::Cine);
        board.register(id.clone(), "Cinema");

        let guard = board.begin(id.clone()).unwrap();
        let state = board.get(&id).unwrap();
        assert!(state.busy);
        assert_eq!(state.label, BUSY_LABEL);

        drop(guard);
        let state = board.get(&id).unwrap();
        assert!(state.enabled());
        assert_eq!(state.label, "Cinema");
    }

    #[test]
    fn second_activation_is_rejected_while_busy() {
        let board = ControlBoard::new();
        let id = ControlId::SaveUser;
        let _guard = board.begin(id.clone()).unwrap();
        assert!(board.begin(id.clone()).is_none());
        assert!(board.begin(ControlId::CleanupLogs).is_some());
    }

    #[test]
    fn unregistered_controls_get_default_label() {
        let board = ControlBoard::new();
        let id = ControlId::DeactivateUser(4);
        drop(board.begin(id.clone()).unwrap());
        assert_eq!(board.get(&id).unwrap().label, "Deactivate");
    }

    #[test]
    fn restored_after_panic() {
        let board = ControlBoard::new();
        let id = ControlId::Mode(Mode::Standby);
        let inner = board.clone();
        let inner_id = id.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.begin(inner_id).unwrap();
            panic!("request blew up");
        }));
        assert!(result.is_err());
        assert!(!board.is_busy(&id));
        assert_eq!(board.get(&id).unwrap().label, "STANDBY");
    }
}
