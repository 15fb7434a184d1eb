//! Data bridge: connects [`Console`] channels to TUI actions.
//!
//! Logs in, polls the system state once, then forwards every watch-channel
//! change and every published notice as an [`Action`] until cancelled.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use aula_core::{ConnectionState, Console};

use crate::action::Action;

pub async fn spawn_data_bridge(
    console: Console,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    // Subscribe before connecting so the first log refresh is not missed
    let mut state = console.system_state();
    let mut logs = console.logs();
    let mut controls = console.controls();
    let mut confirmation = console.confirmation();
    let mut statistics = console.statistics();
    let mut users = console.users();
    let mut audit = console.audit();
    let mut analytics = console.analytics();
    let mut settings = console.settings();
    let mut notices = console.notices();
    let mut conn_state = console.connection_state();

    if let Err(e) = console.connect().await {
        warn!(error = %e, "failed to connect to server");
        let _ = action_tx.send(Action::Disconnected(e.notice_text()));
        let _ = action_tx.send(Action::Notify(aula_core::Notice::error(e.notice_text())));
        return;
    }
    let _ = action_tx.send(Action::Connected);

    // The dashboard state is fetched once on load; failures surface as a
    // notice from the console.
    if let Err(e) = console.refresh_state().await {
        debug!(error = %e, "initial state poll failed");
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = state.changed() => {
                let snap = state.borrow_and_update().clone().map(Arc::new);
                let _ = action_tx.send(Action::StateUpdated(snap));
            }
            Ok(()) = logs.changed() => {
                let window = Arc::new(logs.borrow_and_update().clone());
                let _ = action_tx.send(Action::LogsUpdated(window));
            }
            Ok(()) = controls.changed() => {
                let map = Arc::new(controls.borrow_and_update().clone());
                let _ = action_tx.send(Action::ControlsUpdated(map));
            }
            Ok(()) = confirmation.changed() => {
                let pending = confirmation.borrow_and_update().pending().cloned();
                let _ = action_tx.send(Action::ConfirmationChanged(pending));
            }
            Ok(()) = statistics.changed() => {
                let snap = Arc::new(statistics.borrow_and_update().clone());
                let _ = action_tx.send(Action::StatisticsUpdated(snap));
            }
            Ok(()) = users.changed() => {
                let snap = Arc::new(users.borrow_and_update().clone());
                let _ = action_tx.send(Action::UsersUpdated(snap));
            }
            Ok(()) = audit.changed() => {
                let snap = Arc::new(audit.borrow_and_update().clone());
                let _ = action_tx.send(Action::AuditUpdated(snap));
            }
            Ok(()) = analytics.changed() => {
                let snap = Arc::new(analytics.borrow_and_update().clone());
                let _ = action_tx.send(Action::AnalyticsUpdated(snap));
            }
            Ok(()) = settings.changed() => {
                let snap = Arc::new(settings.borrow_and_update().clone());
                let _ = action_tx.send(Action::SettingsUpdated(snap));
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    let _ = action_tx.send(Action::Notify(notice));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "notice receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Ok(()) = conn_state.changed() => {
                let current = conn_state.borrow_and_update().clone();
                let action = match current {
                    ConnectionState::Connected => Action::Connected,
                    ConnectionState::Connecting => Action::Connecting,
                    ConnectionState::Disconnected => Action::Disconnected("disconnected".into()),
                    ConnectionState::Failed => Action::Disconnected("connection failed".into()),
                };
                let _ = action_tx.send(action);
            }
        }
    }

    console.disconnect().await;
    debug!("data bridge shut down");
}
