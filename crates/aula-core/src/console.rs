// ── Console handle ──
//
// Lifecycle of one session against an auditorium server: login,
// background log refresh, and the reactive channels every view binds to.
// The component behaviours (state poll, mode dispatch, log window, admin
// panels) live in their own files as further `impl Console` blocks.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aula_api::{AulaClient, TlsMode, TransportConfig};

use crate::admin::AdminStore;
use crate::config::{ConsoleConfig, TlsVerification};
use crate::control::{ControlBoard, ControlMap};
use crate::error::CoreError;
use crate::guard::{ConfirmationGuard, PendingAction};
use crate::logs::{LogWindow, log_refresh_task};
use crate::model::SystemState;
use crate::notice::Notice;

const NOTICE_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Console ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Every piece of displayed
/// data is a `watch` channel holding the last server response; views
/// subscribe and re-render on change. User-facing outcomes are published
/// as [`Notice`]s on a broadcast channel.
#[derive(Clone)]
pub struct Console {
    pub(crate) inner: Arc<ConsoleInner>,
}

pub(crate) struct ConsoleInner {
    pub(crate) config: ConsoleConfig,
    /// The client is cloned out of the lock per request, so requests
    /// never wait on each other.
    client: Mutex<Option<Arc<AulaClient>>>,
    connection_state: watch::Sender<ConnectionState>,
    pub(crate) state: watch::Sender<Option<SystemState>>,
    pub(crate) logs: watch::Sender<LogWindow>,
    notices: broadcast::Sender<Notice>,
    pub(crate) controls: ControlBoard,
    pub(crate) guard: watch::Sender<ConfirmationGuard<PendingAction>>,
    pub(crate) admin: AdminStore,
    cancel: CancellationToken,
    /// Child token for the current connection, replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Console {
    /// Create a console from configuration. Does NOT connect -- call
    /// [`connect()`](Self::connect) to log in and start the log refresh.
    pub fn new(config: ConsoleConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (state, _) = watch::channel(None);
        let (logs, _) = watch::channel(LogWindow::default());
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (guard, _) = watch::channel(ConfirmationGuard::Idle);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ConsoleInner {
                config,
                client: Mutex::new(None),
                connection_state,
                state,
                logs,
                notices,
                controls: ControlBoard::new(),
                guard,
                admin: AdminStore::new(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the server.
    ///
    /// Builds the HTTP client, logs in when credentials are configured,
    /// and spawns the periodic log refresh (whose first tick is the
    /// initial load).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        let previous =
            std::mem::replace(&mut *self.inner.cancel_child.lock().await, child.clone());
        previous.cancel();

        let config = &self.inner.config;
        let client = match self.open_session(config).await {
            Ok(client) => client,
            Err(e) => {
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                return Err(e);
            }
        };
        *self.inner.client.lock().await = Some(Arc::new(client));

        let interval = config.log_poll_interval;
        if !interval.is_zero() {
            let console = self.clone();
            let handle = tokio::spawn(log_refresh_task(console, interval, child));
            self.inner.task_handles.lock().await.push(handle);
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(url = %config.url, "connected to auditorium server");
        Ok(())
    }

    async fn open_session(&self, config: &ConsoleConfig) -> Result<AulaClient, CoreError> {
        let transport = build_transport(config);
        let client = AulaClient::new(config.url.clone(), &transport)?;

        if let Some(ref creds) = config.credentials {
            let reply = client.login(&creds.username, &creds.password).await?;
            debug!(
                username = %creds.username,
                redirect = ?reply.redirect,
                "session authentication successful"
            );
        }
        Ok(client)
    }

    /// Disconnect from the server.
    ///
    /// Stops background tasks, ends the server session if one was
    /// opened, and resets the connection state.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        if let Some(client) = self.inner.client.lock().await.take() {
            if self.inner.config.credentials.is_some() {
                if let Err(e) = client.logout().await {
                    warn!(error = %e, "logout failed (non-fatal)");
                }
            }
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the periodic log refresh since the caller only needs a
    /// single request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: ConsoleConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Console) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.log_poll_interval = std::time::Duration::ZERO;

        let console = Console::new(cfg);
        console.connect().await?;
        let result = f(console.clone()).await;
        console.disconnect().await;
        result
    }

    // ── Internals shared by the components ───────────────────────

    /// The connected client, or `Disconnected`.
    pub(crate) async fn client(&self) -> Result<Arc<AulaClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Disconnected)
    }

    /// Publish a notice. Nobody listening is fine.
    pub(crate) fn notify(&self, notice: Notice) {
        debug!(level = %notice.level, message = %notice.message, "notice");
        let _ = self.inner.notices.send(notice);
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to the displayed system state (`None` until first load).
    pub fn system_state(&self) -> watch::Receiver<Option<SystemState>> {
        self.inner.state.subscribe()
    }

    pub fn state_snapshot(&self) -> Option<SystemState> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to the recent log window.
    pub fn logs(&self) -> watch::Receiver<LogWindow> {
        self.inner.logs.subscribe()
    }

    pub fn logs_snapshot(&self) -> LogWindow {
        self.inner.logs.borrow().clone()
    }

    /// Subscribe to user-facing notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Subscribe to control busy/label changes.
    pub fn controls(&self) -> watch::Receiver<ControlMap> {
        self.inner.controls.subscribe()
    }

    pub fn control_board(&self) -> &ControlBoard {
        &self.inner.controls
    }

    /// Subscribe to the confirmation prompt state.
    pub fn confirmation(&self) -> watch::Receiver<ConfirmationGuard<PendingAction>> {
        self.inner.guard.subscribe()
    }

    pub fn pending_confirmation(&self) -> Option<PendingAction> {
        self.inner.guard.borrow().pending().cloned()
    }
}

fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None, // AulaClient::new adds one
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
