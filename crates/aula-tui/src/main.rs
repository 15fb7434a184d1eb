//! `aula-tui`: terminal console for an auditorium AV control server.
//!
//! Built on [ratatui](https://ratatui.rs) over the reactive
//! [`Console`](aula_core::Console) handle. Screens are navigable with the
//! number keys (1-5): Dashboard, Users, Audit, Analytics and Settings.
//!
//! Logs go to a file in the platform data directory so they never
//! corrupt the terminal. A background data bridge forwards every console
//! channel into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use directories::ProjectDirs;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use aula_core::{Console, ConsoleConfig, TlsVerification};

use crate::app::App;

const LOG_FILE_NAME: &str = "aula-tui.log";

/// Terminal console for operating an auditorium AV system.
#[derive(Parser, Debug)]
#[command(name = "aula-tui", version, about)]
struct Cli {
    /// Profile from the shared config file
    #[arg(short = 'p', long, env = "AULA_PROFILE")]
    profile: Option<String>,

    /// Server URL, overriding the profile's
    #[arg(short = 's', long, env = "AULA_SERVER")]
    server: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long, env = "AULA_INSECURE")]
    insecure: bool,

    /// Trace filter for the log file (e.g. `info`, `aula_core=debug`)
    #[arg(long, env = "AULA_LOG", default_value = "info")]
    log_level: String,

    /// Log file path (defaults to the platform data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_dir() -> PathBuf {
    ProjectDirs::from("", "", "aula")
        .map_or_else(std::env::temp_dir, |dirs| dirs.data_dir().to_path_buf())
}

/// Set up file-based tracing. Nothing may be written to stdout/stderr
/// while the terminal is in raw mode. The guard flushes on drop.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let (dir, file_name) = match &cli.log_file {
        Some(path) => (
            path.parent()
                .map_or_else(default_log_dir, std::path::Path::to_path_buf),
            path.file_name()
                .map_or_else(|| LOG_FILE_NAME.into(), std::ffi::OsStr::to_os_string),
        ),
        None => (default_log_dir(), LOG_FILE_NAME.into()),
    };
    std::fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("creating log directory {}", dir.display()))?;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

/// Build the console config: profile from the shared config file, with
/// `--server` and `--insecure` layered on top.
fn console_config(cli: &Cli) -> Result<ConsoleConfig> {
    let cfg = aula_config::load_config()?;
    let name = cfg.active_profile_name(cli.profile.as_deref());

    let mut config = match cfg.profile(&name) {
        Ok(profile) => aula_config::profile_to_console_config(profile, &name, &cfg.defaults)?,
        Err(e) if cli.profile.is_some() => return Err(e.into()),
        Err(_) => {
            let server = cli.server.as_deref().ok_or_else(|| {
                eyre!("no profile '{name}' configured; run `aula config init` or pass --server")
            })?;
            ConsoleConfig::new(Url::parse(server)?)
        }
    };

    if let Some(server) = cli.server.as_deref() {
        config.url = Url::parse(server).wrap_err_with(|| format!("invalid server URL '{server}'"))?;
    }
    if cli.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if config.log_poll_interval.is_zero() {
        config.log_poll_interval = Duration::from_secs(10);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a panic during setup still restores the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli)?;

    let config = console_config(&cli)?;
    info!(url = %config.url, "starting aula-tui");

    let mut app = App::new(Console::new(config));
    app.run().await?;

    Ok(())
}
