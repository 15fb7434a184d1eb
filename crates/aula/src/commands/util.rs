//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use aula_core::{ConfirmOutcome, Console, CoreError};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Prompt(
            "confirmation needs an interactive terminal".into(),
        ));
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Prompt(e.to_string()))
}

/// Settle whatever the console parked in its confirmation guard.
///
/// Declining cancels the pending action (nothing is sent) and reports
/// it as `Cancelled`.
pub async fn resolve_pending(
    console: &Console,
    global: &GlobalOpts,
) -> Result<Option<ConfirmOutcome>, CliError> {
    let Some(action) = console.pending_confirmation() else {
        return Ok(None);
    };
    if !confirm(&action.prompt(), global.yes)? {
        console.cancel_confirmation();
        return Err(CliError::Cancelled {
            action: action.title().into(),
        });
    }
    let outcome = with_spinner(global, action.title(), console.confirm()).await?;
    Ok(outcome)
}

/// Run `fut` behind a stderr spinner (hidden when quiet or not a TTY).
pub async fn with_spinner<T>(
    global: &GlobalOpts,
    message: &str,
    fut: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CoreError> {
    let spinner = if global.quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

/// Whether stdout output should carry color codes.
pub fn color(global: &GlobalOpts) -> bool {
    output::should_color(&global.color_mode())
}

/// `-` for missing optional values in tables.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
