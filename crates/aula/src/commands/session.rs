//! `aula login` / `aula logout`.
//!
//! Each invocation opens its own session, so `login` only proves the
//! credentials work and `logout` ends the session explicitly.

use aula_core::{Console, NoticeLevel};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub fn login(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let config = console.config();
    let Some(creds) = config.credentials.as_ref() else {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "no username configured; pass --username or set it on the profile".into(),
        });
    };
    output::print_notice(
        NoticeLevel::Success,
        &format!("Logged in to {} as {}", config.url, creds.username),
        util::color(global),
        global.quiet,
    );
    Ok(())
}

pub async fn logout(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let had_session = console.config().credentials.is_some();
    console.disconnect().await;
    let message = if had_session {
        "Session closed"
    } else {
        "No session to close"
    };
    output::print_notice(
        NoticeLevel::Info,
        message,
        util::color(global),
        global.quiet,
    );
    Ok(())
}
