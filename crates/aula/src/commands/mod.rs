//! Command dispatch: bridges CLI args -> `Console` calls -> output formatting.

pub mod analytics;
pub mod audit;
pub mod config_cmd;
pub mod logs;
pub mod mode;
pub mod session;
pub mod settings;
pub mod stats;
pub mod status;
pub mod users;
pub mod util;

use aula_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(console, global).await,
        Command::Mode(args) => mode::handle(console, args, global).await,
        Command::Logs(args) => logs::handle(console, args, global).await,
        Command::Users(args) => users::handle(console, args, global).await,
        Command::Audit(args) => audit::handle(console, args, global).await,
        Command::Stats => stats::handle(console, global).await,
        Command::Analytics(args) => analytics::handle(console, args, global).await,
        Command::Settings(args) => settings::handle(console, args, global).await,
        Command::Login => session::login(console, global),
        Command::Logout => session::logout(console, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "does not need a server connection".into(),
        }),
    }
}
