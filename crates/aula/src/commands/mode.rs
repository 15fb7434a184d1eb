//! `aula mode <mode>`: the mode-change dispatcher.

use aula_core::{ConfirmOutcome, Console, DispatchOutcome, Mode, NoticeLevel};

use crate::cli::{GlobalOpts, ModeArg, ModeArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub(crate) fn to_mode(arg: ModeArg) -> Mode {
    match arg {
        ModeArg::Conferencia => Mode::Conferencia,
        ModeArg::Cine => Mode::Cine,
        ModeArg::Standby => Mode::Standby,
        ModeArg::Off => Mode::Off,
    }
}

pub async fn handle(console: &Console, args: ModeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mode = to_mode(args.mode);
    let message = format!("Switching to {mode}");
    let outcome = util::with_spinner(global, &message, console.activate_mode(mode)).await?;

    let outcome = match outcome {
        DispatchOutcome::AwaitingConfirmation => match util::resolve_pending(console, global).await? {
            Some(ConfirmOutcome::ModeChange(outcome)) => outcome,
            _ => DispatchOutcome::Ignored,
        },
        other => other,
    };

    report(&outcome, global)
}

fn report(outcome: &DispatchOutcome, global: &GlobalOpts) -> Result<(), CliError> {
    let color = util::color(global);
    match outcome {
        DispatchOutcome::Applied { state, message } => {
            output::print_notice(NoticeLevel::Success, message, color, global.quiet);
            if let Some(state) = state {
                let out = output::render_single(
                    &global.format(),
                    state,
                    |s| {
                        format!(
                            "Mode: {}  CPU: {}  Latency: {}",
                            output::paint_indicator(&s.mode_label, s.indicator(), color),
                            s.cpu_load.display,
                            s.latency.display
                        )
                    },
                    |s| s.mode_label.clone(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
        DispatchOutcome::Unchanged { message } => {
            output::print_notice(NoticeLevel::Info, message, color, global.quiet);
            Ok(())
        }
        DispatchOutcome::RateLimited { retry_after } => Err(CliError::RateLimited {
            retry_after: retry_after.clone().unwrap_or_else(|| "a moment".into()),
        }),
        DispatchOutcome::Ignored | DispatchOutcome::AwaitingConfirmation => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_argument_maps_to_its_mode() {
        assert_eq!(to_mode(ModeArg::Conferencia).wire_name(), "CONFERENCIA");
        assert_eq!(to_mode(ModeArg::Cine).wire_name(), "CINE");
        assert_eq!(to_mode(ModeArg::Standby).wire_name(), "STANDBY");
        assert!(to_mode(ModeArg::Off).is_destructive());
    }
}
