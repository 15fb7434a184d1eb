//! `aula audit`: log search, cleanup and CSV export.

use std::io::Write;

use chrono::NaiveDate;
use tabled::Tabled;

use aula_core::{ConfirmOutcome, Console, LogEntry, LogFilter, NoticeLevel};

use crate::cli::{AuditArgs, AuditCommand, AuditSearchArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Detail")]
    detail: String,
    #[tabled(rename = "IP")]
    ip: String,
}

fn row(entry: &LogEntry, color: bool) -> AuditRow {
    AuditRow {
        time: entry.timestamp.clone(),
        level: output::paint_level(&entry.level, color),
        user: entry.user.clone(),
        event: entry.event.clone(),
        detail: entry.detail.clone(),
        ip: util::or_dash(entry.source_ip.as_deref()),
    }
}

fn parse_day(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, CliError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| CliError::Validation {
                field: field.into(),
                reason: format!("invalid date '{v}' (use YYYY-MM-DD)"),
            })
        })
        .transpose()
}

fn filter_from_args(args: AuditSearchArgs) -> Result<LogFilter, CliError> {
    let from = parse_day(args.from.as_deref(), "from")?;
    let to = parse_day(args.to.as_deref(), "to")?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(CliError::Validation {
                field: "from".into(),
                reason: "must not be after --to".into(),
            });
        }
    }
    Ok(LogFilter {
        user: args.user,
        level: args.level,
        from,
        to,
        event: args.event,
        limit: args.limit,
    })
}

pub async fn handle(console: &Console, args: AuditArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuditCommand::Search(search) => {
            let filter = filter_from_args(search)?;
            let results =
                util::with_spinner(global, "Searching", console.search_logs(filter)).await?;
            let format = global.format();
            if results.is_empty() && format == OutputFormat::Table {
                output::print_output("No records match these filters", global.quiet);
                return Ok(());
            }
            let color = util::color(global);
            let out = output::render_list(
                &format,
                &results.entries,
                |e| row(e, color),
                |e| e.id.map_or_else(|| e.timestamp.clone(), |id| id.to_string()),
            );
            output::print_output(&out, global.quiet);
            if format == OutputFormat::Table && !global.quiet {
                eprintln!(
                    "{} of {} matching record(s)",
                    results.entries.len(),
                    results.total
                );
            }
            Ok(())
        }

        AuditCommand::Cleanup { days } => {
            console.request_cleanup(days)?;
            if let Some(ConfirmOutcome::LogsRemoved(removed)) =
                util::resolve_pending(console, global).await?
            {
                let plural = if removed == 1 { "" } else { "s" };
                output::print_notice(
                    NoticeLevel::Success,
                    &format!("Removed {removed} log record{plural}"),
                    util::color(global),
                    global.quiet,
                );
            }
            Ok(())
        }

        AuditCommand::Export { limit, out } => {
            let csv = util::with_spinner(global, "Exporting", console.export_logs(limit)).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &csv)?;
                    if !global.quiet {
                        eprintln!("✓ Wrote {} bytes to {}", csv.len(), path.display());
                    }
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&csv)?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
    }
}
