//! `aula logs`: recent audit entries, optionally followed.

use std::time::Duration;

use tabled::Tabled;
use tokio::time::MissedTickBehavior;

use aula_core::{Console, LogEntry};

use crate::cli::{GlobalOpts, LogsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

/// ANSI clear-screen + cursor-home, sent before each redraw when following.
const CLEAR: &str = "\x1b[2J\x1b[H";

#[derive(Tabled)]
struct LogRow {
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
}

fn row(entry: &LogEntry, color: bool) -> LogRow {
    LogRow {
        time: entry.timestamp.clone(),
        level: output::paint_level(&entry.level, color),
        user: entry.user.clone(),
        event: entry.event.clone(),
        detail: entry.detail.clone(),
    }
}

fn render(entries: &[LogEntry], format: &OutputFormat, color: bool) -> String {
    if entries.is_empty() && *format == OutputFormat::Table {
        return "No log entries".into();
    }
    output::render_list(
        format,
        entries,
        |e| row(e, color),
        |e| format!("{}\t{}\t{}", e.timestamp, e.level, e.event),
    )
}

pub async fn handle(console: &Console, args: LogsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.follow {
        return follow(console, Duration::from_secs(args.interval), global).await;
    }

    util::with_spinner(global, "Loading logs", console.refresh_logs()).await?;
    let window = console.logs_snapshot();
    let out = render(&window.entries, &global.format(), util::color(global));
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Redraw the full list every `period` until Ctrl-C. A failed refresh
/// keeps the previous list on screen.
async fn follow(console: &Console, period: Duration, global: &GlobalOpts) -> Result<(), CliError> {
    let color = util::color(global);
    let format = global.format();
    let redraw = format == OutputFormat::Table && color;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Err(e) = console.refresh_logs().await {
                    tracing::warn!(error = %e, "log refresh failed");
                    continue;
                }
                let window = console.logs_snapshot();
                let out = render(&window.entries, &format, color);
                if redraw && !global.quiet {
                    print!("{CLEAR}");
                }
                output::print_output(&out, global.quiet);
            }
        }
    }
    Ok(())
}
