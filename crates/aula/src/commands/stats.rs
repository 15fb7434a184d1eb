//! `aula stats`: summary counters.

use std::fmt::Write;

use aula_core::{Console, Statistics};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(stats: &Statistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total log entries: {}", stats.total_logs);
    let _ = writeln!(out, "Active users:      {}", stats.active_users);
    let _ = writeln!(out, "Changes today:     {}", stats.changes_today);
    if !stats.events_by_level.is_empty() {
        let _ = writeln!(out, "Entries by level:");
        for (level, count) in &stats.events_by_level {
            let _ = writeln!(out, "  {level:<10} {count}");
        }
    }
    out.trim_end().to_owned()
}

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let stats = util::with_spinner(global, "Loading statistics", console.load_statistics()).await?;
    let out = output::render_single(&global.format(), &stats, detail, |s| {
        s.total_logs.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
