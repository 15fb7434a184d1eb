//! `aula status`: one state poll.

use std::fmt::Write;

use aula_core::{Console, SystemState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(state: &SystemState, color: bool) -> String {
    let indicator = state.indicator();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Mode:     {}",
        output::paint_indicator(&state.mode_label, indicator, color)
    );
    let _ = writeln!(out, "CPU load: {}", state.cpu_load.display);
    let _ = writeln!(out, "Latency:  {}", state.latency.display);
    let _ = write!(out, "Status:   {indicator}");
    out
}

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let state = util::with_spinner(global, "Reading state", console.refresh_state()).await?;
    let color = util::color(global);
    let out = output::render_single(
        &global.format(),
        &state,
        |s| detail(s, color),
        |s| s.mode_label.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
