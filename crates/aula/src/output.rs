//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use aula_core::{Indicator, LogLevel, NoticeLevel};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Mode label colored by indicator class (green on, yellow standby, red off).
pub fn paint_indicator(label: &str, indicator: Indicator, color: bool) -> String {
    if !color {
        return label.to_owned();
    }
    match indicator {
        Indicator::On => label.green().bold().to_string(),
        Indicator::Standby => label.yellow().bold().to_string(),
        Indicator::Off => label.red().bold().to_string(),
    }
}

pub fn paint_level(level: &LogLevel, color: bool) -> String {
    let text = level.as_str();
    if !color {
        return text.to_owned();
    }
    match level {
        LogLevel::Error | LogLevel::Critical => text.red().to_string(),
        LogLevel::Warning => text.yellow().to_string(),
        LogLevel::Debug => text.dimmed().to_string(),
        LogLevel::Info | LogLevel::Other(_) => text.to_owned(),
    }
}

/// Print a notice-style status line on stderr.
pub fn print_notice(level: NoticeLevel, message: &str, color: bool, quiet: bool) {
    if quiet && level != NoticeLevel::Error {
        return;
    }
    let mark = match level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Info => "ℹ",
        NoticeLevel::Warning => "!",
        NoticeLevel::Error => "✗",
    };
    let mark = if color {
        match level {
            NoticeLevel::Success => mark.green().to_string(),
            NoticeLevel::Info => mark.cyan().to_string(),
            NoticeLevel::Warning => mark.yellow().to_string(),
            NoticeLevel::Error => mark.red().to_string(),
        }
    } else {
        mark.to_owned()
    };
    eprintln!("{mark} {message}");
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
