//! `aula settings`: server configuration entries.

use tabled::Tabled;

use aula_core::{ConfigEntry, ConfigKind, Console, NoticeLevel};

use crate::cli::{GlobalOpts, OutputFormat, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&ConfigEntry> for SettingRow {
    fn from(e: &ConfigEntry) -> Self {
        let value = match e.kind {
            ConfigKind::Boolean if e.is_enabled() => "[x] on".to_owned(),
            ConfigKind::Boolean => "[ ] off".to_owned(),
            ConfigKind::Integer | ConfigKind::Text => e.value.clone(),
        };
        let updated = match (e.updated_at.as_deref(), e.updated_by.as_deref()) {
            (Some(at), Some(by)) => format!("{at} ({by})"),
            (Some(at), None) => at.to_owned(),
            (None, _) => "-".to_owned(),
        };
        Self {
            key: e.key.clone(),
            value,
            kind: e.kind.to_string(),
            category: util::or_dash(e.category.as_deref()),
            description: util::or_dash(e.description.as_deref()),
            updated,
        }
    }
}

// The row constructor alone is not general over the borrow lifetime.
#[allow(clippy::redundant_closure)]
fn render_settings(format: &OutputFormat, entries: &[ConfigEntry]) -> String {
    output::render_list(
        format,
        entries,
        |e| SettingRow::from(e),
        |e| format!("{}={}", e.key, e.value),
    )
}

pub async fn handle(
    console: &Console,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::List { category } => {
            let entries =
                util::with_spinner(global, "Loading settings", console.load_settings(category))
                    .await?;
            let out = render_settings(&global.format(), &entries);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set { key, value } => {
            let message =
                util::with_spinner(global, "Saving", console.save_setting(&key, &value)).await?;
            if let Some(message) = message {
                output::print_notice(
                    NoticeLevel::Success,
                    &message,
                    util::color(global),
                    global.quiet,
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ConfigKind, value: &str) -> ConfigEntry {
        ConfigEntry {
            id: 1,
            key: "modo_debug".into(),
            value: value.into(),
            kind,
            description: None,
            category: Some("sistema".into()),
            updated_at: Some("2026-03-01 09:00:00".into()),
            updated_by: None,
        }
    }

    #[test]
    fn booleans_render_as_toggles() {
        assert_eq!(SettingRow::from(&entry(ConfigKind::Boolean, "1")).value, "[x] on");
        assert_eq!(
            SettingRow::from(&entry(ConfigKind::Boolean, "false")).value,
            "[ ] off"
        );
        assert_eq!(SettingRow::from(&entry(ConfigKind::Integer, "85")).value, "85");
    }

    #[test]
    fn settings_list_renders_rows_and_pairs() {
        let entries = [entry(ConfigKind::Boolean, "true")];
        let table = render_settings(&OutputFormat::Table, &entries);
        assert!(table.contains("[x] on"));
        assert!(table.contains("sistema"));
        assert_eq!(
            render_settings(&OutputFormat::Plain, &entries),
            "modo_debug=true"
        );
    }
}
