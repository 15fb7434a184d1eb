//! `aula analytics`: usage feeds, each loaded and reported on its own.

use tabled::Tabled;

use aula_core::{
    AnalyticsSection, AnalyticsView, Console, DailyEvents, Loadable, ModeChange, ModeUsage,
    NoticeLevel, UserActivity,
};

use crate::cli::{AnalyticsArg, AnalyticsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TopUserRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Actions")]
    actions: u64,
    #[tabled(rename = "Last action")]
    last: String,
}

#[derive(Tabled)]
struct ModeUsageRow {
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Uses")]
    uses: u64,
    #[tabled(rename = "Users")]
    users: u64,
}

#[derive(Tabled)]
struct TimelineRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Events")]
    total: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "Warnings")]
    warnings: u64,
}

fn sections_for(arg: Option<AnalyticsArg>) -> Vec<AnalyticsSection> {
    match arg {
        None => vec![
            AnalyticsSection::Users,
            AnalyticsSection::Modes,
            AnalyticsSection::Timeline,
        ],
        Some(AnalyticsArg::Users) => vec![AnalyticsSection::Users],
        Some(AnalyticsArg::Modes) => vec![AnalyticsSection::Modes],
        Some(AnalyticsArg::Timeline) => vec![AnalyticsSection::Timeline],
        Some(AnalyticsArg::Daily) => vec![AnalyticsSection::Daily],
    }
}

fn render_section(
    view: &AnalyticsView,
    section: AnalyticsSection,
    format: &OutputFormat,
) -> Option<String> {
    match section {
        AnalyticsSection::Users => view.top_users.loaded().map(|rows: &Vec<UserActivity>| {
            output::render_list(
                format,
                rows,
                |r| TopUserRow {
                    user: r.user.clone(),
                    actions: r.total_actions,
                    last: util::or_dash(r.last_action.as_deref()),
                },
                |r| r.user.clone(),
            )
        }),
        AnalyticsSection::Modes => view.mode_usage.loaded().map(|rows: &Vec<ModeUsage>| {
            output::render_list(
                format,
                rows,
                |r| ModeUsageRow {
                    mode: r.mode.clone(),
                    uses: r.total_uses,
                    users: r.distinct_users,
                },
                |r| r.mode.clone(),
            )
        }),
        AnalyticsSection::Timeline => view.timeline.loaded().map(|rows: &Vec<ModeChange>| {
            output::render_list(
                format,
                rows,
                |r| TimelineRow {
                    time: r.timestamp.clone(),
                    user: r.user.clone(),
                    from: util::or_dash(r.from.as_deref()),
                    to: util::or_dash(r.to.as_deref()),
                },
                |r| r.timestamp.clone(),
            )
        }),
        AnalyticsSection::Daily => view.daily.loaded().map(|rows: &Vec<DailyEvents>| {
            output::render_list(
                format,
                rows,
                |r| DailyRow {
                    day: r.day.clone(),
                    total: r.total,
                    errors: r.errors,
                    warnings: r.warnings,
                },
                |r| r.day.clone(),
            )
        }),
    }
}

fn is_loaded(view: &AnalyticsView, section: AnalyticsSection) -> bool {
    match section {
        AnalyticsSection::Users => matches!(view.top_users, Loadable::Loaded(_)),
        AnalyticsSection::Modes => matches!(view.mode_usage, Loadable::Loaded(_)),
        AnalyticsSection::Timeline => matches!(view.timeline, Loadable::Loaded(_)),
        AnalyticsSection::Daily => matches!(view.daily, Loadable::Loaded(_)),
    }
}

fn title(section: AnalyticsSection) -> &'static str {
    match section {
        AnalyticsSection::Users => "Most active users",
        AnalyticsSection::Modes => "Usage by mode",
        AnalyticsSection::Timeline => "Mode timeline",
        AnalyticsSection::Daily => "Daily events",
    }
}

pub async fn handle(
    console: &Console,
    args: AnalyticsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let sections = sections_for(args.section);
    let view = util::with_spinner(global, "Loading analytics", async {
        Ok(console.load_analytics_sections(&sections).await)
    })
    .await?;

    let format = global.format();
    let color = util::color(global);

    if format == OutputFormat::Table {
        for &section in &sections {
            if let Some(out) = render_section(&view, section, &format) {
                output::print_output(&format!("{}\n{out}", title(section)), global.quiet);
            }
        }
    } else {
        let out = output::render_single(&format, &view, |_| String::new(), |_| String::new());
        output::print_output(&out, global.quiet);
    }

    for (section, message) in view.failures() {
        output::print_notice(
            NoticeLevel::Error,
            &format!("{}: {message}", title(section)),
            color,
            global.quiet,
        );
    }

    if sections.iter().any(|&s| is_loaded(&view, s)) {
        Ok(())
    } else {
        Err(CliError::ApiError {
            code: "analytics".into(),
            message: "no analytics feed could be loaded".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_skips_daily() {
        let sections = sections_for(None);
        assert_eq!(sections.len(), 3);
        assert!(!sections.contains(&AnalyticsSection::Daily));
        assert_eq!(
            sections_for(Some(AnalyticsArg::Daily)),
            vec![AnalyticsSection::Daily]
        );
    }

    #[test]
    fn failed_section_renders_nothing() {
        let view = AnalyticsView {
            top_users: Loadable::Failed("Connection error".into()),
            mode_usage: Loadable::Loaded(vec![ModeUsage {
                mode: "CINE 3D".into(),
                total_uses: 4,
                distinct_users: 2,
            }]),
            ..AnalyticsView::default()
        };
        assert!(render_section(&view, AnalyticsSection::Users, &OutputFormat::Table).is_none());
        let modes = render_section(&view, AnalyticsSection::Modes, &OutputFormat::Plain);
        assert_eq!(modes.as_deref(), Some("CINE 3D"));
    }
}
