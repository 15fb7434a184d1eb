//! Analytics screen: top users, mode usage, mode timeline and daily
//! event counts. Each panel shows its own load state.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Cell as TableCell, Chart, Dataset, GraphType, LegendPosition, Paragraph, Row, Table,
};

use aula_core::admin::{DAILY_EVENT_DAYS, TIMELINE_LIMIT, TOP_USERS_LIMIT};
use aula_core::{AnalyticsView, DailyEvents, ModeChange, ModeUsage, UserActivity};

use crate::action::Action;
use crate::component::Component;
use crate::screens::{loaded_or_placeholder, panel};
use crate::theme;

pub struct AnalyticsScreen {
    focused: bool,
    view: Arc<AnalyticsView>,
}

/// Horizontal bars scaled relative to the largest value.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn bar_lines(items: &[(String, u64, String)], area: Rect) -> Vec<Line<'static>> {
    let max_rows = usize::from(area.height);
    let bar_budget = usize::from(area.width.saturating_sub(28));
    let colors = theme::CHART_SERIES;
    let max_value = items.iter().map(|(_, v, _)| *v).max().unwrap_or(1).max(1);

    items
        .iter()
        .take(max_rows)
        .enumerate()
        .map(|(i, (name, value, suffix))| {
            let fraction = *value as f64 / max_value as f64;
            let width = (fraction * bar_budget as f64).round().max(1.0) as usize;
            let name: String = name.chars().take(14).collect();
            Line::from(vec![
                Span::styled(format!("  {name:<14} "), Style::default().fg(theme::DIM_WHITE)),
                Span::styled(
                    "█".repeat(width.min(bar_budget)),
                    Style::default().fg(colors[i % colors.len()]),
                ),
                Span::styled(format!(" {value:>5}"), Style::default().fg(theme::DIM_WHITE)),
                Span::styled(suffix.clone(), theme::muted()),
            ])
        })
        .collect()
}

impl AnalyticsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            view: Arc::new(AnalyticsView::default()),
        }
    }

    fn render_top_users(&self, frame: &mut Frame, area: Rect) {
        let block = panel(&format!("Top {TOP_USERS_LIMIT} users"), self.focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let Some(users) = loaded_or_placeholder(frame, inner, &self.view.top_users) else {
            return;
        };
        if users.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No user activity", theme::muted())),
                inner,
            );
            return;
        }
        let items: Vec<_> = users
            .iter()
            .map(|UserActivity { user, total_actions, last_action }| {
                let last = last_action
                    .as_deref()
                    .map(|at| format!("  {at}"))
                    .unwrap_or_default();
                (user.clone(), *total_actions, last)
            })
            .collect();
        frame.render_widget(Paragraph::new(bar_lines(&items, inner)), inner);
    }

    fn render_mode_usage(&self, frame: &mut Frame, area: Rect) {
        let block = panel("Usage by mode", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let Some(usage) = loaded_or_placeholder(frame, inner, &self.view.mode_usage) else {
            return;
        };
        if usage.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No mode changes recorded", theme::muted())),
                inner,
            );
            return;
        }
        let items: Vec<_> = usage
            .iter()
            .map(|ModeUsage { mode, total_uses, distinct_users }| {
                (mode.clone(), *total_uses, format!("  {distinct_users} user(s)"))
            })
            .collect();
        frame.render_widget(Paragraph::new(bar_lines(&items, inner)), inner);
    }

    fn render_timeline(&self, frame: &mut Frame, area: Rect) {
        let block = panel(&format!("Last {TIMELINE_LIMIT} mode changes"), false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let Some(changes) = loaded_or_placeholder(frame, inner, &self.view.timeline) else {
            return;
        };
        if changes.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No mode changes recorded", theme::muted())),
                inner,
            );
            return;
        }

        let header = Row::new(["Time", "User", "From", "To"]).style(theme::table_header());
        let rows = changes.iter().map(|ModeChange { timestamp, user, from, to, .. }| {
            Row::new(vec![
                TableCell::from(Span::styled(
                    timestamp.clone(),
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                )),
                TableCell::from(user.clone()),
                TableCell::from(Span::styled(
                    from.clone().unwrap_or_else(|| "-".into()),
                    theme::muted(),
                )),
                TableCell::from(Span::styled(
                    to.clone().unwrap_or_else(|| "-".into()),
                    Style::default().fg(theme::NEON_CYAN),
                )),
            ])
            .style(theme::table_row())
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(19),
                Constraint::Length(12),
                Constraint::Min(10),
                Constraint::Min(10),
            ],
        )
        .header(header);
        frame.render_widget(table, inner);
    }

    /// Daily totals, errors and warnings as Braille lines over the window.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn render_daily(&self, frame: &mut Frame, area: Rect) {
        let block = panel(&format!("Events, last {DAILY_EVENT_DAYS} days"), false);
        let inner = block.inner(area);
        let Some(days) = self.view.daily.loaded().filter(|d| !d.is_empty()) else {
            frame.render_widget(block, area);
            if loaded_or_placeholder(frame, inner, &self.view.daily).is_some() {
                frame.render_widget(
                    Paragraph::new(Span::styled("  No events in this window", theme::muted())),
                    inner,
                );
            }
            return;
        };

        let series = |pick: fn(&DailyEvents) -> u64| -> Vec<(f64, f64)> {
            days.iter()
                .enumerate()
                .map(|(i, d)| (i as f64, pick(d) as f64))
                .collect()
        };
        let totals = series(|d| d.total);
        let errors = series(|d| d.errors);
        let warnings = series(|d| d.warnings);
        let y_max = days.iter().map(|d| d.total).max().unwrap_or(0).max(1) as f64 * 1.1;
        let x_max = (days.len().saturating_sub(1) as f64).max(1.0);

        let axis_style = Style::default().fg(theme::BORDER_GRAY);
        let first = days.first().map(|d| d.day.clone()).unwrap_or_default();
        let last = days.last().map(|d| d.day.clone()).unwrap_or_default();

        let chart = Chart::new(vec![
            series_line("total", theme::ELECTRIC_PURPLE, &totals),
            series_line("warnings", theme::ELECTRIC_YELLOW, &warnings),
            series_line("errors", theme::ERROR_RED, &errors),
        ])
        .block(block)
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Span::styled(first, axis_style), Span::styled(last, axis_style)])
                .style(axis_style),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", axis_style),
                    Span::styled(format!("{}", y_max.round()), axis_style),
                ])
                .style(axis_style),
        );
        frame.render_widget(chart, area);
    }
}

fn series_line<'a>(name: &'a str, color: Color, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

impl Component for AnalyticsScreen {
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::AnalyticsUpdated(view) = action {
            self.view = Arc::clone(view);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [top, bottom] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let [users, modes] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(top);
        let [timeline, daily] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(bottom);

        self.render_top_users(frame, users);
        self.render_mode_usage(frame, modes);
        self.render_timeline(frame, timeline);
        self.render_daily(frame, daily);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        "r reload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::Loadable;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::screens::buffer_text;

    fn render(view: AnalyticsView) -> String {
        let mut screen = AnalyticsScreen::new();
        screen
            .update(&Action::AnalyticsUpdated(Arc::new(view)))
            .unwrap_or_else(|e| panic!("{e}"));
        let mut terminal =
            Terminal::new(TestBackend::new(140, 30)).unwrap_or_else(|e| panic!("{e}"));
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap_or_else(|e| panic!("{e}"));
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn failed_section_leaves_others_rendered() {
        let view = AnalyticsView {
            top_users: Loadable::Loaded(vec![UserActivity {
                user: "tecnico".into(),
                total_actions: 42,
                last_action: None,
            }]),
            mode_usage: Loadable::Failed("Server error (500)".into()),
            timeline: Loadable::Loaded(Vec::new()),
            daily: Loadable::Loading,
        };
        let text = render(view);
        assert!(text.contains("tecnico"));
        assert!(text.contains("Server error (500)"));
        assert!(text.contains("No mode changes recorded"));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn daily_chart_names_its_series() {
        let day = |day: &str, total| DailyEvents {
            day: day.into(),
            total,
            errors: 1,
            warnings: 2,
        };
        let view = AnalyticsView {
            daily: Loadable::Loaded(vec![day("2026-01-01", 10), day("2026-01-02", 30)]),
            ..AnalyticsView::default()
        };
        let text = render(view);
        assert!(text.contains("total"));
        assert!(text.contains("2026-01-02"));
    }

    #[test]
    fn bars_scale_to_largest_value() {
        let items = vec![
            ("a".to_owned(), 10, String::new()),
            ("b".to_owned(), 5, String::new()),
        ];
        let lines = bar_lines(&items, Rect::new(0, 0, 48, 5));
        let width = |line: &Line| line.spans[1].content.chars().count();
        assert_eq!(width(&lines[0]), 20);
        assert_eq!(width(&lines[1]), 10);
    }
}
