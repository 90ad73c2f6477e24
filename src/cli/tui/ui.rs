//! UI rendering for the TUI.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::core::form::{FieldKind, FormField, JobForm};
use crate::core::models::{Health, Job, JobStatus, Stats};
use crate::core::status::{self, StatusCategory};

use super::app::{TuiApp, View};

/// Main render function - dispatches to view-specific renderers.
pub fn render(frame: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer/help
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match &app.view {
        View::Dashboard { selected } => render_jobs(frame, app, chunks[1], *selected),
        View::Detail { scroll, .. } => render_detail(frame, app, chunks[1], *scroll),
    }

    render_footer(frame, app, chunks[2]);

    if let Some(form) = app.dashboard.form() {
        render_form(frame, app, form);
    }
    if let Some(notice) = app.dashboard.notice() {
        render_notice(frame, notice);
    }
}

fn category_color(category: StatusCategory) -> Color {
    match category {
        StatusCategory::Success => Color::Green,
        StatusCategory::Error => Color::Red,
        StatusCategory::Running => Color::Yellow,
        StatusCategory::Info => Color::Cyan,
        StatusCategory::Default => Color::Gray,
    }
}

fn render_header(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let dash = &app.dashboard;
    let state = if dash.is_loading() {
        "loading...".to_string()
    } else {
        format!("{} jobs", dash.jobs().len())
    };
    let page = dash.settings().query.page_number() + 1;

    let block = Block::default()
        .title(format!("Chronos Scheduler  {}  page {}", state, page))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = match dash.stats() {
        Some(stats) => {
            let health_color = if stats.health.is_up() {
                Color::Green
            } else {
                Color::Red
            };
            Line::from(vec![
                Span::raw(format!("  {}", stats_summary(stats))),
                Span::raw("  "),
                Span::styled(
                    format!("health: {}", health_label(&stats.health)),
                    Style::default().fg(health_color),
                ),
            ])
        }
        None => Line::from(Span::styled(
            "  stats unavailable",
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Job totals shown in the header.
fn stats_summary(stats: &Stats) -> String {
    let jobs = &stats.jobs;
    format!(
        "total {}  running {}  failed {}  completed {}  runs {}",
        jobs.total,
        jobs.count(&JobStatus::Running),
        jobs.count(&JobStatus::Failed),
        jobs.count(&JobStatus::Completed),
        stats.runs.total
    )
}

fn health_label(health: &Health) -> &str {
    if health.status.is_empty() {
        "unknown"
    } else {
        &health.status
    }
}

fn job_card<'a>(app: &TuiApp, job: &'a Job, is_selected: bool) -> ListItem<'a> {
    let label = Style::default().fg(Color::DarkGray);
    let badge = Style::default()
        .fg(category_color(job.status.category()))
        .add_modifier(Modifier::BOLD);

    let run_button = if app.dashboard.is_triggering(job.id) {
        Span::styled("[Starting...]", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("[Run Now]", Style::default().fg(Color::Green))
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw(if is_selected { "> " } else { "  " }),
            Span::styled(job.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("[{}]", job.status), badge),
            Span::raw("  "),
            run_button,
        ]),
        Line::from(vec![
            Span::styled("    Type: ", label),
            Span::raw(job.job_type.as_str()),
            Span::styled("  Owner: ", label),
            Span::raw(job.owner.as_str()),
        ]),
        Line::from(vec![
            Span::styled("    Last Run: ", label),
            Span::raw(status::format_last_run(job)),
            Span::styled("  Next Run: ", label),
            Span::raw(status::format_next_run(job)),
        ]),
    ];

    if let Some(outcome) = app.dashboard.last_outcome(job) {
        let first_line = outcome.lines().next().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("    Last Outcome: ", label),
            Span::styled(first_line, Style::default().fg(Color::White)),
        ]));
    }

    let style = if is_selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    ListItem::new(lines).style(style)
}

fn render_jobs(frame: &mut Frame, app: &TuiApp, area: Rect, selected: usize) {
    let block = Block::default()
        .title("Jobs")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let jobs = app.dashboard.jobs();
    if jobs.is_empty() {
        let text = if app.dashboard.is_loading() {
            "  Loading jobs..."
        } else {
            "  No jobs yet. Press [n] to create one."
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Keep the selected card visible: each card is 3-4 rows.
    let rows_per_card = 4usize;
    let visible = (area.height.saturating_sub(2) as usize / rows_per_card).max(1);
    let skip = selected.saturating_sub(visible.saturating_sub(1));

    let items: Vec<ListItem> = jobs
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, job)| job_card(app, job, i == selected))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_detail(frame: &mut Frame, app: &TuiApp, area: Rect, scroll: u16) {
    let block = Block::default()
        .title("Job Details")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(detail) = app.dashboard.detail() else {
        let text = Paragraph::new("  Loading...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(text, area);
        return;
    };
    let job = &detail.job;

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", name), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        field("Job ID:", job.id.to_string()),
        field("Name:", job.name.clone()),
        field("Owner:", job.owner.clone()),
        field("Type:", job.job_type.to_string()),
        Line::from(vec![
            Span::styled(format!("  {:<14}", "Status:"), Style::default().fg(Color::Cyan)),
            Span::styled(
                job.status.to_string(),
                Style::default().fg(category_color(job.status.category())),
            ),
        ]),
        field("Schedule:", job.schedule.clone().unwrap_or_else(|| "-".into())),
        field(
            "Recurring:",
            if job.is_recurring.unwrap_or(false) { "yes" } else { "no" }.into(),
        ),
        field(
            "Retries:",
            format!(
                "{}/{}",
                job.current_retries.unwrap_or(0),
                job.max_retries.unwrap_or(0)
            ),
        ),
        field("Last Run:", status::format_last_run(job)),
        field("Next Run:", status::format_next_run(job)),
        field(
            "Description:",
            job.description.clone().unwrap_or_else(|| "-".into()),
        ),
        Line::from(""),
        Line::from(Span::styled(
            "  Recent Runs",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("  ─────────────────────────────────────────"),
    ];

    if detail.runs.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No runs yet",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for run in &detail.runs {
        let started = status::format_run_time(run.started_at, "-");
        let mut parts = vec![
            Span::raw(format!("  {}  ", started)),
            Span::styled(
                format!("{:<10}", run.status),
                Style::default().fg(category_color(run.status.category())),
            ),
        ];
        if let Some(attempt) = run.retry_attempt {
            parts.push(Span::raw(format!("  attempt {}", attempt)));
        }
        if let Some(worker) = &run.worker_id {
            parts.push(Span::styled(
                format!("  on {}", worker),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(parts));

        if let Some(error) = run.error.as_deref().filter(|e| !e.is_empty()) {
            for text in error.lines() {
                lines.push(Line::from(Span::styled(
                    format!("      {}", text),
                    Style::default().fg(Color::Red),
                )));
            }
        } else if let Some(output) = run.output.as_deref().filter(|o| !o.is_empty()) {
            for text in output.lines() {
                lines.push(Line::from(format!("      {}", text)));
            }
        }
    }

    let paragraph = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_form(frame: &mut Frame, app: &TuiApp, form: &JobForm) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title("Create New Job")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let focused = app.focused_field();
    let mut lines = Vec::new();

    for field in form.visible_fields() {
        let is_focused = focused == Some(field);
        let marker = if is_focused { "> " } else { "  " };
        let label_style = if is_focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let value = form.value(field);
        let value_span = match field.kind() {
            FieldKind::Choice | FieldKind::Toggle => Span::raw(format!("< {} >", value)),
            _ if value.is_empty() && field == FormField::Schedule => {
                Span::styled(
                    form.schedule_placeholder(),
                    Style::default().fg(Color::DarkGray),
                )
            }
            _ if is_focused => Span::raw(format!("{}▏", value)),
            _ => Span::raw(value),
        };

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<20}", form.label(field)), label_style),
            value_span,
        ]));

        if field == FormField::Schedule && form.common.is_recurring {
            lines.push(Line::from(Span::styled(
                "                      Format: sec min hr day month day-of-week",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.push(Line::from(""));
    if app.dashboard.is_creating() {
        lines.push(Line::from(Span::styled(
            "  Creating...",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(Span::styled(
        "  [Tab] Next  [←→] Change  [F2] Create  [Esc] Cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title("Notice")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(""),
        Line::from(format!("  {}", message)),
        Line::from(""),
        Line::from(Span::styled(
            "  [Enter] OK",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let help_text = match &app.view {
        View::Dashboard { .. } => {
            "[↑↓] Navigate  [Enter] Details  [x] Run  [n] New  [c] Cancel  [r] Refresh  [PgUp/PgDn] Page  [q] Quit"
        }
        View::Detail { .. } => "[↑↓] Scroll  [x] Run  [c] Cancel  [Esc] Back  [q] Quit",
    };

    let mut spans = vec![Span::raw(format!("  {}", help_text))];

    if let Some(error) = app.dashboard.error() {
        spans.push(Span::styled(
            format!("  Error: {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

/// A rectangle centred in `area` taking the given percentages of its size.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
