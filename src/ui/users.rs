use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::api::{DetailRecord, NamedRef};
use crate::app::AppState;
use crate::app::bulk::BulkReport;
use crate::filter::PeriodType;
use crate::ui::components::centered_rect;

fn fmt_date(ts: DateTime<Utc>) -> String {
    ts.format("%b %d, %Y").to_string()
}

fn fmt_last_login(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => fmt_date(ts),
        None => "Never".to_string(),
    }
}

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.table.rows_per_page = body_height;
    }

    let rpp = app.table.rows_per_page.max(1);
    let start = (app.table.cursor / rpp) * rpp;
    let end = (start + rpp).min(app.table.visible_len());

    let mut rows = Vec::with_capacity(end - start);
    for i in start..end {
        let Some(u) = app.table.visible_row(i) else { continue };
        let checkbox = if u.disabled {
            " - "
        } else if app.table.is_selected(&u.id) {
            "[x]"
        } else {
            "[ ]"
        };
        let style = if i == app.table.cursor {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else if u.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(app.theme.text)
        };
        rows.push(
            Row::new(vec![
                Cell::from(checkbox),
                Cell::from(u.username.clone()),
                Cell::from(u.first_name.clone()),
                Cell::from(u.surname.clone()),
                Cell::from(if u.disabled { "Yes" } else { "No" }),
                Cell::from(fmt_date(u.created)),
                Cell::from(fmt_last_login(u.last_login)),
            ])
            .style(style),
        );
    }

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(22),
        Constraint::Percentage(18),
        Constraint::Percentage(18),
        Constraint::Length(8),
        Constraint::Length(13),
        Constraint::Length(13),
    ];
    let header = Row::new(vec!["", "USERNAME", "FIRST NAME", "SURNAME", "DISABLED", "CREATED", "LAST LOGIN"])
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!("Users ({})", app.table.visible_len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

pub fn render_confirm_modal(f: &mut Frame, area: Rect, app: &AppState, count: usize) {
    let rect = centered_rect(54, 7, area);
    let text = format!(
        "{count} user(s) will be disabled. Do you want to continue?\n\n[Enter] Yes    [Esc] Cancel"
    );
    let p = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Confirm bulk disable")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.danger)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_progress_modal(f: &mut Frame, area: Rect, app: &AppState, done: usize, total: usize) {
    let rect = centered_rect(44, 5, area);
    let p = Paragraph::new(format!("{done} of {total} users updated...")).block(
        Block::default()
            .title("Disabling users")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_summary_modal(f: &mut Frame, area: Rect, app: &AppState, report: &BulkReport) {
    let failures = report.failures();
    let height = if failures.is_empty() {
        6
    } else {
        (failures.len() as u16 + 9).min(area.height.saturating_sub(4))
    };
    let width = if failures.is_empty() { 48 } else { 72u16.min(area.width.saturating_sub(4)) };
    let rect = centered_rect(width, height, area);

    let block = Block::default()
        .title("Summary")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(rect);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);

    let headline = format!("{} users were successfully processed.", report.success_count());
    if failures.is_empty() {
        let p = Paragraph::new(format!("{headline}\n\n[Enter] Close"));
        f.render_widget(p, inner);
        return;
    }

    // A results table shows only when there are failures to explain.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(2), Constraint::Length(1)].as_ref())
        .split(inner);
    f.render_widget(Paragraph::new(headline), chunks[0]);

    let rows: Vec<Row> = failures
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.user_id.clone()),
                Cell::from("error"),
                Cell::from(a.failure_detail().unwrap_or("").to_string()),
            ])
        })
        .collect();
    let widths = [Constraint::Length(14), Constraint::Length(8), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["UserID", "Status", "Message"])
                .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD)),
        )
        .column_spacing(1);
    f.render_widget(table, chunks[1]);
    f.render_widget(Paragraph::new("[Enter] Close"), chunks[2]);
}

fn join_names(refs: &[NamedRef]) -> String {
    refs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
}

pub fn render_detail_modal(f: &mut Frame, area: Rect, app: &AppState, record: &DetailRecord) {
    let width = 64u16.min(area.width.saturating_sub(4)).max(40);
    let height = 14u16.min(area.height.saturating_sub(4));
    let rect = centered_rect(width, height, area);

    let u = &record.user;
    let text = format!(
        "Username: {}\nFirst name: {}\nSurname: {}\nDisabled: {}\nCreated: {}\nLast login: {}\n\
User roles: {}\nUser groups: {}\nOrganisation units: {}",
        u.username,
        u.first_name,
        u.surname,
        if u.disabled { "Yes" } else { "No" },
        fmt_date(u.created),
        fmt_last_login(u.last_login),
        join_names(&record.user_roles),
        join_names(&record.user_groups),
        join_names(&record.organisation_units),
    );
    let p = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("User info")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_filter_modal(f: &mut Frame, area: Rect, app: &AppState, selected: usize) {
    let rect = centered_rect(52, 10, area);
    let form = &app.filter_form;
    let date_display = if form.explicit_date.is_empty() {
        "(6 months ago)"
    } else {
        form.explicit_date.as_str()
    };
    let magnitude = if form.magnitude.is_empty() { "-" } else { form.magnitude.as_str() };
    let lines = [
        format!("Period type: {}", form.period.as_str()),
        format!("Number of periods: {magnitude}"),
        format!(
            "Specific date (YYYY-MM-DD): {}",
            if form.period == PeriodType::Date { date_display } else { "n/a" }
        ),
        format!(
            "{} Include disabled users",
            if form.include_disabled { "[x]" } else { "[ ]" }
        ),
        format!(
            "{} Include never logged in",
            if form.include_never_logged_in { "[x]" } else { "[ ]" }
        ),
        "Apply filter".to_string(),
    ];
    let mut text = String::new();
    for (idx, label) in lines.iter().enumerate() {
        if idx == selected {
            text.push_str(&format!("▶ {}\n", label));
        } else {
            text.push_str(&format!("  {}\n", label));
        }
    }
    let p = Paragraph::new(text).block(
        Block::default()
            .title("Filter")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
