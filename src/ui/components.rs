//! Shared UI components (header, status bar, modal helpers).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::api::HeaderChrome;
use crate::app::{AppState, InputMode, ModalState};
use crate::view::SelectAllState;

/// Render the top header bar. The chrome variant comes from the server
/// version probe: older servers get the boxed legacy bar, newer ones a
/// slim single line.
pub fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let select_all = match app.table.select_all_state() {
        SelectAllState::Unchecked => "[ ]",
        SelectAllState::Indeterminate => "[~]",
        SelectAllState::Checked => "[x]",
    };
    let prompt = match app.input_mode {
        InputMode::Search => format!("  search: {}", app.search_query),
        _ => String::new(),
    };
    let line = format!(
        "all:{select_all}{prompt}  |  Space: select; a: select all; d: disable selected; \
Enter: info; f: filter; /: search; r: refresh; q: quit"
    );

    let p = match app.chrome {
        HeaderChrome::Legacy => Paragraph::new(line)
            .block(
                Block::default()
                    .title("Inactive Users")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            )
            .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg)),
        HeaderChrome::Modern => Paragraph::new(format!("Inactive Users  {line}"))
            .style(Style::default().fg(app.theme.header_fg)),
    };
    f.render_widget(p, area);
}

/// Render the bottom status bar with mode, counts, filter summary, and any
/// pending operator notice.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let form = &app.filter_form;
    let threshold = match form.period {
        crate::filter::PeriodType::Date if form.explicit_date.is_empty() => {
            "before 6 months ago".to_string()
        }
        crate::filter::PeriodType::Date => format!("before {}", form.explicit_date),
        p => format!("{} {} ago", form.magnitude, p.as_str()),
    };
    let mut chips = vec![threshold];
    if form.include_disabled {
        chips.push("disabled".to_string());
    }
    if form.include_never_logged_in {
        chips.push("never-logged-in".to_string());
    }
    let notice = app
        .status_line
        .as_deref()
        .map(|s| format!("  {s}"))
        .unwrap_or_default();
    let msg = format!(
        "mode: {mode}  users:{}  selected:{}  filter:[{}]{notice}",
        app.table.len(),
        app.table.selected_enabled_ids().len(),
        chips.join(","),
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 44u16.min(max_w);
        let approx_lines = (message.len() as u16 / min_w.saturating_sub(4).max(10)).max(1);
        let height = (approx_lines + 4).min(area.height.saturating_sub(6).max(5)).max(5);
        let rect = centered_rect(min_w, height, area);
        let p = Paragraph::new(message.clone()).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Info")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
