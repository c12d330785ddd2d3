pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::bulk::BulkState;
use crate::app::{AppState, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    components::render_header(f, root[0], app);
    users::render_users_table(f, root[1], app);
    components::render_status_bar(f, root[2], app);

    // The bulk workflow owns the modal surface while it is active; other
    // modals only show when the workflow is idle.
    let area = f.area();
    match app.bulk.clone() {
        BulkState::Confirming { ids } => {
            users::render_confirm_modal(f, area, app, ids.len());
        }
        BulkState::Running { done, total } => {
            users::render_progress_modal(f, area, app, done, total);
        }
        BulkState::Summarizing { report } => {
            users::render_summary_modal(f, area, app, &report);
        }
        BulkState::Idle => {
            if let Some(state) = app.modal.clone() {
                match state {
                    ModalState::FilterForm { selected } => {
                        users::render_filter_modal(f, area, app, selected);
                    }
                    ModalState::Detail { record } => {
                        users::render_detail_modal(f, area, app, &record);
                    }
                    ModalState::Info { .. } => {
                        components::render_info_modal(f, area, app, &state);
                    }
                }
            }
        }
    }
}
