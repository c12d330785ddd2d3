use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;

use crate::api::{self, DirectoryClient};
use crate::app::bulk::{self, BulkState};
use crate::app::{AppState, InputMode, ModalState};
use crate::search::apply_search;
use crate::ui;
use crate::view::{SelectAllState, UserTable};

/// Deferred effects produced by key handling. Remote calls happen in the
/// event loop, not inside the (synchronous) key handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    ShowDetail(String),
    RunBulk(Vec<String>),
}

pub async fn run_app<C: DirectoryClient>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    client: &C,
) -> Result<()> {
    let mut app = AppState::new();
    app.chrome = api::negotiate_chrome(client).await;
    refresh(&mut app, client).await;

    loop {
        terminal.draw(|f| ui::render(f, &mut app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match handle_key(&mut app, key.code) {
                Some(Command::Quit) => break,
                Some(Command::Refresh) => refresh(&mut app, client).await,
                Some(Command::ShowDetail(id)) => show_detail(&mut app, client, &id).await,
                Some(Command::RunBulk(ids)) => {
                    execute_bulk(terminal, &mut app, client, &ids).await?;
                    drain_pending_events()?;
                }
                None => {}
            }
        }
    }

    Ok(())
}

/// Route one key press. Pure state transition; any remote work is handed
/// back as a [`Command`].
pub fn handle_key(app: &mut AppState, code: KeyCode) -> Option<Command> {
    if !app.bulk.is_idle() {
        return handle_bulk_key(app, code);
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, code),
        InputMode::Search => {
            handle_search_key(app, code);
            None
        }
        InputMode::Modal => handle_modal_key(app, code),
    }
}

fn handle_normal_key(app: &mut AppState, code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') => return Some(Command::Quit),
        KeyCode::Char('r') => return Some(Command::Refresh),
        KeyCode::Char('/') => {
            app.search_query.clear();
            app.input_mode = InputMode::Search;
        }
        KeyCode::Char('f') => {
            app.modal = Some(ModalState::FilterForm { selected: 0 });
            app.input_mode = InputMode::Modal;
        }
        KeyCode::Char(' ') => app.table.toggle_at_cursor(),
        KeyCode::Char('a') => {
            // select-all mirrors its own state: checked clears, anything
            // else checks every enabled row
            let checked = app.table.select_all_state() == SelectAllState::Checked;
            app.table.set_all(!checked);
        }
        KeyCode::Char('d') => match bulk::begin(app.table.selected_enabled_ids()) {
            Some(state) => {
                app.bulk = state;
                app.status_line = None;
            }
            None => {
                app.status_line = Some("No valid users selected for disabling.".to_string());
            }
        },
        KeyCode::Enter | KeyCode::Char('i') => {
            if let Some(row) = app.table.row_under_cursor() {
                return Some(Command::ShowDetail(row.id.clone()));
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.table.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.table.move_down(),
        KeyCode::PageUp | KeyCode::Left | KeyCode::Char('h') => app.table.page_up(),
        KeyCode::PageDown | KeyCode::Right | KeyCode::Char('l') => app.table.page_down(),
        _ => {}
    }
    None
}

fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            apply_search(&mut app.table, &app.search_query);
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.search_query.clear();
            apply_search(&mut app.table, "");
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => app.search_query.push(c),
        _ => {}
    }
}

fn handle_bulk_key(app: &mut AppState, code: KeyCode) -> Option<Command> {
    match &app.bulk {
        BulkState::Confirming { ids } => match code {
            // the set captured at confirmation entry is used as-is; it is
            // never re-read from the view here
            KeyCode::Enter | KeyCode::Char('y') => Some(Command::RunBulk(ids.clone())),
            KeyCode::Esc | KeyCode::Char('n') => {
                app.bulk = BulkState::Idle;
                None
            }
            _ => None,
        },
        // a running batch cannot be cancelled
        BulkState::Running { .. } => None,
        BulkState::Summarizing { .. } => match code {
            KeyCode::Enter | KeyCode::Esc => {
                app.bulk = BulkState::Idle;
                Some(Command::Refresh)
            }
            _ => None,
        },
        BulkState::Idle => None,
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) -> Option<Command> {
    match &mut app.modal {
        Some(ModalState::FilterForm { selected }) => match code {
            KeyCode::Esc => close_modal(app),
            KeyCode::Up => {
                if *selected > 0 {
                    *selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if *selected < 5 {
                    *selected += 1;
                }
            }
            KeyCode::Enter => match *selected {
                0 => app.filter_form.cycle_period(),
                3 => app.filter_form.include_disabled = !app.filter_form.include_disabled,
                4 => {
                    app.filter_form.include_never_logged_in =
                        !app.filter_form.include_never_logged_in
                }
                5 => {
                    close_modal(app);
                    return Some(Command::Refresh);
                }
                _ => {}
            },
            KeyCode::Char(' ') => match *selected {
                0 => app.filter_form.cycle_period(),
                3 => app.filter_form.include_disabled = !app.filter_form.include_disabled,
                4 => {
                    app.filter_form.include_never_logged_in =
                        !app.filter_form.include_never_logged_in
                }
                _ => {}
            },
            KeyCode::Backspace => match *selected {
                1 => {
                    app.filter_form.magnitude.pop();
                }
                2 => {
                    app.filter_form.explicit_date.pop();
                }
                _ => {}
            },
            KeyCode::Char(c) => match *selected {
                1 => app.filter_form.magnitude.push(c),
                2 => app.filter_form.explicit_date.push(c),
                _ => {}
            },
            _ => {}
        },
        Some(ModalState::Detail { .. }) | Some(ModalState::Info { .. }) => match code {
            KeyCode::Esc | KeyCode::Enter => close_modal(app),
            _ => {}
        },
        None => {
            app.input_mode = InputMode::Normal;
        }
    }
    None
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = InputMode::Normal;
}

/// Refetch the user list for the current filter form and rebuild the
/// table. A fetch failure leaves the current view stale and surfaces the
/// error on the status line; it is never collapsed into an empty list.
pub async fn refresh<C: DirectoryClient + ?Sized>(app: &mut AppState, client: &C) {
    let criteria = app.filter_form.to_criteria(Utc::now());
    match api::load_user_list(client, &criteria).await {
        Ok(users) => {
            app.table = UserTable::new(users);
            if !app.search_query.is_empty() {
                apply_search(&mut app.table, &app.search_query);
            }
            app.status_line = None;
        }
        Err(err) => {
            tracing::error!(error = %err, "user list fetch failed");
            app.status_line = Some(format!("Error fetching users: {err}"));
        }
    }
}

/// Fetch and show one user's extended attributes. A failed fetch becomes
/// a dismissible notice, never a crash.
pub async fn show_detail<C: DirectoryClient + ?Sized>(app: &mut AppState, client: &C, id: &str) {
    match client.fetch_user_detail(id).await {
        Ok(record) => {
            app.modal = Some(ModalState::Detail { record });
            app.input_mode = InputMode::Modal;
        }
        Err(err) => {
            tracing::warn!(user = id, error = %err, "detail fetch failed");
            app.modal = Some(ModalState::Info { message: format!("Error: {err}") });
            app.input_mode = InputMode::Modal;
        }
    }
}

/// Drive the Running state: disable each id sequentially, redrawing the
/// progress surface after every attempt, then land in Summarizing.
async fn execute_bulk<B, C>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    client: &C,
    ids: &[String],
) -> Result<()>
where
    B: ratatui::backend::Backend,
    C: DirectoryClient,
{
    app.bulk = BulkState::Running { done: 0, total: ids.len() };
    terminal.draw(|f| ui::render(f, app))?;

    let report = bulk::run(client, ids, |p| {
        app.bulk = BulkState::Running { done: p.done, total: p.total };
        if let Err(err) = terminal.draw(|f| ui::render(f, app)) {
            tracing::warn!(error = %err, "progress redraw failed");
        }
    })
    .await;

    app.bulk = BulkState::Summarizing { report };
    Ok(())
}

/// Drop key events queued while a batch ran; a buffered Enter must not
/// dismiss the summary before the operator has seen it.
fn drain_pending_events() -> Result<()> {
    while event::poll(Duration::from_millis(0))? {
        event::read()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DetailRecord, ServerVersion, UserRecord};
    use crate::error::{ApiError, ApiResult};
    use crate::filter::FilterCriteria;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;

    fn mk_user(id: &str, disabled: bool) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("user-{id}"),
            first_name: "First".to_string(),
            surname: "Last".to_string(),
            disabled,
            created: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            last_login: None,
        }
    }

    fn mk_app(users: Vec<UserRecord>) -> AppState {
        let mut app = AppState::new();
        app.table = UserTable::new(users);
        app
    }

    #[test]
    fn bulk_with_empty_selection_stays_idle() {
        let mut app = mk_app(vec![mk_user("a", false)]);
        let cmd = handle_key(&mut app, KeyCode::Char('d'));
        assert_eq!(cmd, None);
        assert!(app.bulk.is_idle());
        assert_eq!(
            app.status_line.as_deref(),
            Some("No valid users selected for disabling.")
        );
    }

    #[test]
    fn bulk_captures_selection_at_confirmation() {
        let mut app = mk_app(vec![mk_user("a", false), mk_user("b", false)]);
        app.table.set_all(true);
        handle_key(&mut app, KeyCode::Char('d'));
        assert_eq!(
            app.bulk,
            BulkState::Confirming { ids: vec!["a".to_string(), "b".to_string()] }
        );

        // a view refresh between confirmation entry and confirm must not
        // change what the run operates on
        app.table = UserTable::new(vec![mk_user("c", false)]);
        let cmd = handle_key(&mut app, KeyCode::Enter);
        assert_eq!(
            cmd,
            Some(Command::RunBulk(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn cancel_returns_to_idle_without_command() {
        let mut app = mk_app(vec![mk_user("a", false)]);
        app.table.set_all(true);
        handle_key(&mut app, KeyCode::Char('d'));
        let cmd = handle_key(&mut app, KeyCode::Esc);
        assert_eq!(cmd, None);
        assert!(app.bulk.is_idle());
    }

    #[test]
    fn running_ignores_all_keys() {
        let mut app = mk_app(vec![]);
        app.bulk = BulkState::Running { done: 1, total: 3 };
        for code in [KeyCode::Esc, KeyCode::Enter, KeyCode::Char('q')] {
            assert_eq!(handle_key(&mut app, code), None);
            assert_eq!(app.bulk, BulkState::Running { done: 1, total: 3 });
        }
    }

    #[test]
    fn summary_dismissal_triggers_refetch() {
        let mut app = mk_app(vec![]);
        app.bulk = BulkState::Summarizing { report: Default::default() };
        let cmd = handle_key(&mut app, KeyCode::Enter);
        assert_eq!(cmd, Some(Command::Refresh));
        assert!(app.bulk.is_idle());
    }

    #[test]
    fn detail_requested_for_row_under_cursor() {
        let mut app = mk_app(vec![mk_user("a", false), mk_user("b", false)]);
        app.table.move_down();
        let cmd = handle_key(&mut app, KeyCode::Enter);
        assert_eq!(cmd, Some(Command::ShowDetail("b".to_string())));
    }

    struct StubDirectory;

    #[async_trait]
    impl DirectoryClient for StubDirectory {
        async fn fetch_users(&self, _c: &FilterCriteria) -> ApiResult<Vec<UserRecord>> {
            Ok(Vec::new())
        }

        async fn fetch_never_logged_in(&self, _d: bool) -> ApiResult<Vec<UserRecord>> {
            Ok(Vec::new())
        }

        async fn fetch_user_detail(&self, id: &str) -> ApiResult<DetailRecord> {
            Err(ApiError::NotFound(id.to_string()))
        }

        async fn disable_user(&self, _id: &str) -> ApiResult<()> {
            Ok(())
        }

        async fn fetch_version(&self) -> ApiResult<ServerVersion> {
            Ok(ServerVersion::parse("2.40.0"))
        }
    }

    #[tokio::test]
    async fn bulk_execution_redraws_and_lands_in_summarizing() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = mk_app(vec![mk_user("a", false), mk_user("b", false)]);
        let ids = vec!["a".to_string(), "b".to_string()];

        execute_bulk(&mut terminal, &mut app, &StubDirectory, &ids)
            .await
            .unwrap();

        match &app.bulk {
            BulkState::Summarizing { report } => {
                assert_eq!(report.total(), 2);
                assert_eq!(report.success_count(), 2);
            }
            other => panic!("expected a summary, got {other:?}"),
        }
    }

    #[test]
    fn filter_form_apply_closes_and_refetches() {
        let mut app = mk_app(vec![]);
        handle_key(&mut app, KeyCode::Char('f'));
        assert!(matches!(app.modal, Some(ModalState::FilterForm { selected: 0 })));
        // move to the apply row and hit enter
        for _ in 0..5 {
            handle_key(&mut app, KeyCode::Down);
        }
        let cmd = handle_key(&mut app, KeyCode::Enter);
        assert_eq!(cmd, Some(Command::Refresh));
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }
}
