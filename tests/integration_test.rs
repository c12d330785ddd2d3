// Integration tests for inactive-user-manager
// Exercises the bulk workflow, list fetching, and chrome negotiation
// against an in-memory directory double.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crossterm::event::KeyCode;

use inactive_user_manager::api::{
    self, DetailRecord, DirectoryClient, HeaderChrome, ServerVersion, UserRecord,
};
use inactive_user_manager::app::bulk::{self, BulkState};
use inactive_user_manager::app::update::{self, Command};
use inactive_user_manager::app::AppState;
use inactive_user_manager::error::{ApiError, ApiResult};
use inactive_user_manager::filter::FilterCriteria;
use inactive_user_manager::view::UserTable;

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn mk_user(id: &str, disabled: bool, last_login: Option<DateTime<Utc>>) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        username: format!("user-{id}"),
        first_name: "First".to_string(),
        surname: "Last".to_string(),
        disabled,
        created: ts(2020, 1, 1),
        last_login,
    }
}

/// In-memory stand-in for the remote directory.
#[derive(Default)]
struct MemoryDirectory {
    users: Vec<UserRecord>,
    fail_list_fetch: bool,
    /// id -> "notfound" | "remote"
    disable_errors: HashMap<String, &'static str>,
    version: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl MemoryDirectory {
    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for MemoryDirectory {
    async fn fetch_users(&self, criteria: &FilterCriteria) -> ApiResult<Vec<UserRecord>> {
        self.log("users");
        if self.fail_list_fetch {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(self
            .users
            .iter()
            .filter(|u| match criteria.threshold {
                Some(t) => u.last_login.is_some_and(|l| l < t),
                None => true,
            })
            .filter(|u| criteria.include_disabled || !u.disabled)
            .cloned()
            .collect())
    }

    async fn fetch_never_logged_in(&self, include_disabled: bool) -> ApiResult<Vec<UserRecord>> {
        self.log("never-logged-in");
        Ok(self
            .users
            .iter()
            .filter(|u| u.last_login.is_none())
            .filter(|u| include_disabled || !u.disabled)
            .cloned()
            .collect())
    }

    async fn fetch_user_detail(&self, id: &str) -> ApiResult<DetailRecord> {
        self.log(format!("detail:{id}"));
        let user = self
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        Ok(DetailRecord {
            user,
            user_roles: Vec::new(),
            user_groups: Vec::new(),
            organisation_units: Vec::new(),
        })
    }

    async fn disable_user(&self, id: &str) -> ApiResult<()> {
        self.log(format!("disable:{id}"));
        match self.disable_errors.get(id) {
            Some(&"notfound") => Err(ApiError::NotFound(id.to_string())),
            Some(_) => Err(ApiError::Remote("rejected".to_string())),
            None => Ok(()),
        }
    }

    async fn fetch_version(&self) -> ApiResult<ServerVersion> {
        self.log("version");
        match self.version {
            Some(v) => Ok(ServerVersion::parse(v)),
            None => Err(ApiError::Transport("timeout".to_string())),
        }
    }
}

// 1) Happy-path bulk run: both selected users disabled, view refetched.
#[tokio::test]
async fn bulk_disable_two_users_succeeds() {
    let old = Some(ts(2022, 1, 1));
    let client = MemoryDirectory {
        users: vec![mk_user("u1", false, old), mk_user("u2", false, old)],
        ..Default::default()
    };

    let mut app = AppState::new();
    update::refresh(&mut app, &client).await;
    assert_eq!(app.table.len(), 2);

    app.table.set_all(true);
    update::handle_key(&mut app, KeyCode::Char('d'));
    let cmd = update::handle_key(&mut app, KeyCode::Enter);
    let Some(Command::RunBulk(ids)) = cmd else {
        panic!("expected a bulk run command, got {cmd:?}")
    };

    let report = bulk::run(&client, &ids, |_| {}).await;
    assert_eq!(report.success_count(), 2);
    assert!(report.failures().is_empty());

    // dismissal of the summary triggers a refetch that clears selection
    app.bulk = BulkState::Summarizing { report };
    let cmd = update::handle_key(&mut app, KeyCode::Enter);
    assert_eq!(cmd, Some(Command::Refresh));
    update::refresh(&mut app, &client).await;
    assert!(app.table.selected_enabled_ids().is_empty());

    let calls = client.calls();
    assert_eq!(
        calls.iter().filter(|c| c.starts_with("disable:")).count(),
        2
    );
}

// 2) A missing record is a per-item failure, not a batch failure.
#[tokio::test]
async fn bulk_disable_records_not_found_as_failure() {
    let client = MemoryDirectory {
        users: vec![mk_user("u1", false, Some(ts(2022, 1, 1)))],
        disable_errors: HashMap::from([("u1".to_string(), "notfound")]),
        ..Default::default()
    };

    let report = bulk::run(&client, &["u1".to_string()], |_| {}).await;
    assert_eq!(report.success_count(), 0);
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].user_id, "u1");
    assert!(failures[0].failure_detail().unwrap().contains("not found"));
}

// 3) Never-logged-in inclusion issues a second query; neither result set
//    contains disabled accounts when they are excluded.
#[tokio::test]
async fn never_logged_in_concatenation_respects_disabled_exclusion() {
    let old = Some(ts(2022, 1, 1));
    let client = MemoryDirectory {
        users: vec![
            mk_user("active-old", false, old),
            mk_user("disabled-old", true, old),
            mk_user("never", false, None),
            mk_user("disabled-never", true, None),
        ],
        ..Default::default()
    };
    let criteria = FilterCriteria {
        threshold: Some(ts(2024, 1, 1)),
        include_disabled: false,
        include_never_logged_in: true,
    };

    let users = api::load_user_list(&client, &criteria).await.unwrap();
    let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["active-old", "never"]);
    assert_eq!(client.calls(), vec!["users".to_string(), "never-logged-in".to_string()]);
}

// 4) A list-fetch failure leaves the current view stale and surfaces the
//    error; it never shows up as an empty table.
#[tokio::test]
async fn fetch_failure_keeps_stale_view() {
    let mut app = AppState::new();
    app.table = UserTable::new(vec![mk_user("u1", false, None)]);

    let client = MemoryDirectory { fail_list_fetch: true, ..Default::default() };
    update::refresh(&mut app, &client).await;

    assert_eq!(app.table.len(), 1);
    assert!(app.status_line.as_deref().unwrap().contains("transport error"));
}

// 5) Chrome negotiation: old minor → legacy, new minor → modern, probe
//    failure → legacy.
#[tokio::test]
async fn chrome_negotiation_follows_server_version() {
    let client = MemoryDirectory { version: Some("2.41.3"), ..Default::default() };
    assert_eq!(api::negotiate_chrome(&client).await, HeaderChrome::Legacy);

    let client = MemoryDirectory { version: Some("2.42.0-SNAPSHOT"), ..Default::default() };
    assert_eq!(api::negotiate_chrome(&client).await, HeaderChrome::Modern);

    let client = MemoryDirectory::default();
    assert_eq!(api::negotiate_chrome(&client).await, HeaderChrome::Legacy);
}

// 6) Detail fetch failures surface as a dismissible notice.
#[tokio::test]
async fn detail_fetch_failure_shows_notice() {
    let client = MemoryDirectory::default();
    let mut app = AppState::new();
    update::show_detail(&mut app, &client, "missing").await;
    match &app.modal {
        Some(inactive_user_manager::app::ModalState::Info { message }) => {
            assert!(message.contains("not found"));
        }
        other => panic!("expected an info modal, got {other:?}"),
    }
}
