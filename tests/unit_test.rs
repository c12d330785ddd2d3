// Unit tests for inactive-user-manager
// These tests work with the public API without modifying the main codebase

use chrono::{TimeZone, Utc};
use inactive_user_manager::api::{ServerVersion, UserRecord};
use inactive_user_manager::filter::{resolve_threshold, FilterCriteria, PeriodType};
use inactive_user_manager::view::{SelectAllState, UserTable};

fn mk_user(id: &str, disabled: bool) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        username: format!("user-{id}"),
        first_name: "Test".to_string(),
        surname: "User".to_string(),
        disabled,
        created: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
        last_login: None,
    }
}

#[test]
fn period_type_parse_accepts_known_values_only() {
    assert_eq!(PeriodType::parse("months"), Some(PeriodType::Months));
    assert_eq!(PeriodType::parse("years"), Some(PeriodType::Years));
    assert_eq!(PeriodType::parse("date"), Some(PeriodType::Date));
    assert_eq!(PeriodType::parse("fortnights"), None);
}

#[test]
fn threshold_resolution_is_total_over_bad_input() {
    let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
    // malformed magnitude must not produce a bogus timestamp
    assert_eq!(resolve_threshold("months", "3x", None, now), None);
    assert_eq!(resolve_threshold("months", "", None, now), None);
    // and a valid one resolves exactly
    assert_eq!(
        resolve_threshold("months", "3", None, now),
        Some(Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap())
    );
}

#[test]
fn query_filters_match_wire_format() {
    let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
    let c = FilterCriteria {
        threshold: Some(now),
        include_disabled: false,
        include_never_logged_in: true,
    };
    assert_eq!(
        c.primary_filters(),
        vec![
            "lastLogin:lt:2024-07-15T12:00:00.000Z".to_string(),
            "disabled:eq:false".to_string(),
        ]
    );
    assert_eq!(c.never_logged_in_filters()[0], "lastLogin:null");
}

#[test]
fn selection_never_contains_disabled_ids() {
    let mut table = UserTable::new(vec![
        mk_user("a", false),
        mk_user("b", true),
        mk_user("c", false),
    ]);
    table.set_all(true);
    let ids = table.selected_enabled_ids();
    assert!(!ids.contains(&"b".to_string()));
    assert_eq!(ids.len(), 2);
}

#[test]
fn select_all_tristate_walkthrough() {
    let mut table = UserTable::new(vec![mk_user("a", false), mk_user("b", false)]);
    assert_eq!(table.select_all_state(), SelectAllState::Unchecked);
    table.toggle_at_cursor();
    assert_eq!(table.select_all_state(), SelectAllState::Indeterminate);
    table.set_all(true);
    assert_eq!(table.select_all_state(), SelectAllState::Checked);
}

#[test]
fn server_version_parsing() {
    let v = ServerVersion::parse("2.39.2.1");
    assert_eq!((v.major, v.minor, v.patch), (2, 39, 2));
    assert!(!v.snapshot);
    let v = ServerVersion::parse("2.43-SNAPSHOT");
    assert!(v.snapshot);
    assert_eq!(v.minor, 43);
}
