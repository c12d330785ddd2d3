use crate::api::UserRecord;
use crate::view::UserTable;

/// Narrow the visible rows to those matching `query` (case-insensitive,
/// across username, first name, surname, and id). An empty query restores
/// the full set.
pub fn apply_search(table: &mut UserTable, query: &str) {
    let q = query.to_lowercase();
    if q.is_empty() {
        table.apply_search(|_| true);
    } else {
        table.apply_search(move |u| row_matches(u, &q));
    }
}

fn row_matches(u: &UserRecord, q: &str) -> bool {
    u.username.to_lowercase().contains(q)
        || u.first_name.to_lowercase().contains(q)
        || u.surname.to_lowercase().contains(q)
        || u.id.to_lowercase().contains(q)
}
