//! Tabular view model for the fetched user set.
//!
//! Owns the rows and the selection state explicitly: selection is an
//! in-memory id set updated on toggle events, never reconstructed from
//! rendered output. A `UserTable` is rebuilt wholesale on every fetch,
//! which discards the previous selection; callers that need the selection
//! across a refetch must capture it first.

use std::collections::HashSet;

use crate::api::UserRecord;

/// Aggregate state of the select-all control.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectAllState {
    /// No enabled row is checked.
    Unchecked,
    /// Some but not all enabled rows are checked.
    Indeterminate,
    /// Every enabled row is checked.
    Checked,
}

pub struct UserTable {
    rows: Vec<UserRecord>,
    /// Indices into `rows` that pass the current search query.
    visible: Vec<usize>,
    /// Selected ids. Invariant: only ids of rows with `disabled == false`.
    selected: HashSet<String>,
    /// Cursor position within `visible`.
    pub cursor: usize,
    pub rows_per_page: usize,
}

impl UserTable {
    /// Build a fresh table from a fetched record set. Selection starts
    /// empty; all rows are visible.
    pub fn new(rows: Vec<UserRecord>) -> Self {
        let visible = (0..rows.len()).collect();
        Self {
            rows,
            visible,
            selected: HashSet::new(),
            cursor: 0,
            rows_per_page: 10,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Row at a position within the visible (searched) set.
    pub fn visible_row(&self, pos: usize) -> Option<&UserRecord> {
        self.visible.get(pos).and_then(|&i| self.rows.get(i))
    }

    pub fn row_under_cursor(&self) -> Option<&UserRecord> {
        self.visible_row(self.cursor)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Toggle the checkbox of the row under the cursor. Disabled accounts
    /// are not selectable, so the toggle is a no-op for them.
    pub fn toggle_at_cursor(&mut self) {
        let Some(row) = self.row_under_cursor() else { return };
        if row.disabled {
            return;
        }
        let id = row.id.clone();
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Check or clear every enabled row, across the whole set rather than
    /// just the rows visible under the current search.
    pub fn set_all(&mut self, checked: bool) {
        if checked {
            self.selected = self
                .rows
                .iter()
                .filter(|r| !r.disabled)
                .map(|r| r.id.clone())
                .collect();
        } else {
            self.selected.clear();
        }
    }

    /// Ids of rows that are checked and not disabled, in row order.
    ///
    /// This is the read the bulk workflow captures on entry to its
    /// confirmation step; it never contains a disabled record's id.
    pub fn selected_enabled_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !r.disabled && self.selected.contains(&r.id))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Tri-state for the select-all control.
    pub fn select_all_state(&self) -> SelectAllState {
        let enabled = self.rows.iter().filter(|r| !r.disabled).count();
        let selected = self.selected_enabled_ids().len();
        if selected == 0 {
            SelectAllState::Unchecked
        } else if selected == enabled {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }

    /// Recompute the visible set for a search query. Selection is kept:
    /// searching narrows the rendering, not the underlying row set.
    pub fn apply_search<F>(&mut self, matches: F)
    where
        F: Fn(&UserRecord) -> bool,
    {
        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches(r))
            .map(|(i, _)| i)
            .collect();
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn page_up(&mut self) {
        let step = self.rows_per_page.max(1);
        self.cursor = self.cursor.saturating_sub(step);
    }

    pub fn page_down(&mut self) {
        let step = self.rows_per_page.max(1);
        self.cursor = (self.cursor + step).min(self.visible.len().saturating_sub(1));
    }
}
