//! Application state types and entry glue.
//!
//! Defines the enums and structs that model the TUI state, the filter
//! form, and the theme, and re-exports the event loop entry (`run`).

pub mod bulk;
pub mod update;

use chrono::{DateTime, NaiveDate, Utc};
use ratatui::style::Color;
use std::time::Instant;

use crate::api::{DetailRecord, HeaderChrome};
use crate::app::bulk::BulkState;
use crate::filter::{self, FilterCriteria, PeriodType};
use crate::view::UserTable;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub danger: Color,
}

impl Theme {
    /// Catppuccin Mocha defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            danger: Color::Rgb(0xf3, 0x8b, 0xa8),
        }
    }

    /// Load theme overrides from a simple key=value file. Missing file or
    /// unknown keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if let Some(color) = Self::parse_color(val) {
                match key {
                    "text" => theme.text = color,
                    "title" => theme.title = color,
                    "border" => theme.border = color,
                    "header_bg" => theme.header_bg = color,
                    "header_fg" => theme.header_fg = color,
                    "status_bg" => theme.status_bg = color,
                    "status_fg" => theme.status_fg = color,
                    "highlight_fg" => theme.highlight_fg = color,
                    "highlight_bg" => theme.highlight_bg = color,
                    "danger" => theme.danger = color,
                    _ => {}
                }
            }
        }
        Some(theme)
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        None
    }

    pub fn load(path: &str) -> Self {
        Self::from_file(path).unwrap_or_else(Self::mocha)
    }
}

/// Modal dialog states outside the bulk workflow (which carries its own
/// surface state in [`BulkState`]).
#[derive(Clone, Debug)]
pub enum ModalState {
    /// Inactivity filter form; `selected` is the focused field index.
    FilterForm { selected: usize },
    Detail { record: DetailRecord },
    Info { message: String },
}

/// Operator inputs for the inactivity filter, as typed. Resolved into a
/// [`FilterCriteria`] on every apply; nothing here is persisted.
#[derive(Clone, Debug)]
pub struct FilterForm {
    pub period: PeriodType,
    pub magnitude: String,
    /// Explicit date, `YYYY-MM-DD`, only meaningful for `PeriodType::Date`.
    pub explicit_date: String,
    pub include_disabled: bool,
    pub include_never_logged_in: bool,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            period: PeriodType::Months,
            magnitude: "6".to_string(),
            explicit_date: String::new(),
            include_disabled: false,
            include_never_logged_in: false,
        }
    }
}

impl FilterForm {
    pub fn cycle_period(&mut self) {
        self.period = match self.period {
            PeriodType::Date => PeriodType::Months,
            PeriodType::Months => PeriodType::Years,
            PeriodType::Years => PeriodType::Date,
        };
    }

    pub fn to_criteria(&self, now: DateTime<Utc>) -> FilterCriteria {
        let explicit = NaiveDate::parse_from_str(self.explicit_date.trim(), "%Y-%m-%d").ok();
        FilterCriteria {
            threshold: filter::resolve_threshold(
                self.period.as_str(),
                &self.magnitude,
                explicit,
                now,
            ),
            include_disabled: self.include_disabled,
            include_never_logged_in: self.include_never_logged_in,
        }
    }
}

pub struct AppState {
    pub started_at: Instant,
    pub table: UserTable,
    pub filter_form: FilterForm,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub modal: Option<ModalState>,
    pub bulk: BulkState,
    pub chrome: HeaderChrome,
    /// Transient operator notice (fetch failures, empty-selection hints).
    pub status_line: Option<String>,
}

impl AppState {
    /// Fresh state with an empty table; the first fetch fills it.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            table: UserTable::new(Vec::new()),
            filter_form: FilterForm::default(),
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme: Theme::load("theme.conf"),
            modal: None,
            bulk: BulkState::Idle,
            chrome: HeaderChrome::Legacy,
            status_line: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
