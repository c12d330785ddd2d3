//! Inactivity filter resolution.
//!
//! Converts the operator's filter form (period type, magnitude, explicit
//! date, inclusion toggles) into the query predicate sent to the remote
//! directory: an optional last-login threshold plus two inclusion flags.

use chrono::{DateTime, Months, NaiveDate, SecondsFormat, Utc};

/// How the inactivity threshold is expressed by the operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PeriodType {
    /// An explicit calendar date; without one, fall back to six months ago.
    Date,
    Months,
    Years,
}

impl PeriodType {
    /// Parse an operator-supplied period type. Unknown values yield `None`,
    /// which downstream means "no inactivity filter at all".
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(PeriodType::Date),
            "months" => Some(PeriodType::Months),
            "years" => Some(PeriodType::Years),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Date => "date",
            PeriodType::Months => "months",
            PeriodType::Years => "years",
        }
    }
}

/// Resolve the inactivity threshold from raw form input.
///
/// Returns `None` when no threshold applies: unrecognized period type, or a
/// magnitude that does not parse as a number. Malformed input never panics
/// and never leaks a bogus timestamp into the query string.
pub fn resolve_threshold(
    period_type: &str,
    magnitude: &str,
    explicit_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match PeriodType::parse(period_type)? {
        PeriodType::Date => match explicit_date {
            Some(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            None => now.checked_sub_months(Months::new(6)),
        },
        PeriodType::Months => {
            let n: u32 = magnitude.trim().parse().ok()?;
            now.checked_sub_months(Months::new(n))
        }
        PeriodType::Years => {
            let n: u32 = magnitude.trim().parse().ok()?;
            now.checked_sub_months(Months::new(n.checked_mul(12)?))
        }
    }
}

/// Fully resolved query predicate for a user-list fetch.
///
/// Pure value, recomputed on every filter application; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    pub threshold: Option<DateTime<Utc>>,
    pub include_disabled: bool,
    pub include_never_logged_in: bool,
}

impl FilterCriteria {
    /// `filter=` parameters for the primary query (lastLogin inequality).
    pub fn primary_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if let Some(ts) = self.threshold {
            filters.push(format!(
                "lastLogin:lt:{}",
                ts.to_rfc3339_opts(SecondsFormat::Millis, true)
            ));
        }
        if !self.include_disabled {
            filters.push("disabled:eq:false".to_string());
        }
        filters
    }

    /// `filter=` parameters for the second, never-logged-in query.
    ///
    /// `lastLogin:null` is mutually exclusive with the primary query's
    /// `lastLogin:lt:` predicate, so concatenating the two result sets
    /// cannot produce duplicate rows.
    pub fn never_logged_in_filters(&self) -> Vec<String> {
        let mut filters = vec!["lastLogin:null".to_string()];
        if !self.include_disabled {
            filters.push("disabled:eq:false".to_string());
        }
        filters
    }
}
