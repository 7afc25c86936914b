//! Tenure derivation over an applicant's work-history entries.

use chrono::NaiveDate;
use tracing::warn;

use crate::models::profile::ProfileExperience;

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Fixed divisor; no leap-year correction.
const DAYS_PER_YEAR: f64 = 365.0;

/// Total years of tenure across all entries, rounded to 2 decimal places.
///
/// Each entry contributes its start→end day count. Entries with a missing or
/// unparseable date are logged and contribute zero days, as do spans whose
/// end precedes their start; the total is therefore never negative and never
/// decreases as valid entries are added.
pub fn total_years(entries: &[ProfileExperience]) -> f64 {
    let mut total_days: i64 = 0;
    for entry in entries {
        match span_days(entry) {
            Some(days) => total_days += days,
            None => warn!(
                "Skipping experience entry with unusable dates (company: {:?}, start: {:?}, end: {:?})",
                entry.company, entry.start, entry.end
            ),
        }
    }
    (total_days as f64 / DAYS_PER_YEAR * 100.0).round() / 100.0
}

fn span_days(entry: &ProfileExperience) -> Option<i64> {
    let start = parse_date(entry.start.as_deref()?)?;
    let end = parse_date(entry.end.as_deref()?)?;
    let days = (end - start).num_days();
    if days < 0 {
        return None;
    }
    Some(days)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
