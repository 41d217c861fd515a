use crate::error::DutyError;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Analyse une date `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DutyError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| DutyError::DateFormatInvalid(raw.to_string()))
}

/// Jours calendaires de `[start, end]` inclus.
pub(super) fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}
