//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an RFC 3339 timestamp as a long date, e.g. "February 1, 2026".
///
/// Unparseable input is passed through unchanged.
///
/// Usage in templates: `{{ order.placed_at|long_date }}`
#[askama::filter_fn]
pub fn long_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_long_date(&value.to_string()))
}

fn format_long_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map_or_else(|_| raw.to_string(), |dt| dt.format("%B %-d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date_formats_rfc3339() {
        assert_eq!(format_long_date("2026-02-01T09:30:00Z"), "February 1, 2026");
    }

    #[test]
    fn test_long_date_passes_through_garbage() {
        assert_eq!(format_long_date("yesterday"), "yesterday");
    }
}
