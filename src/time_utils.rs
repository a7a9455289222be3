// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Shared helpers for date/time formatting and checks.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// True if `date` is strictly after today (UTC).
///
/// Used for license/insurance expiry validation: an expiry dated today is
/// already expired for scheduling purposes.
pub fn is_future_date(date: NaiveDate) -> bool {
    date > Utc::now().date_naive()
}
