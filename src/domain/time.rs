//! Time helpers shared by the ledger, the gate and the runtime.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Convert configured seconds into a `Duration`, saturating at `u32::MAX`.
#[must_use]
pub fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::from(u32::try_from(secs).unwrap_or(u32::MAX)))
}

/// UTC calendar day of an instant.
#[must_use]
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}
