//! Shared helpers for day boundaries and running averages.
//!
//! Both aggregators key their records by the UTC calendar day. Using one
//! clock everywhere keeps a per-city summary and the global summary written in
//! the same round on the same date.

use chrono::{DateTime, NaiveDate, Utc};

/// The current calendar day in UTC.
pub(crate) fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Average a stored running value with one new sample.
///
/// The previous sample count is discarded, so repeated application is not a
/// cumulative mean: `(((a + b) / 2) + c) / 2` weights `c` at one half.
pub(crate) fn pairwise_average(existing: f64, sample: f64) -> f64 {
    (existing + sample) / 2.0
}

/// Convert a provider epoch-seconds timestamp to a UTC datetime.
///
/// Returns `None` for values chrono cannot represent.
pub(crate) fn unix_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}
