//! Epoch-millisecond conversion for chronological axis values.
//! Naive dates and timestamps are read as UTC; a date maps to its midnight.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::value::Scalar;

pub fn datetime_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

pub fn date_millis(d: &NaiveDate) -> i64 {
    datetime_millis(&d.and_time(NaiveTime::MIN))
}

/// Milliseconds since the Unix epoch, or None for non-chronological values.
pub fn unix_time_millis(v: &Scalar) -> Option<i64> {
    match v {
        Scalar::Date(d) => Some(date_millis(d)),
        Scalar::Datetime(dt) => Some(datetime_millis(dt)),
        _ => None,
    }
}
