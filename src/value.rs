//! Scalar values flowing out of the grouped query and into the pivot table.
//!
//! Values carry a small closed set of semantic kinds (date-like, numeric, label)
//! so axis and serialization decisions are predicates over `ValueKind` rather than
//! dtype checks scattered through the chart code.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::{AnyValue, TimeUnit};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    DateLike,
    Numeric,
    Label,
    Missing,
}

impl Scalar {
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Null => ValueKind::Missing,
            Scalar::Date(_) | Scalar::Datetime(_) => ValueKind::DateLike,
            Scalar::Int(_) | Scalar::Float(_) => ValueKind::Numeric,
            Scalar::Bool(_) | Scalar::Str(_) => ValueKind::Label,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(v) => Value::from(*v),
            // NaN/inf have no JSON form
            Scalar::Float(v) => serde_json::Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Scalar::Datetime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::Date(_) | Scalar::Datetime(_) => 3,
            Scalar::Str(_) => 4,
        }
    }

    /// Total order used for axis sorting: nulls first, then by kind, then by value.
    pub fn total_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            (Scalar::Datetime(a), Scalar::Datetime(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Datetime(b)) => a.and_time(chrono::NaiveTime::MIN).cmp(b),
            (Scalar::Datetime(a), Scalar::Date(b)) => a.cmp(&b.and_time(chrono::NaiveTime::MIN)),
            (a, b) if a.rank() == 2 && b.rank() == 2 => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// True when the value is a calendar date or timestamp.
pub fn is_chronological(v: &Scalar) -> bool {
    v.kind() == ValueKind::DateLike
}

/// True when the value is the missing-data sentinel: null, or a float NaN.
pub fn is_missing(v: &Scalar) -> bool {
    match v {
        Scalar::Null => true,
        Scalar::Float(f) => f.is_nan(),
        _ => false,
    }
}

/// True when the value renders as a category label rather than a coordinate.
pub fn is_label(v: &Scalar) -> bool {
    v.kind() == ValueKind::Label
}

pub fn cmp_tuples(a: &[Scalar], b: &[Scalar]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "NaN"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Str(s) => write!(f, "{}", s),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Scalar::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::Str(s.to_string()) }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self { Scalar::Str(s) }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self { Scalar::Int(v) }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self { Scalar::Float(v) }
}

impl From<NaiveDate> for Scalar {
    fn from(d: NaiveDate) -> Self { Scalar::Date(d) }
}

impl From<NaiveDateTime> for Scalar {
    fn from(dt: NaiveDateTime) -> Self { Scalar::Datetime(dt) }
}

fn timestamp_to_naive(v: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(v),
        TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(v),
        TimeUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(v)),
    };
    dt.map(|d| d.naive_utc())
}

impl<'a> From<AnyValue<'a>> for Scalar {
    fn from(av: AnyValue<'a>) -> Self {
        match av {
            AnyValue::Null => Scalar::Null,
            AnyValue::Boolean(b) => Scalar::Bool(b),
            AnyValue::Int8(v) => Scalar::Int(v as i64),
            AnyValue::Int16(v) => Scalar::Int(v as i64),
            AnyValue::Int32(v) => Scalar::Int(v as i64),
            AnyValue::Int64(v) => Scalar::Int(v),
            AnyValue::UInt8(v) => Scalar::Int(v as i64),
            AnyValue::UInt16(v) => Scalar::Int(v as i64),
            AnyValue::UInt32(v) => Scalar::Int(v as i64),
            AnyValue::UInt64(v) => match i64::try_from(v) {
                Ok(i) => Scalar::Int(i),
                Err(_) => Scalar::Float(v as f64),
            },
            AnyValue::Float32(v) => Scalar::Float(v as f64),
            AnyValue::Float64(v) => Scalar::Float(v),
            AnyValue::String(s) => Scalar::Str(s.to_string()),
            AnyValue::StringOwned(s) => Scalar::Str(s.to_string()),
            AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
                .map(Scalar::Date)
                .unwrap_or(Scalar::Null),
            AnyValue::Datetime(v, unit, _) => timestamp_to_naive(v, unit).map(Scalar::Datetime).unwrap_or(Scalar::Null),
            AnyValue::DatetimeOwned(v, unit, _) => timestamp_to_naive(v, unit).map(Scalar::Datetime).unwrap_or(Scalar::Null),
            other => match other.try_extract::<f64>() {
                Ok(f) => Scalar::Float(f),
                Err(_) => Scalar::Str(other.to_string()),
            },
        }
    }
}
