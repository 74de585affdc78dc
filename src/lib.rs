pub mod aggregate;
pub mod chart;
pub mod config;
pub mod error;
pub mod millis;
pub mod normalize;
pub mod query;
pub mod request;
pub mod reshape;
pub mod source;
pub mod value;

pub use aggregate::{AggFunc, CellAggregation};
pub use chart::{get_axes, get_chart, get_series, Chart};
pub use config::{DuplicatePolicy, PivotOptions, PointMode};
pub use error::{PivotError, PivotResult};
pub use normalize::{AxisSpec, ValueItem, ValueSpec};
pub use query::{pivot_data, GroupedQuery};
pub use request::PivotRequest;
pub use reshape::{pivot_table, pivot_table_from_select, pivot_table_with, PivotTable};
pub use source::{Connection, Executor, SourceQuery};
pub use value::Scalar;

// Test-only printing helper: expands to tprintln! during tests and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
