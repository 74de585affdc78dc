use polars::prelude::*;
use pivots::Connection;

/// Route `pivots::*` debug output through RUST_LOG when set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Customer purchases across two months, two towns and both genders.
pub fn sales_connection() -> Connection {
    init_tracing();
    let df = DataFrame::new(vec![
        Series::new("customer_id".into(), [1i64, 2, 3, 4, 5, 6]).into(),
        Series::new("yearmonth".into(), ["201001", "201001", "201001", "201002", "201002", "201002"]).into(),
        Series::new("gender".into(), ["male", "male", "female", "female", "male", "female"]).into(),
        Series::new("town".into(), ["BA", "KE", "BA", "KE", "KE", "KE"]).into(),
        Series::new("price".into(), [10.0f64, 5.0, 10.0, 20.0, 1.5, 3.0]).into(),
    ]).expect("sales frame");
    let conn = Connection::new();
    conn.register("sales", df);
    conn
}
