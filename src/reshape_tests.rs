use super::*;
use crate::config::DuplicatePolicy;
use crate::source::Connection;
use polars::prelude::{col, lit, DataFrame, NamedFrom, Series};

fn s(v: &str) -> Scalar { Scalar::from(v) }

fn opts() -> PivotOptions { PivotOptions::default() }

#[test]
fn empty_rows_are_absent_not_empty() {
    let t = pivot_table(&[], "yearmonth", "gender", "price", &opts()).unwrap();
    assert!(t.is_none());
}

#[test]
fn single_value_with_column_key() {
    let rows = vec![
        vec![s("201001"), s("female"), Scalar::Float(10.0)],
        vec![s("201001"), s("male"), Scalar::Float(15.0)],
    ];
    let t = pivot_table(&rows, "yearmonth", "gender", "price", &opts()).unwrap().unwrap();
    assert_eq!(t.index(), &[vec![s("201001")]]);
    let labels: Vec<String> = t.columns().iter().map(|c| c.label(" / ")).collect();
    assert_eq!(labels, vec!["female", "male"]);
    assert_eq!(t.get("price", &[s("male")], &[s("201001")]), Some(&Scalar::Float(15.0)));
    assert_eq!(t.get("price", &[s("female")], &[s("201001")]), Some(&Scalar::Float(10.0)));
    assert_eq!(t.width(), 2);
    assert!(!t.has_chronological_index());
}

#[test]
fn multiple_values_fold_into_column_axis() {
    let rows = vec![
        vec![s("201001"), s("female"), Scalar::Int(1), Scalar::Float(10.0)],
        vec![s("201001"), s("male"), Scalar::Int(2), Scalar::Float(15.0)],
    ];
    let t = pivot_table(&rows, "yearmonth", "gender", vec![("count", "price"), ("sum", "price")], &opts())
        .unwrap()
        .unwrap();
    let labels: Vec<String> = t.columns().iter().map(|c| c.label(" / ")).collect();
    assert_eq!(labels, vec!["price_count / female", "price_count / male", "price_sum / female", "price_sum / male"]);
    assert_eq!(t.columns()[0].leading(), "price_count");
    assert!(t.columns()[0].is_composite());
    assert_eq!(t.get("price_count", &[s("male")], &[s("201001")]), Some(&Scalar::Int(2)));
    assert_eq!(t.get("price_sum", &[s("female")], &[s("201001")]), Some(&Scalar::Float(10.0)));
}

#[test]
fn missing_combinations_are_empty_cells() {
    let rows = vec![
        vec![s("man"), s("BA"), Scalar::Int(1)],
        vec![s("man"), s("KE"), Scalar::Int(1)],
        vec![s("woman"), s("BA"), Scalar::Int(1)],
    ];
    let t = pivot_table(&rows, "gender", "town", "price", &opts()).unwrap().unwrap();
    let ke: Vec<Option<&Scalar>> = t.column_values(1).map(|(_, v)| v).collect();
    assert_eq!(ke, vec![Some(&Scalar::Int(1)), None]);
}

#[test]
fn axes_are_sorted_by_key() {
    let rows = vec![
        vec![s("b"), s("y"), Scalar::Int(1)],
        vec![s("a"), s("z"), Scalar::Int(2)],
        vec![s("a"), s("x"), Scalar::Int(3)],
    ];
    let t = pivot_table(&rows, "r", "c", "v", &opts()).unwrap().unwrap();
    assert_eq!(t.index(), &[vec![s("a")], vec![s("b")]]);
    let labels: Vec<String> = t.columns().iter().map(|c| c.label(" / ")).collect();
    assert_eq!(labels, vec!["x", "y", "z"]);
}

#[test]
fn duplicate_cells_are_rejected_by_default() {
    let rows = vec![
        vec![s("201001"), s("male"), Scalar::Float(10.0)],
        vec![s("201001"), s("male"), Scalar::Float(5.0)],
    ];
    let err = pivot_table(&rows, "yearmonth", "gender", "price", &opts()).unwrap_err();
    assert!(matches!(err, PivotError::DuplicateCell { ref row, ref column } if row == "201001" && column == "male"));
}

#[test]
fn duplicate_cells_can_be_averaged() {
    let rows = vec![
        vec![s("201001"), s("male"), Scalar::Float(10.0)],
        vec![s("201001"), s("male"), Scalar::Float(5.0)],
        vec![s("201001"), s("female"), Scalar::Float(10.0)],
    ];
    let o = PivotOptions { duplicates: DuplicatePolicy::Mean, ..PivotOptions::default() };
    let t = pivot_table(&rows, "yearmonth", "gender", "price", &o).unwrap().unwrap();
    assert_eq!(t.get("price", &[s("male")], &[s("201001")]), Some(&Scalar::Float(7.5)));
    assert_eq!(t.get("price", &[s("female")], &[s("201001")]), Some(&Scalar::Float(10.0)));
}

#[test]
fn row_width_must_match_schema() {
    let rows = vec![vec![s("201001"), Scalar::Float(10.0)]];
    let err = pivot_table(&rows, "yearmonth", "gender", "price", &opts()).unwrap_err();
    assert!(matches!(err, PivotError::RowShape { expected: 3, found: 2 }));
}

#[test]
fn chronological_index_detected() {
    let d1 = chrono::NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    let d2 = chrono::NaiveDate::from_ymd_opt(2010, 2, 1).unwrap();
    let rows = vec![
        vec![Scalar::Date(d2), s("man"), Scalar::Float(1.0)],
        vec![Scalar::Date(d1), s("man"), Scalar::Float(1.0)],
    ];
    let t = pivot_table(&rows, "month", "gender", "price", &opts()).unwrap().unwrap();
    assert!(t.has_chronological_index());
    assert_eq!(t.index()[0], vec![Scalar::Date(d1)]);
}

#[test]
fn from_select_end_to_end() {
    let conn = Connection::new();
    conn.register("sales", DataFrame::new(vec![
        Series::new("yearmonth".into(), ["201001", "201001", "201001"]).into(),
        Series::new("gender".into(), ["male", "male", "female"]).into(),
        Series::new("town".into(), ["BA", "KE", "BA"]).into(),
        Series::new("price".into(), [10.0f64, 5.0, 10.0]).into(),
    ]).unwrap());
    let q = conn.table("sales").unwrap();
    let t = pivot_table_from_select(&q, "yearmonth", ["town", "gender"], ("len", "price"), &opts()).unwrap().unwrap();
    let ym = [s("201001")];
    assert_eq!(t.get("price", &[s("BA"), s("female")], &ym), Some(&Scalar::Int(1)));
    assert_eq!(t.get("price", &[s("BA"), s("male")], &ym), Some(&Scalar::Int(1)));
    assert_eq!(t.get("price", &[s("KE"), s("male")], &ym), Some(&Scalar::Int(1)));
    assert_eq!(t.get("price", &[s("KE"), s("female")], &ym), None);

    let empty = conn.table("sales").unwrap().filter(col("price").lt(lit(0.0)));
    assert!(pivot_table_from_select(&empty, "yearmonth", "gender", "price", &opts()).unwrap().is_none());
}

#[test]
fn display_renders_grid() {
    let rows = vec![
        vec![s("201001"), s("female"), Scalar::Int(10)],
        vec![s("201001"), s("male"), Scalar::Int(15)],
    ];
    let t = pivot_table(&rows, "yearmonth", "gender", "price", &opts()).unwrap().unwrap();
    assert_eq!(t.to_string(), "yearmonth  female  male\n201001         10    15");
}

fn purchases() -> Vec<AggregatedRow> {
    vec![
        vec![s("201001"), s("male"), Scalar::Float(10.0)],
        vec![s("201001"), s("male"), Scalar::Float(5.0)],
        vec![s("201001"), s("female"), Scalar::Float(10.0)],
    ]
}

#[test]
fn rows_reaggregate_with_one_function() {
    let t = pivot_table_with(&purchases(), "yearmonth", "gender", "price", "len", &opts()).unwrap().unwrap();
    let ym = [s("201001")];
    assert_eq!(t.get("price", &[s("male")], &ym), Some(&Scalar::Int(2)));
    assert_eq!(t.get("price", &[s("female")], &ym), Some(&Scalar::Int(1)));
}

#[test]
fn rows_reaggregate_per_value() {
    let ym = [s("201001")];
    let t = pivot_table_with(&purchases(), "yearmonth", "gender", "price", [("price", "len")], &opts()).unwrap().unwrap();
    assert_eq!(t.get("price", &[s("male")], &ym), Some(&Scalar::Int(2)));
    assert_eq!(t.get("price", &[s("female")], &ym), Some(&Scalar::Int(1)));

    let t = pivot_table_with(&purchases(), "yearmonth", "gender", "price", [("price", "mean")], &opts()).unwrap().unwrap();
    assert_eq!(t.get("price", &[s("male")], &ym), Some(&Scalar::Float(7.5)));
    assert_eq!(t.get("price", &[s("female")], &ym), Some(&Scalar::Float(10.0)));

    for (func, male) in [("sum", Scalar::Float(15.0)), ("min", Scalar::Float(5.0)), ("max", Scalar::Float(10.0))] {
        let t = pivot_table_with(&purchases(), "yearmonth", "gender", "price", func, &opts()).unwrap().unwrap();
        assert_eq!(t.get("price", &[s("male")], &ym), Some(&male), "{func}");
    }
}

#[test]
fn value_without_function_keeps_duplicate_policy() {
    let rows = vec![
        vec![s("201001"), s("male"), Scalar::Float(10.0), Scalar::Int(1)],
        vec![s("201001"), s("male"), Scalar::Float(5.0), Scalar::Int(2)],
    ];
    let err = pivot_table_with(&rows, "yearmonth", "gender", vec!["price", "customer_id"], [("price", "sum")], &opts())
        .unwrap_err();
    assert!(matches!(err, PivotError::DuplicateCell { ref column, .. } if column == "customer_id / male"));

    let err = pivot_table_with(&rows, "yearmonth", "gender", vec!["price", "customer_id"], [("cost", "sum")], &opts())
        .unwrap_err();
    assert_eq!(err.code_str(), "bad_input");
}

#[test]
fn no_values_is_a_table_without_columns() {
    let rows = vec![vec![s("201001"), s("male")], vec![s("201002"), s("female")]];
    let t = pivot_table(&rows, "yearmonth", "gender", ValueSpec::default(), &opts()).unwrap();
    let t = t.expect("rows exist, so the table is present");
    assert_eq!(t.width(), 0);
    assert_eq!(t.height(), 2);
    assert!(pivot_table(&[], "yearmonth", "gender", ValueSpec::default(), &opts()).unwrap().is_none());
}
