//! Aggregate symbol table: aggregation names to polars aggregate expressions, and the
//! same functions over materialized cell values for re-aggregating caller rows.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PivotError, PivotResult};
use crate::normalize::resolve_aggregation_token;
use crate::value::{is_missing, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc { Sum, Count, Avg, Min, Max, First, Last, Median, Stddev, Variance, CountDistinct }

impl AggFunc {
    /// Look an aggregation name up in the symbol table (case-insensitive).
    pub fn lookup(name: &str) -> PivotResult<AggFunc> {
        let f = match name.trim().to_ascii_lowercase().as_str() {
            "sum" => AggFunc::Sum,
            "count" => AggFunc::Count,
            "avg" | "mean" => AggFunc::Avg,
            "min" => AggFunc::Min,
            "max" => AggFunc::Max,
            "first" => AggFunc::First,
            "last" => AggFunc::Last,
            "median" => AggFunc::Median,
            "stddev" | "stdev" | "std" => AggFunc::Stddev,
            "variance" | "var" => AggFunc::Variance,
            "count_distinct" | "nunique" => AggFunc::CountDistinct,
            _ => return Err(PivotError::unknown_aggregate(name)),
        };
        Ok(f)
    }

    /// Counting aggregates keep an integer result regardless of the input dtype.
    pub fn is_counting(&self) -> bool {
        matches!(self, AggFunc::Count | AggFunc::CountDistinct)
    }

    /// Wrap a column reference in this aggregate.
    pub fn apply(&self, base: Expr) -> Expr {
        match self {
            AggFunc::Sum => base.sum(),
            AggFunc::Count => base.count().cast(DataType::Int64),
            AggFunc::Avg => base.mean(),
            AggFunc::Min => base.min(),
            AggFunc::Max => base.max(),
            AggFunc::First => base.first(),
            AggFunc::Last => base.last(),
            AggFunc::Median => base.median(),
            AggFunc::Stddev => base.std(1),
            AggFunc::Variance => base.var(1),
            AggFunc::CountDistinct => base.n_unique().cast(DataType::Int64),
        }
    }

    /// Reduce the values of one cell. Missing values are skipped; a reduction with
    /// no input yields `Scalar::Null`, except the counts which yield zero.
    pub fn reduce(&self, values: &[Scalar]) -> Scalar {
        let present: Vec<&Scalar> = values.iter().filter(|v| !is_missing(v)).collect();
        match self {
            AggFunc::Count => Scalar::Int(present.len() as i64),
            AggFunc::CountDistinct => {
                let mut distinct = present;
                distinct.sort_by(|a, b| a.total_cmp(b));
                distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());
                Scalar::Int(distinct.len() as i64)
            }
            AggFunc::First => present.first().map(|v| (*v).clone()).unwrap_or(Scalar::Null),
            AggFunc::Last => present.last().map(|v| (*v).clone()).unwrap_or(Scalar::Null),
            AggFunc::Min => present.iter().min_by(|a, b| a.total_cmp(b)).map(|v| (*v).clone()).unwrap_or(Scalar::Null),
            AggFunc::Max => present.iter().max_by(|a, b| a.total_cmp(b)).map(|v| (*v).clone()).unwrap_or(Scalar::Null),
            AggFunc::Sum => {
                if present.iter().all(|v| matches!(v, Scalar::Int(_))) {
                    let total = present.iter().fold(0i64, |acc, v| match v {
                        Scalar::Int(i) => acc.saturating_add(*i),
                        _ => acc,
                    });
                    Scalar::Int(total)
                } else {
                    Scalar::Float(numbers(&present).iter().sum())
                }
            }
            AggFunc::Avg => {
                let xs = numbers(&present);
                if xs.is_empty() { Scalar::Null } else { Scalar::Float(xs.iter().sum::<f64>() / xs.len() as f64) }
            }
            AggFunc::Median => {
                let mut xs = numbers(&present);
                if xs.is_empty() {
                    return Scalar::Null;
                }
                xs.sort_by(|a, b| a.total_cmp(b));
                let mid = xs.len() / 2;
                let m = if xs.len() % 2 == 0 { (xs[mid - 1] + xs[mid]) / 2.0 } else { xs[mid] };
                Scalar::Float(m)
            }
            AggFunc::Variance | AggFunc::Stddev => {
                let xs = numbers(&present);
                if xs.len() < 2 {
                    return Scalar::Null;
                }
                let n = xs.len() as f64;
                let mean = xs.iter().sum::<f64>() / n;
                // sample variance (ddof = 1), as the grouped query computes it
                let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
                Scalar::Float(if *self == AggFunc::Stddev { var.sqrt() } else { var })
            }
        }
    }
}

fn numbers(values: &[&Scalar]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_f64()).collect()
}

/// Re-aggregation applied to every cell of caller-supplied rows: one function for all
/// value columns, or a function per value name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellAggregation {
    Uniform(String),
    PerValue(HashMap<String, String>),
}

impl CellAggregation {
    /// One entry per value name; `None` where the per-value map has no function.
    pub fn resolve(&self, values: &[String]) -> PivotResult<Vec<Option<AggFunc>>> {
        match self {
            CellAggregation::Uniform(name) => {
                let func = AggFunc::lookup(&resolve_aggregation_token(name))?;
                Ok(vec![Some(func); values.len()])
            }
            CellAggregation::PerValue(by_value) => {
                if let Some(unknown) = by_value.keys().find(|k| !values.contains(k)) {
                    return Err(PivotError::invalid(format!("Aggregation given for '{}', which is not a value column", unknown)));
                }
                values
                    .iter()
                    .map(|v| by_value.get(v).map(|name| AggFunc::lookup(&resolve_aggregation_token(name))).transpose())
                    .collect()
            }
        }
    }
}

impl From<&str> for CellAggregation {
    fn from(name: &str) -> Self { CellAggregation::Uniform(name.to_string()) }
}

impl From<String> for CellAggregation {
    fn from(name: String) -> Self { CellAggregation::Uniform(name) }
}

impl From<HashMap<String, String>> for CellAggregation {
    fn from(by_value: HashMap<String, String>) -> Self { CellAggregation::PerValue(by_value) }
}

impl<const N: usize> From<[(&str, &str); N]> for CellAggregation {
    fn from(pairs: [(&str, &str); N]) -> Self {
        CellAggregation::PerValue(pairs.iter().map(|(v, f)| (v.to_string(), f.to_string())).collect())
    }
}

/// True for fixed-point numeric types whose aggregates are cast to Float64.
pub fn is_decimal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Decimal(_, _))
}

/// Aggregate expression for one value column, aliased to its output name.
pub fn aggregate_expr(func: AggFunc, column: &str, dtype: &DataType, output_name: &str) -> Expr {
    let mut e = func.apply(col(column));
    if is_decimal(dtype) && !func.is_counting() {
        e = e.cast(DataType::Float64);
    }
    e.alias(output_name)
}
