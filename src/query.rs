//! Grouped aggregation query over a source query.
//!
//! SELECT row keys ++ column keys ++ aggregates, GROUP BY row keys ++ column keys,
//! executed through the source query's own binding. Output rows are sorted by the
//! group keys so the pivot axes come out in key order.

use polars::prelude::*;
use tracing::debug;

use crate::aggregate::{aggregate_expr, is_decimal, AggFunc};
use crate::error::{PivotError, PivotResult};
use crate::normalize::{normalize_values, AxisSpec, ValueColumn, ValueSpec};
use crate::source::{ColumnRef, SourceQuery};
use crate::value::Scalar;

/// One grouped output row: row-key values, column-key values, then aggregates.
pub type AggregatedRow = Vec<Scalar>;

/// A grouped query ready to run, with everything already resolved.
pub struct GroupedQuery<'c> {
    source: SourceQuery<'c>,
    pub row_keys: Vec<ColumnRef>,
    pub col_keys: Vec<ColumnRef>,
    pub values: Vec<ValueColumn>,
    aggregates: Vec<Expr>,
}

impl<'c> GroupedQuery<'c> {
    /// Resolve keys and aggregates against the source query. Nothing is executed.
    pub fn build(
        source: &SourceQuery<'c>,
        rows: impl Into<AxisSpec>,
        cols: impl Into<AxisSpec>,
        values: impl Into<ValueSpec>,
    ) -> PivotResult<Self> {
        let rows = rows.into().into_vec();
        let cols = cols.into().into_vec();
        let values = normalize_values(values);
        if rows.is_empty() {
            return Err(PivotError::invalid("At least one row key is required"));
        }
        if values.is_empty() {
            return Err(PivotError::invalid("At least one value column is required"));
        }
        let schema = source.schema()?;
        let row_keys = rows.iter().map(|c| source.column_in(&schema, c)).collect::<PivotResult<Vec<_>>>()?;
        let col_keys = cols.iter().map(|c| source.column_in(&schema, c)).collect::<PivotResult<Vec<_>>>()?;
        debug!(target: "pivots::query", "group keys: rows={:?} cols={:?}", rows, cols);

        let mut aggregates = Vec::with_capacity(values.len());
        for v in &values {
            let column = source.column_in(&schema, &v.source_column)?;
            let func = AggFunc::lookup(&v.aggregation)?;
            if is_decimal(&column.dtype) && !func.is_counting() {
                debug!(target: "pivots::query", "casting {}({}) from {:?} to Float64", v.aggregation, column.name, column.dtype);
            }
            debug!(target: "pivots::query", "aggregate: {}({}) AS {}", v.aggregation, column.name, v.output_name);
            aggregates.push(aggregate_expr(func, &column.name, &column.dtype, &v.output_name));
        }

        Ok(GroupedQuery { source: source.clone(), row_keys, col_keys, values, aggregates })
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &ColumnRef> {
        self.row_keys.iter().chain(self.col_keys.iter())
    }

    /// Output column names in select order.
    pub fn output_names(&self) -> Vec<String> {
        self.group_keys()
            .map(|c| c.name.clone())
            .chain(self.values.iter().map(|v| v.output_name.clone()))
            .collect()
    }

    /// The lazy plan this query will execute.
    pub fn plan(&self) -> LazyFrame {
        let keys: Vec<Expr> = self.group_keys().map(|c| c.expr()).collect();
        let n = keys.len();
        let mut select: Vec<Expr> = self.group_keys().map(|c| col(c.name.as_str())).collect();
        select.extend(self.values.iter().map(|v| col(v.output_name.as_str())));
        let opts = SortMultipleOptions {
            descending: vec![false; n],
            nulls_last: vec![false; n],
            maintain_order: true,
            multithreaded: true,
            limit: None,
        };
        self.source
            .plan()
            .clone()
            .group_by(keys.clone())
            .agg(self.aggregates.clone())
            .sort_by_exprs(keys, opts)
            .select(select)
    }

    /// Execute against the source query's binding and return scalar rows.
    pub fn run(&self) -> PivotResult<Vec<AggregatedRow>> {
        let df = self.source.execute(self.plan())?;
        debug!(target: "pivots::query", "grouped query returned rows={}", df.height());
        dataframe_rows(&df)
    }
}

/// Rows of a frame as scalar tuples in column order.
pub fn dataframe_rows(df: &DataFrame) -> PivotResult<Vec<AggregatedRow>> {
    let columns = df.get_columns();
    let mut out = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row = Vec::with_capacity(columns.len());
        for c in columns {
            row.push(Scalar::from(c.get(row_idx)?));
        }
        out.push(row);
    }
    Ok(out)
}

/// Build and run the grouped query; zero rows is a valid outcome.
pub fn pivot_data(
    source: &SourceQuery<'_>,
    rows: impl Into<AxisSpec>,
    cols: impl Into<AxisSpec>,
    values: impl Into<ValueSpec>,
) -> PivotResult<Vec<AggregatedRow>> {
    GroupedQuery::build(source, rows, cols, values)?.run()
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
