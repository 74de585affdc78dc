//! Reshape pre-aggregated rows into a (row key x column key) pivot table.
//!
//! Row index = distinct row-key tuples, column axis = distinct column-key tuples, with
//! the value name folded in as the leading column component when more than one value
//! column exists. Both axes are sorted by key. Rows are taken as already aggregated:
//! two rows on the same cell are rejected unless `DuplicatePolicy::Mean` is chosen, or
//! the caller re-aggregates every cell through `pivot_table_with`.

use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::aggregate::{AggFunc, CellAggregation};
use crate::config::{DuplicatePolicy, PivotOptions};
use crate::error::{PivotError, PivotResult};
use crate::normalize::{column_names, value_names, AxisSpec, ValueSpec};
use crate::query::{pivot_data, AggregatedRow};
use crate::source::SourceQuery;
use crate::value::{cmp_tuples, is_chronological, is_missing, Scalar};

/// Key tuple along one axis.
pub type AxisKey = Vec<Scalar>;

/// One output column of a pivot table.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotColumn {
    /// Value column this cell range belongs to.
    pub value: String,
    /// Full column label: value name (when folded) followed by column-key components.
    pub key: AxisKey,
}

impl PivotColumn {
    pub fn is_composite(&self) -> bool {
        self.key.len() > 1
    }

    /// First label component: the value name when folded, otherwise the first column key.
    pub fn leading(&self) -> String {
        self.key.first().map(|k| k.to_string()).unwrap_or_else(|| self.value.clone())
    }

    pub fn label(&self, separator: &str) -> String {
        if self.key.is_empty() {
            return self.value.clone();
        }
        self.key.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(separator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    pub values: Vec<String>,
    index: Vec<AxisKey>,
    columns: Vec<PivotColumn>,
    // cells[column][row]
    cells: Vec<Vec<Option<Scalar>>>,
}

impl PivotTable {
    pub fn index(&self) -> &[AxisKey] {
        &self.index
    }

    pub fn columns(&self) -> &[PivotColumn] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when every row index entry is a single date or timestamp.
    pub fn has_chronological_index(&self) -> bool {
        !self.index.is_empty() && self.index.iter().all(|k| k.len() == 1 && is_chronological(&k[0]))
    }

    /// (index entry, cell) pairs of one column, in index order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = (&AxisKey, Option<&Scalar>)> + '_ {
        let cells = self.cells.get(column);
        self.index.iter().enumerate().map(move |(row, key)| (key, cells.and_then(|c| c[row].as_ref())))
    }

    /// Cell lookup by value name, column-key tuple and row-key tuple.
    pub fn get(&self, value: &str, col_key: &[Scalar], row_key: &[Scalar]) -> Option<&Scalar> {
        let folded = self.values.len() > 1;
        let ci = self.columns.iter().position(|c| {
            c.value == value && if folded { c.key.len() == col_key.len() + 1 && c.key[1..] == *col_key } else { c.key == col_key }
        })?;
        let ri = self.index.iter().position(|k| k.as_slice() == row_key)?;
        self.cells[ci][ri].as_ref()
    }
}

/// Sorted distinct keys.
fn sorted_axis(mut keys: Vec<AxisKey>) -> Vec<AxisKey> {
    keys.sort_by(|a, b| cmp_tuples(a, b));
    keys.dedup_by(|a, b| cmp_tuples(a, b).is_eq());
    keys
}

fn position(axis: &[AxisKey], key: &[Scalar]) -> usize {
    // keys were collected from the same rows, so the search always hits
    axis.binary_search_by(|k| cmp_tuples(k, key)).unwrap_or_else(|i| i)
}

/// Reshape aggregated rows; `None` when there are no rows at all.
pub fn reshape(
    rows: &[AggregatedRow],
    row_keys: &[String],
    col_keys: &[String],
    values: &[String],
    opts: &PivotOptions,
) -> PivotResult<Option<PivotTable>> {
    reshape_with(rows, row_keys, col_keys, values, None, opts)
}

/// Reshape rows, reducing every cell of a value column that has a function in
/// `aggfunc`. Cells of other value columns follow `opts.duplicates`.
pub fn reshape_with(
    rows: &[AggregatedRow],
    row_keys: &[String],
    col_keys: &[String],
    values: &[String],
    aggfunc: Option<&CellAggregation>,
    opts: &PivotOptions,
) -> PivotResult<Option<PivotTable>> {
    let funcs = match aggfunc {
        Some(a) => a.resolve(values)?,
        None => vec![None; values.len()],
    };
    if rows.is_empty() {
        debug!(target: "pivots::reshape", "no rows; pivot table absent");
        return Ok(None);
    }
    let schema = column_names(row_keys, col_keys, values);
    let (nr, nc) = (row_keys.len(), col_keys.len());
    for r in rows {
        if r.len() != schema.len() {
            return Err(PivotError::RowShape { expected: schema.len(), found: r.len() });
        }
    }

    let index = sorted_axis(rows.iter().map(|r| r[..nr].to_vec()).collect());
    let col_tuples = sorted_axis(rows.iter().map(|r| r[nr..nr + nc].to_vec()).collect());

    let folded = values.len() > 1;
    let mut columns = Vec::with_capacity(values.len() * col_tuples.len());
    for v in values {
        for t in &col_tuples {
            let mut key = Vec::with_capacity(t.len() + 1);
            if folded {
                key.push(Scalar::Str(v.clone()));
            }
            key.extend(t.iter().cloned());
            columns.push(PivotColumn { value: v.clone(), key });
        }
    }

    // every value landing on a cell, in input order
    let mut buckets: Vec<Vec<Vec<Scalar>>> = vec![vec![Vec::new(); index.len()]; columns.len()];
    for r in rows {
        let ri = position(&index, &r[..nr]);
        let ti = position(&col_tuples, &r[nr..nr + nc]);
        for (vi, cell) in r[nr + nc..].iter().enumerate() {
            let ci = vi * col_tuples.len() + ti;
            let bucket = &mut buckets[ci][ri];
            if funcs[vi].is_none() && opts.duplicates == DuplicatePolicy::Reject && !bucket.is_empty() {
                return Err(PivotError::DuplicateCell {
                    row: index[ri].iter().map(|k| k.to_string()).collect::<Vec<_>>().join(&opts.series_separator),
                    column: columns[ci].label(&opts.series_separator),
                });
            }
            bucket.push(cell.clone());
        }
    }

    let n_cols = col_tuples.len().max(1);
    let cells: Vec<Vec<Option<Scalar>>> = buckets
        .into_iter()
        .enumerate()
        .map(|(ci, column)| {
            let func = funcs[ci / n_cols];
            column.into_iter().map(|bucket| reduce_cell(&bucket, func, opts.duplicates)).collect()
        })
        .collect();

    debug!(target: "pivots::reshape", "pivot table: rows={} cols={} folded={}", index.len(), columns.len(), folded);
    Ok(Some(PivotTable {
        row_keys: row_keys.to_vec(),
        col_keys: col_keys.to_vec(),
        values: values.to_vec(),
        index,
        columns,
        cells,
    }))
}

/// Final value of one cell; `None` when nothing usable landed on it.
fn reduce_cell(bucket: &[Scalar], func: Option<AggFunc>, duplicates: DuplicatePolicy) -> Option<Scalar> {
    if bucket.is_empty() {
        return None;
    }
    let value = match func {
        Some(f) => f.reduce(bucket),
        None => {
            let present: Vec<Scalar> = bucket.iter().filter(|v| !is_missing(v)).cloned().collect();
            match present.as_slice() {
                [] => return None,
                [single] => single.clone(),
                // non-numeric duplicates keep the first value
                many if duplicates == DuplicatePolicy::Mean && many.iter().all(|v| v.as_f64().is_some()) => AggFunc::Avg.reduce(many),
                many => many[0].clone(),
            }
        }
    };
    if is_missing(&value) { None } else { Some(value) }
}

/// Reshape caller-supplied rows laid out as row keys ++ column keys ++ values.
pub fn pivot_table(
    rows: &[AggregatedRow],
    row_keys: impl Into<AxisSpec>,
    col_keys: impl Into<AxisSpec>,
    values: impl Into<ValueSpec>,
    opts: &PivotOptions,
) -> PivotResult<Option<PivotTable>> {
    let row_keys = row_keys.into().into_vec();
    let col_keys = col_keys.into().into_vec();
    let values = value_names(values);
    reshape(rows, &row_keys, &col_keys, &values, opts)
}

/// Like `pivot_table`, re-aggregating the rows with `aggfunc`: an aggregate name for
/// every value column, or a map from value name to aggregate name.
pub fn pivot_table_with(
    rows: &[AggregatedRow],
    row_keys: impl Into<AxisSpec>,
    col_keys: impl Into<AxisSpec>,
    values: impl Into<ValueSpec>,
    aggfunc: impl Into<CellAggregation>,
    opts: &PivotOptions,
) -> PivotResult<Option<PivotTable>> {
    let row_keys = row_keys.into().into_vec();
    let col_keys = col_keys.into().into_vec();
    let values = value_names(values);
    reshape_with(rows, &row_keys, &col_keys, &values, Some(&aggfunc.into()), opts)
}

/// Run the grouped query for `source` and reshape its rows.
pub fn pivot_table_from_select(
    source: &SourceQuery<'_>,
    rows: impl Into<AxisSpec>,
    cols: impl Into<AxisSpec>,
    values: impl Into<ValueSpec>,
    opts: &PivotOptions,
) -> PivotResult<Option<PivotTable>> {
    let rows = rows.into();
    let cols = cols.into();
    let values = values.into();
    let data = pivot_data(source, rows.clone(), cols.clone(), values.clone())?;
    pivot_table(&data, rows, cols, values, opts)
}

impl Display for PivotTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let head = self.row_keys.join(" / ");
        let labels: Vec<String> = self.columns.iter().map(|c| c.label(" / ")).collect();
        let mut widths: Vec<usize> = labels.iter().map(|l| l.len()).collect();
        let rows: Vec<String> = self.index.iter().map(|k| k.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" / ")).collect();
        let first = rows.iter().map(|r| r.len()).chain(std::iter::once(head.len())).max().unwrap_or(0);
        let rendered: Vec<Vec<String>> = (0..self.columns.len())
            .map(|ci| self.cells[ci].iter().map(|c| c.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "NaN".into())).collect())
            .collect();
        for (ci, col) in rendered.iter().enumerate() {
            for v in col { widths[ci] = widths[ci].max(v.len()); }
        }
        write!(f, "{:<w$}", head, w = first)?;
        for (ci, l) in labels.iter().enumerate() { write!(f, "  {:>w$}", l, w = widths[ci])?; }
        for (ri, r) in rows.iter().enumerate() {
            write!(f, "\n{:<w$}", r, w = first)?;
            for ci in 0..rendered.len() { write!(f, "  {:>w$}", rendered[ci][ri], w = widths[ci])?; }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "reshape_tests.rs"]
mod tests;
