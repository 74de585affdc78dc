//! Project a pivot table onto a Highcharts-style `{xAxis, yAxis, series}` payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{PivotOptions, PointMode};
use crate::millis::unix_time_millis;
use crate::normalize::{value_names, AxisSpec, ValueSpec};
use crate::reshape::{AxisKey, PivotTable};
use crate::value::{is_chronological, is_label, is_missing, Scalar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub title: AxisTitle,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opposite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_line_width: Option<u32>,
}

impl Axis {
    pub fn titled(text: impl Into<String>) -> Self {
        Axis { title: AxisTitle { text: text.into() }, axis_type: None, categories: None, opposite: None, grid_line_width: None }
    }
}

/// A single axis descriptor, or one per dimension when there are several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axes {
    Single(Axis),
    Multiple(Vec<Axis>),
}

impl Axes {
    fn from_vec(mut axes: Vec<Axis>) -> Self {
        if axes.len() == 1 { Axes::Single(axes.remove(0)) } else { Axes::Multiple(axes) }
    }

    pub fn as_slice(&self) -> &[Axis] {
        match self {
            Axes::Single(a) => std::slice::from_ref(a),
            Axes::Multiple(v) => v,
        }
    }

    /// Titles in order; empty for a single axis, which never takes a series index.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Axes::Single(_) => Vec::new(),
            Axes::Multiple(v) => v.iter().map(|a| a.title.text.as_str()).collect(),
        }
    }
}

/// Numeric y value (or x, for pair points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Point {
    Value(Number),
    Pair(Number, Number),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<Point>,
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(rename = "yAxis", skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "xAxis")]
    pub x_axis: Axes,
    #[serde(rename = "yAxis")]
    pub y_axis: Axes,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn axis_title(names: &[String], separator: &str) -> String {
    names.iter().rev().cloned().collect::<Vec<_>>().join(separator)
}

fn category(key: &AxisKey) -> Value {
    match key.as_slice() {
        [single] => single.to_json(),
        many => Value::Array(many.iter().map(Scalar::to_json).collect()),
    }
}

/// The x-axis: titled by the row keys, datetime-typed or categorical.
pub fn x_axis(table: &PivotTable, rows: impl Into<AxisSpec>, opts: &PivotOptions) -> Axis {
    let names = rows.into().into_vec();
    let mut axis = Axis::titled(axis_title(&names, &opts.title_separator));
    if table.has_chronological_index() {
        axis.axis_type = Some("datetime".to_string());
    } else {
        axis.categories = Some(table.index().iter().map(category).collect());
    }
    debug!(target: "pivots::chart", "x axis '{}' datetime={}", axis.title.text, axis.axis_type.is_some());
    axis
}

/// One y-axis per value dimension; every axis after the first is a secondary axis.
pub fn y_axes(values: impl Into<AxisSpec>) -> Axes {
    let axes = values
        .into()
        .into_vec()
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut axis = Axis::titled(name);
            if i > 0 {
                axis.opposite = Some(true);
                axis.grid_line_width = Some(0);
            }
            axis
        })
        .collect();
    Axes::from_vec(axes)
}

/// x-axis when `xaxis` is set, y-axes otherwise.
pub fn get_axes(table: &PivotTable, names: impl Into<AxisSpec>, xaxis: bool, opts: &PivotOptions) -> Axes {
    if xaxis { Axes::Single(x_axis(table, names, opts)) } else { y_axes(names) }
}

fn number(v: &Scalar, missing: f64) -> Number {
    if is_missing(v) {
        return Number::Float(missing);
    }
    match v {
        Scalar::Int(i) => Number::Int(*i),
        Scalar::Bool(b) => Number::Int(*b as i64),
        other => Number::Float(other.as_f64().unwrap_or(missing)),
    }
}

fn missing_number(missing: f64) -> Number {
    if missing.fract() == 0.0 && missing.abs() < i64::MAX as f64 { Number::Int(missing as i64) } else { Number::Float(missing) }
}

/// Serialize one column's (index, value) pairs.
fn serialize_column<'a>(
    cells: impl Iterator<Item = (&'a AxisKey, Option<&'a Scalar>)>,
    opts: &PivotOptions,
) -> Vec<Point> {
    cells
        .enumerate()
        .map(|(pos, (key, cell))| {
            let y = match cell {
                Some(v) if !is_missing(v) => number(v, opts.missing_value),
                _ => missing_number(opts.missing_value),
            };
            let x = match key.as_slice() {
                [single] => single,
                _ => &Scalar::Null,
            };
            let label_index = key.len() != 1 || is_label(x);
            let as_pair = match opts.point_mode {
                PointMode::Auto => !label_index,
                PointMode::Values => false,
                PointMode::Pairs => true,
            };
            if !as_pair {
                return Point::Value(y);
            }
            let xv = if is_chronological(x) {
                unix_time_millis(x).map(Number::Int).unwrap_or(Number::Int(pos as i64))
            } else if label_index {
                Number::Int(pos as i64)
            } else {
                number(x, pos as f64)
            };
            Point::Pair(xv, y)
        })
        .collect()
}

/// One series per table column, in table column order.
pub fn get_series(table: &PivotTable, y_axis: &Axes, charts: &HashMap<String, String>, opts: &PivotOptions) -> Vec<Series> {
    let axis_names = y_axis.names();
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let leading = column.leading();
            let chart_type = charts.get(&leading).cloned().unwrap_or_else(|| opts.default_chart_type.clone());
            let y_axis = if axis_names.len() > 1 { axis_names.iter().position(|n| *n == leading) } else { None };
            Series {
                name: column.label(&opts.series_separator),
                data: serialize_column(table.column_values(i), opts),
                chart_type,
                y_axis,
            }
        })
        .collect()
}

/// Full chart payload for a pivot table. `values` is the same value spec the table was
/// built from; the y-axes are titled by its normalized output names.
pub fn get_chart(
    table: &PivotTable,
    rows: impl Into<AxisSpec>,
    values: impl Into<ValueSpec>,
    charts: &HashMap<String, String>,
    opts: &PivotOptions,
) -> Chart {
    let x_axis = Axes::Single(x_axis(table, rows, opts));
    let y_axis = y_axes(value_names(values));
    let series = get_series(table, &y_axis, charts, opts);
    debug!(target: "pivots::chart", "chart: series={} y_axes={}", series.len(), y_axis.as_slice().len());
    Chart { x_axis, y_axis, series }
}

#[cfg(test)]
#[path = "chart_tests.rs"]
mod tests;
