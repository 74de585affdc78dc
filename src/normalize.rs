//! Canonical forms for row-key, column-key and value specifications.
//!
//! Callers may hand over a bare column name or a sequence of them; a value may be a
//! bare column (summed) or an `(aggregation, column)` pair. Everything funnels through
//! `OneOrMany::into_vec` and ends up as an ordered list of `ValueColumn`s whose output
//! names are collision-safe.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Aggregation applied to a bare value column.
pub const DEFAULT_AGGREGATION: &str = "sum";

/// Tokens that mean "number of non-null items".
const COUNT_TOKENS: [&str; 3] = ["len", "length", "size"];

/// A single item or an ordered sequence of items.
///
/// A JSON array always reads as the sequence form, even when the item type could
/// itself be read from an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Wrap a non-sequence into a one-element sequence.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self { OneOrMany::Many(Vec::new()) }
}

impl From<&str> for OneOrMany<String> {
    fn from(s: &str) -> Self { OneOrMany::One(s.to_string()) }
}

impl From<String> for OneOrMany<String> {
    fn from(s: String) -> Self { OneOrMany::One(s) }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(v: Vec<&str>) -> Self { OneOrMany::Many(v.into_iter().map(str::to_string).collect()) }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(v: Vec<String>) -> Self { OneOrMany::Many(v) }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(v: [&str; N]) -> Self { OneOrMany::Many(v.iter().map(|s| s.to_string()).collect()) }
}

/// Row-key or column-key specification.
pub type AxisSpec = OneOrMany<String>;

/// One entry of a value specification.
///
/// In JSON a bare column is a string and a pair is `{"agg": "avg", "column": "price"}`.
/// Inside a value list a pair may also be written as a nested `["avg", "price"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawValueItem", into = "RawValueItem")]
pub enum ValueItem {
    /// Bare column name, aggregated with `sum`.
    Column(String),
    /// `(aggregation, column)` pair.
    Aggregated(String, String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawValueItem {
    Column(String),
    Keyed {
        #[serde(alias = "aggregation")]
        agg: String,
        column: String,
    },
    Pair(String, String),
}

impl From<RawValueItem> for ValueItem {
    fn from(raw: RawValueItem) -> Self {
        match raw {
            RawValueItem::Column(c) => ValueItem::Column(c),
            RawValueItem::Keyed { agg, column } | RawValueItem::Pair(agg, column) => ValueItem::Aggregated(agg, column),
        }
    }
}

impl From<ValueItem> for RawValueItem {
    fn from(item: ValueItem) -> Self {
        match item {
            ValueItem::Column(c) => RawValueItem::Column(c),
            ValueItem::Aggregated(agg, column) => RawValueItem::Keyed { agg, column },
        }
    }
}

impl ValueItem {
    pub fn agg<A: Into<String>, C: Into<String>>(aggregation: A, column: C) -> Self {
        ValueItem::Aggregated(aggregation.into(), column.into())
    }

    /// `(column, aggregation)` with the aggregation token resolved.
    fn split(&self) -> (&str, String) {
        match self {
            ValueItem::Column(c) => (c.as_str(), DEFAULT_AGGREGATION.to_string()),
            ValueItem::Aggregated(a, c) => (c.as_str(), resolve_aggregation_token(a)),
        }
    }
}

impl From<&str> for ValueItem {
    fn from(s: &str) -> Self { ValueItem::Column(s.to_string()) }
}

impl From<(&str, &str)> for ValueItem {
    fn from((a, c): (&str, &str)) -> Self { ValueItem::agg(a, c) }
}

pub type ValueSpec = OneOrMany<ValueItem>;

impl From<&str> for ValueSpec {
    fn from(s: &str) -> Self { OneOrMany::One(ValueItem::from(s)) }
}

impl From<(&str, &str)> for ValueSpec {
    fn from(p: (&str, &str)) -> Self { OneOrMany::One(ValueItem::from(p)) }
}

impl From<ValueItem> for ValueSpec {
    fn from(v: ValueItem) -> Self { OneOrMany::One(v) }
}

impl From<Vec<ValueItem>> for ValueSpec {
    fn from(v: Vec<ValueItem>) -> Self { OneOrMany::Many(v) }
}

impl From<Vec<&str>> for ValueSpec {
    fn from(v: Vec<&str>) -> Self { OneOrMany::Many(v.into_iter().map(ValueItem::from).collect()) }
}

impl From<Vec<(&str, &str)>> for ValueSpec {
    fn from(v: Vec<(&str, &str)>) -> Self { OneOrMany::Many(v.into_iter().map(ValueItem::from).collect()) }
}

/// A resolved value column: where it comes from, how it is aggregated, what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueColumn {
    pub output_name: String,
    pub source_column: String,
    pub aggregation: String,
}

/// Count-of-items tokens become `count`; every other token passes through verbatim.
pub fn resolve_aggregation_token(token: &str) -> String {
    let t = token.trim();
    if COUNT_TOKENS.iter().any(|c| c.eq_ignore_ascii_case(t)) {
        "count".to_string()
    } else {
        t.to_string()
    }
}

/// Resolve a value specification into ordered, uniquely named value columns.
///
/// Columns are emitted in order of first appearance. A column seen with a single
/// distinct aggregation keeps its own name; one seen with several is emitted once per
/// aggregation as `<column>_<aggregation>`, in the order the aggregations were given.
pub fn normalize_values(spec: impl Into<ValueSpec>) -> Vec<ValueColumn> {
    let items = spec.into().into_vec();
    let mut order: Vec<&str> = Vec::new();
    let mut by_column: HashMap<&str, Vec<String>> = HashMap::new();
    for item in &items {
        let (column, aggregation) = item.split();
        let aggs = by_column.entry(column).or_insert_with(|| {
            order.push(column);
            Vec::new()
        });
        if !aggs.contains(&aggregation) {
            aggs.push(aggregation);
        }
    }

    let mut out = Vec::with_capacity(items.len());
    for column in order {
        let aggs = &by_column[column];
        if aggs.len() == 1 {
            out.push(ValueColumn {
                output_name: column.to_string(),
                source_column: column.to_string(),
                aggregation: aggs[0].clone(),
            });
        } else {
            for aggregation in aggs {
                out.push(ValueColumn {
                    output_name: format!("{}_{}", column, aggregation),
                    source_column: column.to_string(),
                    aggregation: aggregation.clone(),
                });
            }
        }
    }
    out
}

/// Output names only, in the same order as `normalize_values`.
pub fn value_names(spec: impl Into<ValueSpec>) -> Vec<String> {
    normalize_values(spec).into_iter().map(|v| v.output_name).collect()
}

/// Full schema of an aggregated row: row keys, then column keys, then value outputs.
pub fn column_names(rows: &[String], cols: &[String], values: &[String]) -> Vec<String> {
    rows.iter().chain(cols.iter()).chain(values.iter()).cloned().collect()
}
