//! Source queries and the connection they are bound to.
//!
//! A `SourceQuery` is a lazy polars plan plus a borrowed execution binding. Column
//! references are resolved against the plan's schema; grouped queries derived from it
//! execute through the same binding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use polars::prelude::*;
use tracing::debug;

use crate::error::{PivotError, PivotResult};

/// Execution seam for grouped queries.
pub trait Executor: Send + Sync {
    fn execute(&self, plan: LazyFrame) -> anyhow::Result<DataFrame>;
}

/// In-process polars connection holding named tables.
#[derive(Default)]
pub struct Connection {
    tables: RwLock<HashMap<String, DataFrame>>,
    executions: AtomicU64,
}

impl Connection {
    pub fn new() -> Self { Self::default() }

    pub fn register(&self, name: &str, df: DataFrame) {
        debug!(target: "pivots::source", "register table '{}' rows={} cols={:?}", name, df.height(), df.get_column_names());
        self.tables.write().insert(name.to_string(), df);
    }

    /// Start a source query reading a registered table.
    pub fn table(&self, name: &str) -> PivotResult<SourceQuery<'_>> {
        let guard = self.tables.read();
        match guard.get(name) {
            Some(df) => Ok(SourceQuery::new(df.clone().lazy(), self)),
            None => Err(PivotError::invalid(format!("Table '{}' is not registered on this connection", name))),
        }
    }

    /// Number of plans executed through this connection.
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }
}

impl Executor for Connection {
    fn execute(&self, plan: LazyFrame) -> anyhow::Result<DataFrame> {
        self.executions.fetch_add(1, Ordering::Relaxed);
        let df = plan.collect()?;
        debug!(target: "pivots::source", "executed plan: rows={} cols={:?}", df.height(), df.get_column_names());
        Ok(df)
    }
}

/// A column of a source query, by name and declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub name: String,
    pub dtype: DataType,
}

impl ColumnRef {
    pub fn expr(&self) -> Expr {
        col(self.name.as_str())
    }
}

/// Input row-set for a pivot: a lazy plan bound to an executor.
#[derive(Clone)]
pub struct SourceQuery<'c> {
    plan: LazyFrame,
    binding: &'c dyn Executor,
}

impl<'c> SourceQuery<'c> {
    pub fn new(plan: LazyFrame, binding: &'c dyn Executor) -> Self {
        SourceQuery { plan, binding }
    }

    pub fn from_frame(df: DataFrame, binding: &'c dyn Executor) -> Self {
        Self::new(df.lazy(), binding)
    }

    pub fn filter(self, predicate: Expr) -> Self {
        SourceQuery { plan: self.plan.filter(predicate), binding: self.binding }
    }

    pub fn plan(&self) -> &LazyFrame {
        &self.plan
    }

    pub fn binding(&self) -> &'c dyn Executor {
        self.binding
    }

    pub fn schema(&self) -> PivotResult<SchemaRef> {
        Ok(self.plan.clone().collect_schema()?)
    }

    /// Resolve a column by exact name.
    pub fn column(&self, name: &str) -> PivotResult<ColumnRef> {
        let schema = self.schema()?;
        self.column_in(&schema, name)
    }

    pub(crate) fn column_in(&self, schema: &Schema, name: &str) -> PivotResult<ColumnRef> {
        match schema.get(name) {
            Some(dtype) => Ok(ColumnRef { name: name.to_string(), dtype: dtype.clone() }),
            None => Err(PivotError::column_not_found(name, schema.iter_names().map(|n| n.as_str()))),
        }
    }

    pub(crate) fn execute(&self, plan: LazyFrame) -> PivotResult<DataFrame> {
        Ok(self.binding.execute(plan)?)
    }
}
