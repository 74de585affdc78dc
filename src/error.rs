//! Unified error model for pivot query construction, execution and reshaping.
//! Every failure surfaces synchronously to the caller; nothing here logs, retries or swallows.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PivotError {
    /// A row-key, column-key or value column is not part of the source query.
    #[error("Column {name} not found in source query. Available columns: [{available}]")]
    ColumnResolution { name: String, available: String },
    /// The aggregation name has no entry in the aggregate symbol table.
    #[error("Unknown aggregate function '{name}'")]
    UnknownAggregate { name: String },
    /// The query engine rejected or failed the grouped query.
    #[error("{message}")]
    Execution { message: String },
    /// Two input rows landed on the same (row key, column key) cell.
    #[error("Duplicate cell at row {row} / column {column}; rows must be pre-aggregated")]
    DuplicateCell { row: String, column: String },
    #[error("{message}")]
    InvalidRequest { message: String },
    #[error("Row has {found} values but {expected} columns were expected")]
    RowShape { expected: usize, found: usize },
}

impl PivotError {
    pub fn code_str(&self) -> &'static str {
        match self {
            PivotError::ColumnResolution { .. } => "column_not_found",
            PivotError::UnknownAggregate { .. } => "unknown_aggregate",
            PivotError::Execution { .. } => "exec_error",
            PivotError::DuplicateCell { .. } => "duplicate_cell",
            PivotError::InvalidRequest { .. } => "bad_input",
            PivotError::RowShape { .. } => "row_shape",
        }
    }

    pub fn invalid<S: Into<String>>(msg: S) -> Self { PivotError::InvalidRequest { message: msg.into() } }
    pub fn exec<S: Into<String>>(msg: S) -> Self { PivotError::Execution { message: msg.into() } }
    pub fn unknown_aggregate<S: Into<String>>(name: S) -> Self { PivotError::UnknownAggregate { name: name.into() } }

    /// Build a resolution error listing the columns that do exist.
    pub fn column_not_found<'a, I>(name: &str, available: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut list: Vec<&str> = available.into_iter().collect();
        list.sort_unstable();
        let total = list.len();
        // Limit the list to avoid overly long messages
        let shown: Vec<&str> = list.into_iter().take(50).collect();
        let mut available = shown.join(", ");
        if total > 50 { available.push_str(" (truncated)"); }
        PivotError::ColumnResolution { name: name.to_string(), available }
    }

    /// True for failures raised before anything was executed.
    pub fn is_build_error(&self) -> bool {
        matches!(self, PivotError::ColumnResolution { .. } | PivotError::UnknownAggregate { .. } | PivotError::InvalidRequest { .. })
    }
}

pub type PivotResult<T> = Result<T, PivotError>;

impl From<polars::error::PolarsError> for PivotError {
    fn from(err: polars::error::PolarsError) -> Self {
        PivotError::Execution { message: err.to_string() }
    }
}

impl From<anyhow::Error> for PivotError {
    fn from(err: anyhow::Error) -> Self {
        // Pass typed errors through; anything else came from the engine
        match err.downcast::<PivotError>() {
            Ok(e) => e,
            Err(other) => PivotError::Execution { message: other.to_string() },
        }
    }
}
