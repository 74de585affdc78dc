//! Serializable pivot chart request: the whole pipeline behind one JSON document.
//!
//! ```json
//! {"rows": "yearmonth", "cols": ["town", "gender"], "values": {"agg": "len", "column": "price"},
//!  "charts": {"price": "line"}, "options": {"point_mode": "values"}}
//! ```
//!
//! `values` takes a column name, a `{"agg", "column"}` object, or a list mixing column
//! names, objects and nested `["agg", "column"]` pairs:
//!
//! ```json
//! ["price", "customer_id"]
//! ["price", ["len", "price"]]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::{get_chart, Chart};
use crate::config::PivotOptions;
use crate::error::{PivotError, PivotResult};
use crate::normalize::{AxisSpec, ValueSpec};
use crate::reshape::{pivot_table_from_select, PivotTable};
use crate::source::SourceQuery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRequest {
    pub rows: AxisSpec,
    #[serde(default)]
    pub cols: AxisSpec,
    pub values: ValueSpec,
    /// Chart type per leading series name.
    #[serde(default)]
    pub charts: HashMap<String, String>,
    #[serde(default)]
    pub options: PivotOptions,
}

impl PivotRequest {
    pub fn from_json(text: &str) -> PivotResult<Self> {
        serde_json::from_str(text).map_err(|e| PivotError::invalid(format!("Malformed pivot request: {}", e)))
    }

    /// Aggregate and reshape; `None` when the source produced no groups.
    pub fn table(&self, source: &SourceQuery<'_>) -> PivotResult<Option<PivotTable>> {
        pivot_table_from_select(source, self.rows.clone(), self.cols.clone(), self.values.clone(), &self.options)
    }

    pub fn run(&self, source: &SourceQuery<'_>) -> PivotResult<Option<Chart>> {
        let Some(table) = self.table(source)? else {
            debug!(target: "pivots::chart", "request produced no groups; no chart");
            return Ok(None);
        };
        Ok(Some(get_chart(&table, self.rows.clone(), self.values.clone(), &self.charts, &self.options)))
    }
}
