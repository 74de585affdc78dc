use serde::{Deserialize, Serialize};
use tracing::debug;

/// What to do when two input rows land on the same pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    /// Average numeric duplicates.
    Mean,
}

/// Shape of series data points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointMode {
    /// Bare values for label (categorical) indexes, `[x, y]` pairs otherwise.
    #[default]
    Auto,
    /// Always bare values; x comes from the axis categories.
    Values,
    /// Always `[x, y]` pairs; label indexes use their row position as x.
    Pairs,
}

/// Pivot and chart projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotOptions {
    /// Chart type for series without an override.
    pub default_chart_type: String,
    /// Joins composite column labels into series names.
    pub series_separator: String,
    /// Joins composite key names into axis titles.
    pub title_separator: String,
    pub duplicates: DuplicatePolicy,
    pub point_mode: PointMode,
    /// Value emitted for cells with no aggregate.
    pub missing_value: f64,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            default_chart_type: "column".to_string(),
            series_separator: " / ".to_string(),
            title_separator: "_".to_string(),
            duplicates: DuplicatePolicy::Reject,
            point_mode: PointMode::Auto,
            missing_value: 0.0,
        }
    }
}

impl PivotOptions {
    /// Defaults overlaid with PIVOTS_DEFAULT_CHART_TYPE, PIVOTS_DUPLICATES and PIVOTS_POINT_MODE.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        if let Some(v) = lookup("PIVOTS_DEFAULT_CHART_TYPE") {
            if !v.trim().is_empty() { opts.default_chart_type = v.trim().to_string(); }
        }
        if let Some(v) = lookup("PIVOTS_DUPLICATES") {
            match v.trim().to_ascii_lowercase().as_str() {
                "mean" => opts.duplicates = DuplicatePolicy::Mean,
                "reject" => opts.duplicates = DuplicatePolicy::Reject,
                other => debug!(target: "pivots::config", "ignoring PIVOTS_DUPLICATES='{}'", other),
            }
        }
        if let Some(v) = lookup("PIVOTS_POINT_MODE") {
            match v.trim().to_ascii_lowercase().as_str() {
                "auto" => opts.point_mode = PointMode::Auto,
                "values" => opts.point_mode = PointMode::Values,
                "pairs" => opts.point_mode = PointMode::Pairs,
                other => debug!(target: "pivots::config", "ignoring PIVOTS_POINT_MODE='{}'", other),
            }
        }
        opts
    }
}
