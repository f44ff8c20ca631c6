use crate::models::{Dimension, Measure};
use crate::query_variables::DEFAULT_PAGINATION_SIZE;
use serde::{Deserialize, Serialize};

/// Deepest drilldown path the charts offer
pub const DEFAULT_MAX_DRILL_DEPTH: usize = 4;

/// Tunables of a statistics view. Every field falls back to its default
/// when missing from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub max_drill_depth: usize,
    pub pagination_size: u32,
    pub default_base: Dimension,
    pub default_measure: Measure,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_drill_depth: DEFAULT_MAX_DRILL_DEPTH,
            pagination_size: DEFAULT_PAGINATION_SIZE,
            default_base: Dimension::CategoryName,
            default_measure: Measure::BoxesCount,
        }
    }
}
