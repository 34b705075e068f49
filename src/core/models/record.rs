use serde::Serialize;

use crate::core::dimension::Dimension;
use crate::core::period::{FetchGranularity, PeriodKey, TimeWindow};

/// Group key used when a tag-grouped record has no value for the key.
pub const NO_TAG_LABEL: &str = "(no tag)";

/// Group key of the synthetic residual bucket in the top-driver list.
pub const OTHER_LABEL: &str = "Other";

/// One raw cost observation: the amount attributed to `group` within one
/// sub-period. Amounts are USD; negative values (credits, refunds) are
/// valid data and are never clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRecord {
    pub period: PeriodKey,
    pub group: String,
    pub amount: f64,
}

/// What a cost data source is asked for: a window, a grouping dimension,
/// and the API-side bucketing granularity.
#[derive(Debug, Clone)]
pub struct CostQuery {
    pub window: TimeWindow,
    pub dimension: Dimension,
    pub granularity: FetchGranularity,
}
