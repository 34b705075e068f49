use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::dimension::Dimension;
use crate::core::period::{Granularity, PeriodKey, TimeWindow};

/// One row of the pivoted breakdown: amounts for every group key in this
/// sub-period, parallel to `GroupedSeries::columns`, plus the row total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub period: PeriodKey,
    pub amounts: Vec<f64>,
    pub total: f64,
}

/// Rectangular pivoted breakdown: sub-periods as rows, group keys as
/// columns. Every column appears in every row; cells with no underlying
/// records hold 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSeries {
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

/// Per-group total over the full window, with share of the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub group: String,
    pub total: f64,
    pub percentage: f64,
}

/// Ranked per-group totals: descending by total, ties ascending by group
/// key. `grand_total` is the sum over all groups and sub-periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
    pub grand_total: f64,
}

/// The largest-total groups, at most five, with the remainder folded
/// into an "Other" entry when more than five groups exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopDrivers {
    pub entries: Vec<SummaryEntry>,
}

/// Report metadata: the original tools' "Report Info" sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub generated_at: DateTime<Utc>,
    pub period_label: String,
    pub dimension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
    pub notes: Vec<String>,
}

/// The complete report: everything a renderer needs, nothing it may
/// mutate. Built once per invocation and consumed once.
#[derive(Debug, Clone, Serialize)]
pub struct ReportModel {
    pub window: TimeWindow,
    pub granularity: Granularity,
    pub dimension: Dimension,
    pub series: GroupedSeries,
    pub summary: Summary,
    pub top_drivers: TopDrivers,
    pub meta: ReportMeta,
}
