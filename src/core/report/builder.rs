use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::core::dimension::Dimension;
use crate::core::error::ReportError;
use crate::core::models::report::{ReportMeta, ReportModel};
use crate::core::period::{Granularity, TimeWindow};
use crate::core::report::aggregate::Aggregation;

/// Assemble the final report model from the aggregated structures.
///
/// `now` is injected so the generation timestamp never depends on a
/// global clock read. The returned model is immutable; the renderer
/// only reads it.
pub fn build(
    window: TimeWindow,
    granularity: Granularity,
    dimension: Dimension,
    period_label: String,
    aggregation: Aggregation,
    now: DateTime<Utc>,
) -> Result<ReportModel, ReportError> {
    check_symmetric_keys(&aggregation)?;

    let meta = ReportMeta {
        generated_at: now,
        period_label,
        dimension: dimension.label().to_string(),
        tag_key: dimension.tag_key().map(str::to_string),
        notes: availability_notes(&dimension),
    };

    Ok(ReportModel {
        window,
        granularity,
        dimension,
        series: aggregation.series,
        summary: aggregation.summary,
        top_drivers: aggregation.top_drivers,
        meta,
    })
}

/// Every group key in the summary must appear as a series column and
/// vice versa. A mismatch means the aggregation itself is broken, so it
/// is surfaced as a defect rather than patched over.
fn check_symmetric_keys(aggregation: &Aggregation) -> Result<(), ReportError> {
    let series_keys: HashSet<&str> = aggregation
        .series
        .columns
        .iter()
        .map(String::as_str)
        .collect();
    let summary_keys: HashSet<&str> = aggregation
        .summary
        .entries
        .iter()
        .map(|entry| entry.group.as_str())
        .collect();

    if series_keys == summary_keys {
        return Ok(());
    }

    let mut missing_in_summary: Vec<&str> =
        series_keys.difference(&summary_keys).copied().collect();
    let mut missing_in_series: Vec<&str> =
        summary_keys.difference(&series_keys).copied().collect();
    missing_in_summary.sort_unstable();
    missing_in_series.sort_unstable();

    Err(ReportError::InternalConsistency(format!(
        "summary/series key mismatch (missing in summary: [{}]; missing in series: [{}])",
        missing_in_summary.join(", "),
        missing_in_series.join(", "),
    )))
}

/// Fixed data-availability caveats carried by every report, matching the
/// notes the original tools stamped on their info sheet.
fn availability_notes(dimension: &Dimension) -> Vec<String> {
    vec![
        "Cost data comes from the Cost Explorer API and may lag by 24-48 hours".to_string(),
        "Amounts are unblended costs in USD".to_string(),
        format!("Costs are grouped by {}", dimension.label().to_lowercase()),
    ]
}
