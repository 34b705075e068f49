use chrono::NaiveDate;
use thiserror::Error;

use crate::core::period::{Granularity, ReportKind};

/// A malformed or out-of-range period selector. Raised before any data
/// fetch; the message names the offending field and the accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u32),
    #[error("quarter must be between 1 and 4, got {0}")]
    QuarterOutOfRange(u32),
    #[error("year must be between 1970 and 9999, got {0}")]
    YearOutOfRange(i32),
    #[error("start date {start} is not before end date {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    #[error("unknown group-by dimension '{0}' (expected service, account, region, or tag)")]
    UnknownDimension(String),
    #[error("--tag-key is required when grouping by tag")]
    MissingTagKey,
    #[error("unknown granularity '{0}' (expected daily, monthly, or quarterly)")]
    UnknownGranularity(String),
    #[error("{granularity} granularity is not supported for {kind} reports")]
    UnsupportedGranularity {
        kind: ReportKind,
        granularity: Granularity,
    },
}

/// A cost data fetch failure. `retriable` distinguishes throttling-class
/// errors, which the caller's environment may retry with backoff, from
/// authorization or malformed-response failures, which it must not.
/// The core itself never retries.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DataSourceError {
    pub message: String,
    pub retriable: bool,
}

impl DataSourceError {
    pub fn throttled(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retriable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retriable: false,
        }
    }
}

/// Any failure the report pipeline can surface. An invocation either
/// produces a complete `ReportModel` or one of these; there is no partial
/// report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cost data fetch failed: {0}")]
    DataSource(#[from] DataSourceError),
    /// An aggregation or build invariant was violated. Always a defect;
    /// surfaced verbatim, never patched with a default.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
}
