use chrono::{Datelike, Duration, NaiveDate};
use serde::{Serialize, Serializer};

use crate::core::error::ValidationError;
use crate::core::models::record::CostRecord;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ── Report kind and granularity ───────────────────────────────────────

/// The four report cadences, one per original reporting tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// Sub-period size used for time bucketing within the report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
    Quarterly,
}

impl Granularity {
    pub fn parse(id: &str) -> Result<Self, ValidationError> {
        match id.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(ValidationError::UnknownGranularity(other.to_string())),
        }
    }

    /// The granularity requested from the cost API. Quarterly buckets are
    /// built client-side from monthly data; the API itself only speaks
    /// daily and monthly.
    pub fn fetch_granularity(&self) -> FetchGranularity {
        match self {
            Self::Daily => FetchGranularity::Daily,
            Self::Monthly | Self::Quarterly => FetchGranularity::Monthly,
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        };
        f.write_str(name)
    }
}

/// Granularity accepted by the cost-query API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchGranularity {
    Daily,
    Monthly,
}

// ── Period keys ───────────────────────────────────────────────────────

/// Identifier of one sub-period bucket. Ordering is chronological within
/// a report (a report never mixes variants after resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
}

impl PeriodKey {
    /// Human label matching the original report renderings:
    /// `2025-01-15`, `January 2025`, `Q1 2025`.
    pub fn label(&self) -> String {
        match self {
            Self::Day(date) => date.format("%Y-%m-%d").to_string(),
            Self::Month { year, month } => {
                format!("{} {}", MONTH_NAMES[(month - 1) as usize], year)
            }
            Self::Quarter { year, quarter } => format!("Q{} {}", quarter, year),
        }
    }

    /// The quarter this key falls in.
    pub fn quarter(&self) -> PeriodKey {
        match self {
            Self::Day(date) => Self::Quarter {
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
            },
            Self::Month { year, month } => Self::Quarter {
                year: *year,
                quarter: (month - 1) / 3 + 1,
            },
            Self::Quarter { .. } => self.clone(),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

// ── Time window ───────────────────────────────────────────────────────

/// Half-open date range: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Last day covered by the window (`end` is exclusive).
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }
}

// ── Resolution ────────────────────────────────────────────────────────

/// Optional explicit period selectors from the CLI; anything omitted
/// falls back to the kind's default relative to the injected `today`.
#[derive(Debug, Clone, Default)]
pub struct PeriodSelectors {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub quarter: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub granularity: Option<Granularity>,
}

/// A fully resolved report period: the fetch window, the ordered
/// sub-period buckets, and the bucketing granularity.
#[derive(Debug, Clone)]
pub struct ResolvedPeriod {
    pub window: TimeWindow,
    pub sub_periods: Vec<PeriodKey>,
    pub granularity: Granularity,
    pub label: String,
}

/// Resolve a report request into a concrete window and sub-period list.
///
/// `today` is injected rather than read from a global clock so the
/// defaults (previous month, current quarter, last 30 days) stay
/// deterministic under test.
pub fn resolve(
    kind: ReportKind,
    selectors: &PeriodSelectors,
    today: NaiveDate,
) -> Result<ResolvedPeriod, ValidationError> {
    match kind {
        ReportKind::Daily => resolve_daily(selectors, today),
        ReportKind::Monthly => resolve_monthly(selectors, today),
        ReportKind::Quarterly => resolve_quarterly(selectors, today),
        ReportKind::Yearly => resolve_yearly(selectors, today),
    }
}

fn resolve_daily(
    selectors: &PeriodSelectors,
    today: NaiveDate,
) -> Result<ResolvedPeriod, ValidationError> {
    let start = selectors.start.unwrap_or(today - Duration::days(30));
    let end = selectors.end.unwrap_or(today);
    let window = TimeWindow::new(start, end)?;
    let label = format!("{} to {}", window.start, window.last_day());
    Ok(ResolvedPeriod {
        sub_periods: days_in(&window),
        window,
        granularity: Granularity::Daily,
        label,
    })
}

fn resolve_monthly(
    selectors: &PeriodSelectors,
    today: NaiveDate,
) -> Result<ResolvedPeriod, ValidationError> {
    // Default is the previous calendar month; January wraps to December
    // of the prior year. An explicit month without a year reads as a
    // month of the current year.
    let (default_month, default_year) = if today.month() == 1 {
        (12, today.year() - 1)
    } else {
        (today.month() - 1, today.year())
    };
    let month = selectors.month.unwrap_or(default_month);
    let year = selectors.year.unwrap_or(if selectors.month.is_none() {
        default_year
    } else {
        today.year()
    });
    validate_month(month)?;
    validate_year(year)?;

    let start = first_of_month(year, month);
    let window = TimeWindow::new(start, first_of_next_month(year, month))?;
    let label = format!("{} {}", MONTH_NAMES[(month - 1) as usize], year);
    Ok(ResolvedPeriod {
        sub_periods: days_in(&window),
        window,
        granularity: Granularity::Daily,
        label,
    })
}

fn resolve_quarterly(
    selectors: &PeriodSelectors,
    today: NaiveDate,
) -> Result<ResolvedPeriod, ValidationError> {
    let quarter = selectors
        .quarter
        .unwrap_or((today.month() - 1) / 3 + 1);
    let year = selectors.year.unwrap_or(today.year());
    validate_quarter(quarter)?;
    validate_year(year)?;

    let granularity = selectors.granularity.unwrap_or(Granularity::Monthly);
    if granularity == Granularity::Quarterly {
        return Err(ValidationError::UnsupportedGranularity {
            kind: ReportKind::Quarterly,
            granularity,
        });
    }

    let window = quarter_window(year, quarter)?;
    let sub_periods = match granularity {
        Granularity::Daily => days_in(&window),
        _ => months_in(&window),
    };
    Ok(ResolvedPeriod {
        window,
        sub_periods,
        granularity,
        label: format!("Q{} {}", quarter, year),
    })
}

fn resolve_yearly(
    selectors: &PeriodSelectors,
    today: NaiveDate,
) -> Result<ResolvedPeriod, ValidationError> {
    let year = selectors.year.unwrap_or(today.year() - 1);
    validate_year(year)?;

    let granularity = selectors.granularity.unwrap_or(Granularity::Monthly);
    if granularity == Granularity::Daily {
        return Err(ValidationError::UnsupportedGranularity {
            kind: ReportKind::Yearly,
            granularity,
        });
    }

    let window = TimeWindow::new(first_of_month(year, 1), first_of_month(year + 1, 1))?;
    let sub_periods = match granularity {
        Granularity::Quarterly => (1..=4)
            .map(|quarter| PeriodKey::Quarter { year, quarter })
            .collect(),
        _ => months_in(&window),
    };
    Ok(ResolvedPeriod {
        window,
        sub_periods,
        granularity,
        label: year.to_string(),
    })
}

// ── Calendar helpers ──────────────────────────────────────────────────

fn validate_month(month: u32) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::MonthOutOfRange(month));
    }
    Ok(())
}

fn validate_quarter(quarter: u32) -> Result<(), ValidationError> {
    if !(1..=4).contains(&quarter) {
        return Err(ValidationError::QuarterOutOfRange(quarter));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<(), ValidationError> {
    if !(1970..=9999).contains(&year) {
        return Err(ValidationError::YearOutOfRange(year));
    }
    Ok(())
}

/// First day of a month already validated to be in 1..=12.
fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid date")
}

fn first_of_next_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    }
}

/// Window of a quarter: Q1 = {1,2,3} .. Q4 = {10,11,12}.
fn quarter_window(year: i32, quarter: u32) -> Result<TimeWindow, ValidationError> {
    let start_month = (quarter - 1) * 3 + 1;
    let start = first_of_month(year, start_month);
    let end = if quarter == 4 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, start_month + 3)
    };
    TimeWindow::new(start, end)
}

/// Every day of the window, in order.
fn days_in(window: &TimeWindow) -> Vec<PeriodKey> {
    let mut days = Vec::new();
    let mut current = window.start;
    while current < window.end {
        days.push(PeriodKey::Day(current));
        current = current + Duration::days(1);
    }
    days
}

/// Every month touched by the window, in order. The window is expected
/// to sit on month boundaries (all callers resolve it that way).
fn months_in(window: &TimeWindow) -> Vec<PeriodKey> {
    let mut months = Vec::new();
    let (mut year, mut month) = (window.start.year(), window.start.month());
    while first_of_month(year, month) < window.end {
        months.push(PeriodKey::Month { year, month });
        let next = first_of_next_month(year, month);
        year = next.year();
        month = next.month();
    }
    months
}

/// Re-bucket records onto quarter keys. Used for yearly reports at
/// quarterly granularity, where the API is queried monthly; the
/// aggregator sums records sharing a key, so remapping is enough.
pub fn rollup_to_quarters(records: Vec<CostRecord>) -> Vec<CostRecord> {
    records
        .into_iter()
        .map(|record| CostRecord {
            period: record.period.quarter(),
            ..record
        })
        .collect()
}
