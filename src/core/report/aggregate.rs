use std::collections::{HashMap, HashSet};

use crate::core::models::record::{CostRecord, OTHER_LABEL};
use crate::core::models::report::{
    GroupedSeries, SeriesRow, Summary, SummaryEntry, TopDrivers,
};
use crate::core::period::PeriodKey;

/// How many groups the top-driver list names before folding the rest
/// into "Other".
pub const TOP_DRIVER_COUNT: usize = 5;

/// Everything the aggregator produces for one report window.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub series: GroupedSeries,
    pub summary: Summary,
    pub top_drivers: TopDrivers,
}

/// Reshape raw cost records into the pivoted breakdown, ranked summary,
/// and top-driver list for the given sub-periods.
///
/// Pure function of its inputs: no I/O, no clock, no randomness.
/// Identical inputs yield identical output, including ordering.
/// Records whose period is not in `sub_periods` fall outside the window
/// and are ignored.
pub fn aggregate(records: &[CostRecord], sub_periods: &[PeriodKey]) -> Aggregation {
    // First pass: the full group-key set (first-seen order, so column
    // layout is stable) and the (period, group) cell sums.
    let in_window: HashSet<&PeriodKey> = sub_periods.iter().collect();
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut cells: HashMap<(PeriodKey, String), f64> = HashMap::new();

    for record in records {
        if !in_window.contains(&record.period) {
            continue;
        }
        if seen.insert(record.group.clone()) {
            columns.push(record.group.clone());
        }
        *cells
            .entry((record.period.clone(), record.group.clone()))
            .or_insert(0.0) += record.amount;
    }

    // Second pass: one row per sub-period with every column present.
    // Zero groups means rows of zero columns, not a synthetic key.
    let rows: Vec<SeriesRow> = sub_periods
        .iter()
        .map(|period| {
            let amounts: Vec<f64> = columns
                .iter()
                .map(|group| {
                    cells
                        .get(&(period.clone(), group.clone()))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect();
            let total = amounts.iter().sum();
            SeriesRow {
                period: period.clone(),
                amounts,
                total,
            }
        })
        .collect();

    let summary = build_summary(&columns, &rows);
    let top_drivers = build_top_drivers(&summary);

    Aggregation {
        series: GroupedSeries { columns, rows },
        summary,
        top_drivers,
    }
}

fn build_summary(columns: &[String], rows: &[SeriesRow]) -> Summary {
    let mut entries: Vec<SummaryEntry> = columns
        .iter()
        .enumerate()
        .map(|(idx, group)| SummaryEntry {
            group: group.clone(),
            total: rows.iter().map(|row| row.amounts[idx]).sum(),
            percentage: 0.0,
        })
        .collect();

    let grand_total: f64 = entries.iter().map(|entry| entry.total).sum();
    if grand_total != 0.0 {
        for entry in &mut entries {
            entry.percentage = 100.0 * entry.total / grand_total;
        }
    }

    entries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });

    Summary {
        entries,
        grand_total,
    }
}

fn build_top_drivers(summary: &Summary) -> TopDrivers {
    let mut entries: Vec<SummaryEntry> = summary
        .entries
        .iter()
        .take(TOP_DRIVER_COUNT)
        .cloned()
        .collect();

    if summary.entries.len() > TOP_DRIVER_COUNT {
        let rest = &summary.entries[TOP_DRIVER_COUNT..];
        let total: f64 = rest.iter().map(|entry| entry.total).sum();
        let percentage = if summary.grand_total != 0.0 {
            100.0 * total / summary.grand_total
        } else {
            0.0
        };
        entries.push(SummaryEntry {
            group: OTHER_LABEL.to_string(),
            total,
            percentage,
        });
    }

    TopDrivers { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(day: u32) -> PeriodKey {
        PeriodKey::Day(NaiveDate::from_ymd_opt(2025, 1, day).unwrap())
    }

    fn record(period: PeriodKey, group: &str, amount: f64) -> CostRecord {
        CostRecord {
            period,
            group: group.to_string(),
            amount,
        }
    }

    const CENT: f64 = 0.01;

    #[test]
    fn tie_breaks_lexicographically() {
        // Two groups tying at 25 across three days.
        let periods = vec![day(1), day(2), day(3)];
        let records = vec![
            record(day(1), "A", 10.0),
            record(day(1), "B", 5.0),
            record(day(2), "A", 0.0),
            record(day(2), "B", 20.0),
            record(day(3), "A", 15.0),
            record(day(3), "B", 0.0),
        ];
        let agg = aggregate(&records, &periods);

        assert_eq!(agg.summary.entries.len(), 2);
        assert_eq!(agg.summary.entries[0].group, "A");
        assert_eq!(agg.summary.entries[1].group, "B");
        assert!((agg.summary.entries[0].total - 25.0).abs() < CENT);
        assert!((agg.summary.entries[0].percentage - 50.0).abs() < CENT);
        assert!((agg.summary.entries[1].percentage - 50.0).abs() < CENT);
    }

    #[test]
    fn empty_records_give_zero_column_rows() {
        let periods: Vec<PeriodKey> = (1..=5).map(day).collect();
        let agg = aggregate(&[], &periods);

        assert_eq!(agg.series.rows.len(), 5);
        assert!(agg.series.columns.is_empty());
        for row in &agg.series.rows {
            assert!(row.amounts.is_empty());
            assert_eq!(row.total, 0.0);
        }
        assert!(agg.summary.entries.is_empty());
        assert_eq!(agg.summary.grand_total, 0.0);
        assert!(agg.top_drivers.entries.is_empty());
    }

    #[test]
    fn zero_fill_law() {
        let periods = vec![day(1), day(2)];
        let records = vec![
            record(day(1), "EC2", 3.0),
            record(day(2), "S3", 2.0),
        ];
        let agg = aggregate(&records, &periods);

        assert_eq!(agg.series.columns, vec!["EC2", "S3"]);
        // Day 1 has no S3 record, day 2 no EC2 record.
        assert_eq!(agg.series.rows[0].amounts, vec![3.0, 0.0]);
        assert_eq!(agg.series.rows[1].amounts, vec![0.0, 2.0]);
    }

    #[test]
    fn symmetric_key_invariant() {
        let periods = vec![day(1), day(2), day(3)];
        let records = vec![
            record(day(1), "EC2", 1.0),
            record(day(2), "S3", 2.0),
            record(day(3), "Lambda", 3.0),
            record(day(3), "EC2", 4.0),
        ];
        let agg = aggregate(&records, &periods);

        let mut series_keys: Vec<&str> =
            agg.series.columns.iter().map(String::as_str).collect();
        let mut summary_keys: Vec<&str> = agg
            .summary
            .entries
            .iter()
            .map(|entry| entry.group.as_str())
            .collect();
        series_keys.sort_unstable();
        summary_keys.sort_unstable();
        assert_eq!(series_keys, summary_keys);
    }

    #[test]
    fn conservation_law() {
        let periods = vec![day(1), day(2)];
        let records = vec![
            record(day(1), "EC2", 1.25),
            record(day(1), "S3", 2.50),
            record(day(2), "EC2", 3.75),
            record(day(2), "RDS", 0.05),
        ];
        let agg = aggregate(&records, &periods);

        let input_sum: f64 = records.iter().map(|record| record.amount).sum();
        let summary_sum: f64 = agg.summary.entries.iter().map(|entry| entry.total).sum();
        assert!((summary_sum - input_sum).abs() < CENT);
        assert!((agg.summary.grand_total - input_sum).abs() < CENT);
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let periods = vec![day(1)];
        let records = vec![
            record(day(1), "EC2", 70.0),
            record(day(1), "S3", 20.0),
            record(day(1), "RDS", 10.0),
        ];
        let agg = aggregate(&records, &periods);

        let pct_sum: f64 = agg
            .summary
            .entries
            .iter()
            .map(|entry| entry.percentage)
            .sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_grand_total_means_zero_percentages() {
        let periods = vec![day(1)];
        let records = vec![
            record(day(1), "EC2", 5.0),
            record(day(1), "Credits", -5.0),
        ];
        let agg = aggregate(&records, &periods);

        assert_eq!(agg.summary.grand_total, 0.0);
        for entry in &agg.summary.entries {
            assert_eq!(entry.percentage, 0.0);
        }
    }

    #[test]
    fn top_drivers_folds_remainder_into_other() {
        // Seven groups with totals [100,90,80,70,60,10,5].
        let periods = vec![day(1)];
        let totals = [
            ("G1", 100.0),
            ("G2", 90.0),
            ("G3", 80.0),
            ("G4", 70.0),
            ("G5", 60.0),
            ("G6", 10.0),
            ("G7", 5.0),
        ];
        let records: Vec<CostRecord> = totals
            .iter()
            .map(|(group, amount)| record(day(1), group, *amount))
            .collect();
        let agg = aggregate(&records, &periods);

        assert_eq!(agg.top_drivers.entries.len(), 6);
        let named: Vec<&str> = agg
            .top_drivers
            .entries
            .iter()
            .map(|entry| entry.group.as_str())
            .collect();
        assert_eq!(named, vec!["G1", "G2", "G3", "G4", "G5", "Other"]);

        let other = agg.top_drivers.entries.last().unwrap();
        assert!((other.total - 15.0).abs() < CENT);

        let top_five_sum: f64 = agg.top_drivers.entries[..5]
            .iter()
            .map(|entry| entry.total)
            .sum();
        assert!((other.total - (agg.summary.grand_total - top_five_sum)).abs() < CENT);
    }

    #[test]
    fn no_other_row_at_five_or_fewer_groups() {
        let periods = vec![day(1)];
        let records: Vec<CostRecord> = (1..=5)
            .map(|i| record(day(1), &format!("G{}", i), i as f64))
            .collect();
        let agg = aggregate(&records, &periods);

        assert_eq!(agg.top_drivers.entries.len(), 5);
        assert!(agg
            .top_drivers
            .entries
            .iter()
            .all(|entry| entry.group != OTHER_LABEL));
    }

    #[test]
    fn determinism_law() {
        let periods = vec![day(1), day(2), day(3)];
        let records = vec![
            record(day(2), "S3", 2.0),
            record(day(1), "EC2", 1.0),
            record(day(3), "EC2", 4.0),
            record(day(1), "Lambda", 1.0),
            record(day(2), "Lambda", 1.0),
        ];
        assert_eq!(aggregate(&records, &periods), aggregate(&records, &periods));
    }

    #[test]
    fn column_order_is_first_seen() {
        let periods = vec![day(1), day(2)];
        let records = vec![
            record(day(1), "S3", 1.0),
            record(day(1), "EC2", 2.0),
            record(day(2), "S3", 3.0),
            record(day(2), "Lambda", 4.0),
        ];
        let agg = aggregate(&records, &periods);
        assert_eq!(agg.series.columns, vec!["S3", "EC2", "Lambda"]);
    }

    #[test]
    fn out_of_window_records_are_ignored() {
        let periods = vec![day(1)];
        let records = vec![
            record(day(1), "EC2", 1.0),
            record(day(9), "EC2", 99.0),
        ];
        let agg = aggregate(&records, &periods);
        assert!((agg.summary.grand_total - 1.0).abs() < CENT);
        assert_eq!(agg.series.columns, vec!["EC2"]);
    }

    #[test]
    fn repeated_cells_accumulate() {
        let periods = vec![day(1)];
        let records = vec![
            record(day(1), "EC2", 1.5),
            record(day(1), "EC2", 2.5),
        ];
        let agg = aggregate(&records, &periods);
        assert_eq!(agg.series.rows[0].amounts, vec![4.0]);
    }

    #[test]
    fn negative_amounts_pass_through_unclamped() {
        let periods = vec![day(1)];
        let records = vec![
            record(day(1), "EC2", 10.0),
            record(day(1), "Credits", -3.0),
        ];
        let agg = aggregate(&records, &periods);

        let credits = agg
            .summary
            .entries
            .iter()
            .find(|entry| entry.group == "Credits")
            .unwrap();
        assert_eq!(credits.total, -3.0);
        assert!((agg.summary.grand_total - 7.0).abs() < CENT);
    }

    #[test]
    fn row_totals_sum_their_columns() {
        let periods = vec![day(1), day(2)];
        let records = vec![
            record(day(1), "EC2", 1.0),
            record(day(1), "S3", 2.0),
            record(day(2), "EC2", 4.0),
        ];
        let agg = aggregate(&records, &periods);
        assert!((agg.series.rows[0].total - 3.0).abs() < CENT);
        assert!((agg.series.rows[1].total - 4.0).abs() < CENT);
    }
}
