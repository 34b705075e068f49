use colored::{control, Colorize};

use crate::core::formatter::{format_money, format_percent, percent_bar};
use crate::core::models::report::ReportModel;

const BAR_WIDTH: usize = 12;
const GROUP_WIDTH: usize = 28;

/// Render a full report as a colored (or plain) terminal block.
///
/// Layout:
/// ```text
///  AWS Cost Report - January 2025
///   Window     2025-01-01 to 2025-01-31
///   Group by   Service
///   Total      $1,234.56
///
///   Top drivers
///    EC2            $500.00   40.5%  [█████░░░░░░░]
///    ...
///
///   By period
///    2025-01-01     $40.12
///    ...
/// ```
pub fn render_report(model: &ReportModel, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();

    let header = format!(" AWS Cost Report - {}", model.meta.period_label);
    lines.push(header.bold().to_string());

    lines.push(format!(
        "  {}     {} to {}",
        "Window".cyan(),
        model.window.start,
        model.window.last_day()
    ));
    let dimension = match &model.meta.tag_key {
        Some(key) => format!("{} ({})", model.meta.dimension, key),
        None => model.meta.dimension.clone(),
    };
    lines.push(format!("  {}   {}", "Group by".cyan(), dimension));
    lines.push(format!(
        "  {}    {} {} x {} groups",
        "Buckets".cyan(),
        model.series.rows.len(),
        model.granularity,
        model.series.columns.len()
    ));
    lines.push(format!(
        "  {}      {}",
        "Total".cyan(),
        format_money(model.summary.grand_total)
    ));

    if model.summary.entries.is_empty() {
        lines.push(String::new());
        lines.push("  No cost data for this period.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push(format!("  {}", "Top drivers".cyan()));
    for entry in &model.top_drivers.entries {
        lines.push(format!(
            "   {:<width$} {:>12}  {:>6}  {}",
            entry.group,
            format_money(entry.total),
            format_percent(entry.percentage),
            percent_bar(entry.percentage, BAR_WIDTH),
            width = GROUP_WIDTH
        ));
    }

    lines.push(String::new());
    lines.push(format!("  {}", "By period".cyan()));
    for row in &model.series.rows {
        lines.push(format!(
            "   {:<width$} {:>12}",
            row.period.label(),
            format_money(row.total),
            width = GROUP_WIDTH
        ));
    }

    lines.push(String::new());
    lines.push(format!("  {}", "Notes".cyan()));
    for note in &model.meta.notes {
        lines.push(format!("   - {}", note));
    }

    lines.join("\n")
}
