use anyhow::Result;

use crate::core::models::report::ReportModel;

/// Serialize the whole report model as JSON.
pub fn json_string(model: &ReportModel, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(model)?
    } else {
        serde_json::to_string(model)?
    };
    Ok(json)
}

/// Serialize the report as sectioned CSV: metadata, the pivoted
/// breakdown, the ranked summary, and the top drivers, separated by
/// blank lines. Amounts keep two-decimal currency semantics.
pub fn csv_string(model: &ReportModel) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    // Metadata block, the original tools' report-info sheet.
    let title = format!("AWS Cost Report - {}", model.meta.period_label);
    writer.write_record(["Report", title.as_str()])?;
    writer.write_record(["Generated", model.meta.generated_at.to_rfc3339().as_str()])?;
    let window = format!("{} to {}", model.window.start, model.window.last_day());
    writer.write_record(["Window", window.as_str()])?;
    writer.write_record(["Group by", model.meta.dimension.as_str()])?;
    if let Some(key) = &model.meta.tag_key {
        writer.write_record(["Tag key", key.as_str()])?;
    }
    writer.write_record(["Total", format!("{:.2}", model.summary.grand_total).as_str()])?;
    for note in &model.meta.notes {
        writer.write_record(["Note", note.as_str()])?;
    }
    writer.write_record([""])?;

    // Pivoted breakdown: one row per sub-period, one column per group.
    let mut header = vec!["Period".to_string()];
    header.extend(model.series.columns.iter().cloned());
    header.push("Total".to_string());
    writer.write_record(&header)?;
    for row in &model.series.rows {
        let mut record = vec![row.period.label()];
        record.extend(row.amounts.iter().map(|amount| format!("{:.2}", amount)));
        record.push(format!("{:.2}", row.total));
        writer.write_record(&record)?;
    }
    writer.write_record([""])?;

    // Ranked summary with percentages.
    writer.write_record(["Group", "Total", "Percentage"])?;
    for entry in &model.summary.entries {
        let total = format!("{:.2}", entry.total);
        let percentage = format!("{:.2}%", entry.percentage);
        writer.write_record([entry.group.as_str(), total.as_str(), percentage.as_str()])?;
    }
    let grand_total = format!("{:.2}", model.summary.grand_total);
    let grand_pct = if model.summary.grand_total != 0.0 {
        "100.00%"
    } else {
        "0.00%"
    };
    writer.write_record(["Total", grand_total.as_str(), grand_pct])?;
    writer.write_record([""])?;

    // Top drivers, residual included.
    writer.write_record(["Top driver", "Total", "Percentage"])?;
    for entry in &model.top_drivers.entries {
        let total = format!("{:.2}", entry.total);
        let percentage = format!("{:.2}%", entry.percentage);
        writer.write_record([entry.group.as_str(), total.as_str(), percentage.as_str()])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}
