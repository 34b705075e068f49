use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::cli::export;
use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::dimension::Dimension;
use crate::core::error::ReportError;
use crate::core::models::record::CostQuery;
use crate::core::models::report::ReportModel;
use crate::core::period::{self, Granularity, PeriodSelectors, ReportKind, ResolvedPeriod};
use crate::core::report::{aggregate::aggregate, builder};
use crate::core::source::{CostExplorerSource, CostSource};

/// Flags shared by all four report subcommands.
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    pub group_by: Option<String>,
    pub tag_key: Option<String>,
    pub output: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
}

pub async fn run(
    kind: ReportKind,
    selectors: PeriodSelectors,
    args: ReportArgs,
    opts: &OutputOptions,
) -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();

    // CLI flags win over config defaults. Validation happens before the
    // source is even constructed, so a bad selector never hits the
    // network.
    let group_by = args
        .group_by
        .unwrap_or_else(|| config.report.group_by.clone());
    let tag_key = args.tag_key.or_else(|| config.report.tag_key.clone());
    let dimension = Dimension::parse(&group_by, tag_key)?;

    let today = Utc::now().date_naive();
    let resolved = period::resolve(kind, &selectors, today)?;
    tracing::debug!(%kind, start = %resolved.window.start, end = %resolved.window.end, "report period resolved");

    let profile = args.profile.or_else(|| config.report.profile.clone());
    let region = args.region.unwrap_or_else(|| config.report.region.clone());
    let source = CostExplorerSource::new(profile.as_deref(), &region).await;

    let model = generate(&source, resolved, dimension, Utc::now()).await?;

    let rendered = match opts.format {
        OutputFormat::Text => {
            renderer::render_report(&model, opts.use_color && args.output.is_none())
        }
        OutputFormat::Json => export::json_string(&model, opts.pretty)?,
        OutputFormat::Csv => export::csv_string(&model)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// The shared pipeline behind all four report kinds: fetch, re-bucket if
/// needed, aggregate, build. Separated from `run` so it can exercise any
/// `CostSource`, not just the AWS-backed one.
pub async fn generate<S: CostSource>(
    source: &S,
    resolved: ResolvedPeriod,
    dimension: Dimension,
    now: DateTime<Utc>,
) -> Result<ReportModel, ReportError> {
    let query = CostQuery {
        window: resolved.window.clone(),
        dimension: dimension.clone(),
        granularity: resolved.granularity.fetch_granularity(),
    };
    let records = source.fetch(&query).await?;
    let records = if resolved.granularity == Granularity::Quarterly {
        period::rollup_to_quarters(records)
    } else {
        records
    };

    let aggregation = aggregate(&records, &resolved.sub_periods);
    builder::build(
        resolved.window,
        resolved.granularity,
        dimension,
        resolved.label,
        aggregation,
        now,
    )
}
