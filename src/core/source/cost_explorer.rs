use aws_sdk_costexplorer::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::operation::get_cost_and_usage::GetCostAndUsageError;
use aws_sdk_costexplorer::types::{
    DateInterval, Granularity as CeGranularity, Group, GroupDefinition, GroupDefinitionType,
};
use aws_sdk_costexplorer::Client;
use chrono::{Datelike, NaiveDate};

use crate::core::dimension::Dimension;
use crate::core::error::DataSourceError;
use crate::core::models::record::{CostQuery, CostRecord, NO_TAG_LABEL};
use crate::core::period::{FetchGranularity, PeriodKey};
use crate::core::source::CostSource;

/// Cost data source backed by the AWS Cost Explorer API.
pub struct CostExplorerSource {
    client: Client,
}

impl CostExplorerSource {
    /// Build a client from the ambient AWS credential chain, with an
    /// optional named profile.
    pub async fn new(profile: Option<&str>, region: &str) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        Self {
            client: Client::new(&config),
        }
    }
}

impl CostSource for CostExplorerSource {
    async fn fetch(&self, query: &CostQuery) -> Result<Vec<CostRecord>, DataSourceError> {
        let interval = DateInterval::builder()
            .start(query.window.start.format("%Y-%m-%d").to_string())
            .end(query.window.end.format("%Y-%m-%d").to_string())
            .build()
            .map_err(|err| DataSourceError::fatal(format!("invalid date interval: {err}")))?;
        let granularity = match query.granularity {
            FetchGranularity::Daily => CeGranularity::Daily,
            FetchGranularity::Monthly => CeGranularity::Monthly,
        };

        tracing::info!(
            start = %query.window.start,
            end = %query.window.end,
            dimension = query.dimension.label(),
            "fetching cost data"
        );

        let mut records: Vec<CostRecord> = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get_cost_and_usage()
                .time_period(interval.clone())
                .granularity(granularity.clone())
                .metrics("UnblendedCost")
                .group_by(group_definition(&query.dimension));
            if let Some(token) = &next_token {
                request = request.next_page_token(token);
            }

            let response = request.send().await.map_err(map_sdk_error)?;

            for result in response.results_by_time() {
                let start = result
                    .time_period()
                    .map(|period| period.start())
                    .ok_or_else(|| {
                        DataSourceError::fatal("response result is missing its time period")
                    })?;
                let period = period_key(start, query.granularity)?;

                for group in result.groups() {
                    let raw_key = group.keys().first().ok_or_else(|| {
                        DataSourceError::fatal("response group is missing its key")
                    })?;
                    records.push(CostRecord {
                        period: period.clone(),
                        group: normalize_group_key(raw_key, &query.dimension),
                        amount: unblended_amount(group)?,
                    });
                }
            }

            next_token = response.next_page_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
            tracing::debug!("following cost data pagination token");
        }

        tracing::info!(records = records.len(), "cost data fetched");
        Ok(records)
    }
}

fn group_definition(dimension: &Dimension) -> GroupDefinition {
    let builder = GroupDefinition::builder();
    match dimension {
        Dimension::Service => builder
            .r#type(GroupDefinitionType::Dimension)
            .key("SERVICE"),
        Dimension::Account => builder
            .r#type(GroupDefinitionType::Dimension)
            .key("LINKED_ACCOUNT"),
        Dimension::Region => builder
            .r#type(GroupDefinitionType::Dimension)
            .key("REGION"),
        Dimension::Tag { key } => builder.r#type(GroupDefinitionType::Tag).key(key),
    }
    .build()
}

/// Map a result period start date onto the matching bucket key.
fn period_key(start: &str, granularity: FetchGranularity) -> Result<PeriodKey, DataSourceError> {
    let date = NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|_| {
        DataSourceError::fatal(format!("malformed period start '{start}' in response"))
    })?;
    Ok(match granularity {
        FetchGranularity::Daily => PeriodKey::Day(date),
        FetchGranularity::Monthly => PeriodKey::Month {
            year: date.year(),
            month: date.month(),
        },
    })
}

/// Clean up a raw group key from the API. Service names lose their
/// "Amazon " prefix; tag keys arrive as `key$value` and reduce to the
/// value, with an empty value standing in for untagged resources.
fn normalize_group_key(raw: &str, dimension: &Dimension) -> String {
    match dimension {
        Dimension::Service => raw.strip_prefix("Amazon ").unwrap_or(raw).to_string(),
        Dimension::Tag { .. } => {
            let value = raw.split_once('$').map(|(_, value)| value).unwrap_or(raw);
            if value.is_empty() {
                NO_TAG_LABEL.to_string()
            } else {
                value.to_string()
            }
        }
        Dimension::Account | Dimension::Region => raw.to_string(),
    }
}

fn unblended_amount(group: &Group) -> Result<f64, DataSourceError> {
    let metric = group
        .metrics()
        .and_then(|metrics| metrics.get("UnblendedCost"))
        .ok_or_else(|| {
            DataSourceError::fatal("response group is missing the UnblendedCost metric")
        })?;
    let amount = metric.amount().ok_or_else(|| {
        DataSourceError::fatal("response group has an UnblendedCost metric with no amount")
    })?;
    amount
        .parse::<f64>()
        .map_err(|_| DataSourceError::fatal(format!("unparsable cost amount '{amount}'")))
}

/// Throttling-class API errors are retriable by the caller's
/// environment; everything else (authorization, disabled API, malformed
/// request) aborts the invocation.
fn map_sdk_error<R: std::fmt::Debug>(err: SdkError<GetCostAndUsageError, R>) -> DataSourceError {
    let retriable = matches!(
        err.as_service_error(),
        Some(GetCostAndUsageError::LimitExceededException(_))
    ) || err.code() == Some("ThrottlingException");

    let message = match err.message() {
        Some(message) => message.to_string(),
        None => match err.code() {
            Some(code) => format!("Cost Explorer request failed ({code})"),
            None => format!("Cost Explorer request failed: {err:?}"),
        },
    };

    if retriable {
        DataSourceError::throttled(message)
    } else {
        DataSourceError::fatal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_prefix_is_stripped() {
        assert_eq!(
            normalize_group_key("Amazon Simple Storage Service", &Dimension::Service),
            "Simple Storage Service"
        );
        assert_eq!(
            normalize_group_key("AWS Lambda", &Dimension::Service),
            "AWS Lambda"
        );
    }

    #[test]
    fn tag_keys_reduce_to_their_value() {
        let dim = Dimension::Tag {
            key: "Team".to_string(),
        };
        assert_eq!(normalize_group_key("Team$platform", &dim), "platform");
        assert_eq!(normalize_group_key("Team$", &dim), NO_TAG_LABEL);
        assert_eq!(normalize_group_key("", &dim), NO_TAG_LABEL);
    }

    #[test]
    fn account_and_region_keys_pass_through() {
        assert_eq!(
            normalize_group_key("123456789012", &Dimension::Account),
            "123456789012"
        );
        assert_eq!(
            normalize_group_key("us-east-1", &Dimension::Region),
            "us-east-1"
        );
    }

    #[test]
    fn period_key_follows_fetch_granularity() {
        assert_eq!(
            period_key("2025-01-15", FetchGranularity::Daily).unwrap(),
            PeriodKey::Day(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
        );
        assert_eq!(
            period_key("2025-01-01", FetchGranularity::Monthly).unwrap(),
            PeriodKey::Month { year: 2025, month: 1 }
        );
    }

    #[test]
    fn malformed_period_start_is_fatal() {
        let err = period_key("January", FetchGranularity::Daily).unwrap_err();
        assert!(!err.retriable);
        assert!(err.message.contains("January"));
    }
}
