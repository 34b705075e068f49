pub mod cost_explorer;

pub use cost_explorer::CostExplorerSource;

use crate::core::error::DataSourceError;
use crate::core::models::record::{CostQuery, CostRecord};

/// A billing data backend. Returns the complete record set for a query
/// or fails outright; there are no partial results and no retries at
/// this seam (throttling-class failures are flagged retriable for the
/// caller's environment to handle).
pub trait CostSource {
    fn fetch(
        &self,
        query: &CostQuery,
    ) -> impl std::future::Future<Output = Result<Vec<CostRecord>, DataSourceError>> + Send;
}
