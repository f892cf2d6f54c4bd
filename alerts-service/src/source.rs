use sqlx::PgPool;
use warehouse_client::domain::MonthlyUsageRecord;

#[derive(thiserror::Error, Debug)]
#[error("usage data fetch failed: {0}")]
pub struct DataFetchError(pub String);

/// Supplies the trailing window of monthly aggregates the analyzer works on.
/// Returning no rows is valid; the job degrades to an empty alert set.
#[async_trait::async_trait]
pub trait UsageDataSource: Send + Sync {
    async fn monthly_usage(
        &self,
        window_months: u32,
    ) -> Result<Vec<MonthlyUsageRecord>, DataFetchError>;
}

/// Production source backed by the usage warehouse over pgwire.
pub struct WarehouseSource {
    pool: PgPool,
}

impl WarehouseSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UsageDataSource for WarehouseSource {
    async fn monthly_usage(
        &self,
        window_months: u32,
    ) -> Result<Vec<MonthlyUsageRecord>, DataFetchError> {
        warehouse_client::db::monthly_segment_usage(&self.pool, window_months)
            .await
            .map_err(|e| DataFetchError(e.to_string()))
    }
}
