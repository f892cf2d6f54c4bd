use std::sync::Arc;

use alerts_service::{
    config::AppConfig,
    job::UsageTrendsJob,
    notifier::EmailNotifier,
    observability,
    source::WarehouseSource,
    trigger,
};
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start the Prometheus exporter if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        observability::init_metrics(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.warehouse.max_connections)
        .connect(&cfg.warehouse.uri)
        .await?;

    let source = WarehouseSource::new(pool);
    let notifier = EmailNotifier::from_config(&cfg.email);
    let job = Arc::new(UsageTrendsJob::new(source, notifier, cfg.analysis.clone()));

    trigger::serve(&cfg.trigger.http_bind_addr, job).await
}
