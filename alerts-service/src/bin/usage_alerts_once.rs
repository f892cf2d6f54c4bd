//! One-shot invocation of the usage trends job, for cron or manual re-runs.
//! Takes an optional target month (`YYYY-MM-DD`, first of month) as the
//! single argument; prints the run result as JSON.

use alerts_service::{
    config::AppConfig,
    job::UsageTrendsJob,
    notifier::EmailNotifier,
    observability,
    source::WarehouseSource,
};
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use time::{format_description::well_known::Iso8601, Date};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let target_month = match std::env::args().nth(1) {
        Some(arg) => Some(
            Date::parse(&arg, &Iso8601::DEFAULT)
                .map_err(|e| anyhow::anyhow!("invalid target month '{arg}': {e}"))?,
        ),
        None => None,
    };

    let pool = PgPoolOptions::new()
        .max_connections(cfg.warehouse.max_connections)
        .connect(&cfg.warehouse.uri)
        .await?;

    let job = UsageTrendsJob::new(
        WarehouseSource::new(pool),
        EmailNotifier::from_config(&cfg.email),
        cfg.analysis.clone(),
    );

    match job.run(target_month).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "usage trends run failed");
            println!(
                "{}",
                serde_json::to_string_pretty(&alerts_service::job::RunResult::error(e.to_string()))?
            );
            std::process::exit(1);
        }
    }
}
