use std::{net::SocketAddr, sync::Arc};

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use time::Date;

use crate::job::{RunResult, UsageTrendsJob};
use crate::notifier::Notifier;
use crate::source::UsageDataSource;

/// Optional trigger body. Schedulers normally POST with no body at all and
/// get the latest complete month; an explicit month supports re-runs.
#[derive(Debug, Default, serde::Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub target_month: Option<Date>,
}

pub fn router<S, N>(job: Arc<UsageTrendsJob<S, N>>) -> Router
where
    S: UsageDataSource + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/run/usage-trends", post(run_usage_trends::<S, N>))
        .with_state(job)
}

/// Bind and serve the trigger endpoint until shutdown.
pub async fn serve<S, N>(bind_addr: &str, job: Arc<UsageTrendsJob<S, N>>) -> anyhow::Result<()>
where
    S: UsageDataSource + 'static,
    N: Notifier + 'static,
{
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid trigger.http_bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "usage trends trigger listening");
    axum::serve(listener, router(job).into_make_service()).await?;
    Ok(())
}

/// An absent or blank body means "run against the default month". A body
/// that is present but does not parse is a client error; defaulting it
/// away would evaluate (and possibly email) the wrong month.
fn parse_trigger_body(body: &[u8]) -> Result<Option<Date>, serde_json::Error> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    let req: TriggerRequest = serde_json::from_slice(body)?;
    Ok(req.target_month)
}

async fn run_usage_trends<S, N>(
    State(job): State<Arc<UsageTrendsJob<S, N>>>,
    body: Bytes,
) -> (StatusCode, Json<RunResult>)
where
    S: UsageDataSource + 'static,
    N: Notifier + 'static,
{
    metrics::counter!("usage_alerts_trigger_requests_total").increment(1);

    let target_month = match parse_trigger_body(&body) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed trigger request");
            return (
                StatusCode::BAD_REQUEST,
                Json(RunResult::error(format!("invalid trigger request: {e}"))),
            );
        }
    };

    match job.run(target_month).await {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(e) => {
            metrics::counter!("usage_alerts_failed_runs_total").increment(1);
            tracing::error!(error = %e, "error in usage trends alert run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunResult::error(e.to_string())),
            )
        }
    }
}
