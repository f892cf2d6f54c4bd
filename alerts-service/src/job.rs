use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::config::AnalysisConfig;
use crate::notifier::{Delivery, DeliveryError, Notifier};
use crate::report::{self, ReportOutcome};
use crate::source::{DataFetchError, UsageDataSource};
use crate::trends::{self, AnalysisError, TrendRecord};

/// Everything that can fail a run. Email configuration problems are not
/// here on purpose: those are handled inside the notifier as a skip.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    DataFetch(#[from] DataFetchError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// The invocation result payload returned to the trigger (and printed by the
/// one-shot binary).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<TrendRecord>>,
}

impl RunResult {
    fn success(message: impl Into<String>, alerts: Option<Vec<TrendRecord>>) -> Self {
        Self {
            status: RunStatus::Success,
            message: message.into(),
            timestamp: now_rfc3339(),
            alerts,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            message: message.into(),
            timestamp: now_rfc3339(),
            alerts: None,
        }
    }
}

fn now_rfc3339() -> String {
    // Rfc3339 formatting of a UTC wall-clock reading cannot realistically
    // fail; the epoch placeholder keeps the payload well-formed if it does.
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// One scheduled invocation: fetch the trailing window, classify trends for
/// the target month, and deliver a report when anything is alert-worthy.
/// Stateless across runs; a single deterministic attempt with no retries.
pub struct UsageTrendsJob<S, N> {
    source: S,
    notifier: N,
    analysis: AnalysisConfig,
}

impl<S, N> UsageTrendsJob<S, N>
where
    S: UsageDataSource,
    N: Notifier,
{
    pub fn new(source: S, notifier: N, analysis: AnalysisConfig) -> Self {
        Self {
            source,
            notifier,
            analysis,
        }
    }

    /// `target_month` defaults to the most recent month in the fetched
    /// window, which is what a scheduler-driven run wants.
    pub async fn run(&self, target_month: Option<Date>) -> Result<RunResult, JobError> {
        tracing::info!("starting usage trends alert check");
        metrics::counter!("usage_alerts_runs_total").increment(1);

        let records = self.source.monthly_usage(self.analysis.window_months).await?;

        let Some(target) = target_month.or_else(|| records.iter().map(|r| r.usage_month).max())
        else {
            tracing::info!("usage window returned no rows - nothing to evaluate");
            return Ok(RunResult::success(report::NO_ALERTS_MESSAGE, None));
        };

        let trends = trends::evaluate_month(&records, target, &self.analysis)?;
        let alerts = trends::alert_worthy(trends);

        match report::build(alerts) {
            ReportOutcome::NoAlerts { message } => {
                tracing::info!(%target, "no alerts triggered - all growth rates within normal range");
                Ok(RunResult::success(message, None))
            }
            ReportOutcome::Alerts(rep) => {
                let count = rep.records.len();
                metrics::counter!("usage_alerts_flagged_segments_total").increment(count as u64);
                tracing::info!(%target, alerts = count, "found alerts to send");

                match self.notifier.deliver(&rep).await? {
                    Delivery::Sent => {
                        metrics::counter!("usage_alerts_emails_sent_total").increment(1);
                        Ok(RunResult::success(
                            format!("Sent {count} alerts"),
                            Some(rep.records),
                        ))
                    }
                    Delivery::Skipped => Ok(RunResult::success(
                        format!("Found {count} alerts; email delivery skipped"),
                        Some(rep.records),
                    )),
                }
            }
        }
    }
}
