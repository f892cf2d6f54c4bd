use std::collections::HashMap;
use std::fmt;

use time::Date;
use warehouse_client::domain::MonthlyUsageRecord;

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    HighGrowthAlert,
    LowGrowthAlert,
    InsufficientData,
    Normal,
}

impl AlertStatus {
    /// Only growth anomalies make it into the report; INSUFFICIENT_DATA and
    /// NORMAL are computed but never delivered.
    pub fn is_alert_worthy(&self) -> bool {
        matches!(self, Self::HighGrowthAlert | Self::LowGrowthAlert)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::Warning => 2,
            Self::Info => 3,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// A segment's usage for the target month joined against the same segment
/// exactly 12 months earlier.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrendRecord {
    pub usage_month: Date,
    pub customer_type: String,
    pub current_month_kwh: f64,
    pub customers_active: i64,
    /// None when the prior-year comparator is missing or had zero kWh.
    pub yoy_change_pct: Option<f64>,
    pub alert_status: AlertStatus,
    pub alert_severity: AlertSeverity,
}

impl TrendRecord {
    /// One-line narrative used in the report body and the result payload.
    pub fn alert_message(&self) -> String {
        format!(
            "{} segment: {:.1}% YoY growth ({:.0} kWh total)",
            self.customer_type,
            self.yoy_change_pct.unwrap_or_default(),
            self.current_month_kwh,
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("duplicate usage record for segment '{segment}' in {year}-{month:02}")]
    DuplicateRecord { segment: String, year: i32, month: u8 },
}

fn month_key(d: Date) -> (i32, u8) {
    (d.year(), d.month() as u8)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn classify(yoy_change_pct: Option<f64>, cfg: &AnalysisConfig) -> (AlertStatus, AlertSeverity) {
    match yoy_change_pct {
        None => (AlertStatus::InsufficientData, AlertSeverity::Info),
        Some(pct) if pct > cfg.high_growth_pct => {
            (AlertStatus::HighGrowthAlert, AlertSeverity::Critical)
        }
        // Fires for declines too: any signed change below the low threshold
        // is one LOW_GROWTH_ALERT bucket. Intentional, inherited rule set.
        Some(pct) if pct < cfg.low_growth_pct => {
            (AlertStatus::LowGrowthAlert, AlertSeverity::Warning)
        }
        Some(_) => (AlertStatus::Normal, AlertSeverity::Info),
    }
}

/// Evaluate year-over-year trends for every segment present in the target
/// month.
///
/// Pure: same records, target month, and thresholds always yield the same
/// output in the same order (customer_type ascending). The comparator lookup
/// is an exact (segment, year - 1, month) map hit, not a positional offset,
/// so input ordering does not matter. A duplicate (segment, month) pair in
/// the input is a data defect and fails the analysis outright.
pub fn evaluate_month(
    records: &[MonthlyUsageRecord],
    target_month: Date,
    cfg: &AnalysisConfig,
) -> Result<Vec<TrendRecord>, AnalysisError> {
    let mut by_key: HashMap<(&str, i32, u8), &MonthlyUsageRecord> = HashMap::new();
    for rec in records {
        let (year, month) = month_key(rec.usage_month);
        if by_key
            .insert((rec.customer_type.as_str(), year, month), rec)
            .is_some()
        {
            return Err(AnalysisError::DuplicateRecord {
                segment: rec.customer_type.clone(),
                year,
                month,
            });
        }
    }

    let (target_year, target_month_num) = month_key(target_month);

    let mut current: Vec<&MonthlyUsageRecord> = records
        .iter()
        .filter(|r| month_key(r.usage_month) == (target_year, target_month_num))
        .collect();
    current.sort_by(|a, b| a.customer_type.cmp(&b.customer_type));

    let trends = current
        .into_iter()
        .map(|rec| {
            let comparator =
                by_key.get(&(rec.customer_type.as_str(), target_year - 1, target_month_num));

            let yoy_change_pct = match comparator {
                Some(prior) if prior.total_kwh != 0.0 => {
                    Some(round2((rec.total_kwh - prior.total_kwh) / prior.total_kwh * 100.0))
                }
                // Missing comparator and a zero-kWh comparator are treated
                // identically: no meaningful percentage exists.
                _ => None,
            };

            let (alert_status, alert_severity) = classify(yoy_change_pct, cfg);

            TrendRecord {
                usage_month: rec.usage_month,
                customer_type: rec.customer_type.clone(),
                current_month_kwh: rec.total_kwh,
                customers_active: rec.active_customers,
                yoy_change_pct,
                alert_status,
                alert_severity,
            }
        })
        .collect();

    Ok(trends)
}

/// Keep only the records worth alerting on.
pub fn alert_worthy(trends: Vec<TrendRecord>) -> Vec<TrendRecord> {
    trends
        .into_iter()
        .filter(|t| t.alert_status.is_alert_worthy())
        .collect()
}
