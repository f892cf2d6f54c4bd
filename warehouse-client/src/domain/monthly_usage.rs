use time::Date;

/// One month of aggregated usage for a single customer segment.
///
/// `usage_month` is the first day of the calendar month. The warehouse
/// guarantees at most one row per (usage_month, customer_type) pair.
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthlyUsageRecord {
    pub usage_month: Date,
    pub customer_type: String,
    pub total_kwh: f64,
    pub active_customers: i64,
}
