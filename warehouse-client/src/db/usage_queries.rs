use anyhow::Result;
use sqlx::PgPool;

use crate::domain::MonthlyUsageRecord;

/// Aggregate the daily usage fact table into monthly kWh totals per customer
/// segment over a trailing window.
///
/// The window is anchored at the warehouse's current date and must span at
/// least 13 months for any year-over-year comparison on the most recent month
/// to have a comparator; callers normally pass 25 to cover a full two-year
/// trend view.
pub async fn monthly_segment_usage(
    pool: &PgPool,
    window_months: u32,
) -> Result<Vec<MonthlyUsageRecord>> {
    let rows = sqlx::query_as::<_, MonthlyUsageRecord>(
        r#"
        SELECT
            DATE_TRUNC('month', usage_date)::date        AS usage_month,
            customer_type,
            ROUND(SUM(kwh_used)::numeric, 2)::float8     AS total_kwh,
            COUNT(DISTINCT customer_id)                  AS active_customers
        FROM daily_usage_facts
        WHERE usage_date >= CURRENT_DATE - make_interval(months => $1)
        GROUP BY DATE_TRUNC('month', usage_date), customer_type
        ORDER BY usage_month, customer_type
        "#,
    )
    .bind(window_months as i32)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
