use std::fmt::Write as _;

use crate::trends::{AlertSeverity, TrendRecord};

pub const NO_ALERTS_MESSAGE: &str = "No alerts triggered - all growth rates within normal range";

const CRITICAL_COLOR: &str = "#ff4444";
const WARNING_COLOR: &str = "#ffaa00";

/// A fully rendered alert report, ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    /// The alert-worthy records in delivery order (severity, then segment).
    pub records: Vec<TrendRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Nothing to deliver; carries the human-readable explanation.
    NoAlerts { message: String },
    Alerts(Report),
}

/// Render the alert-worthy trend records into a deliverable report.
///
/// Deterministic: records are sorted by severity rank (CRITICAL first) with
/// ties broken by customer_type ascending, and every rendered field comes
/// straight off a `TrendRecord`.
/// The table shows the percentage as computed (2 decimals); the narrative
/// line rounds to 1 decimal.
pub fn build(mut records: Vec<TrendRecord>) -> ReportOutcome {
    if records.is_empty() {
        return ReportOutcome::NoAlerts {
            message: NO_ALERTS_MESSAGE.to_string(),
        };
    }

    records.sort_by(|a, b| {
        a.alert_severity
            .rank()
            .cmp(&b.alert_severity.rank())
            .then_with(|| a.customer_type.cmp(&b.customer_type))
    });

    let subject = format!(
        "🚨 Usage Trends Alert - {} segments need attention",
        records.len()
    );

    ReportOutcome::Alerts(Report {
        subject,
        body_text: render_text(&records),
        body_html: render_html(&records),
        records,
    })
}

fn render_text(records: &[TrendRecord]) -> String {
    let mut body = String::new();
    body.push_str("Usage Trends Alert\n\n");
    body.push_str("The following customer segments have unusual year-over-year growth patterns:\n\n");

    for rec in records {
        let _ = writeln!(body, "- [{}] {}", rec.alert_severity, rec.alert_message());
    }

    body.push_str("\nRecommended actions:\n");
    body.push_str("- HIGH GROWTH (>60%): Review capacity planning and procurement contracts\n");
    body.push_str("- LOW GROWTH (<10%): Investigate potential customer churn or market changes\n");
    body.push_str("\nGenerated automatically by the usage alerts service\n");
    body
}

fn render_html(records: &[TrendRecord]) -> String {
    let mut body = String::new();
    body.push_str(
        r#"<html>
<body>
    <h2>Usage Trends Alert</h2>
    <p>The following customer segments have unusual year-over-year growth patterns:</p>

    <table border="1" style="border-collapse: collapse; margin: 20px 0;">
        <tr style="background-color: #f2f2f2;">
            <th>Customer Type</th>
            <th>YoY Growth</th>
            <th>Current Month kWh</th>
            <th>Active Customers</th>
            <th>Alert Level</th>
        </tr>
"#,
    );

    for rec in records {
        let color = if rec.alert_severity == AlertSeverity::Critical {
            CRITICAL_COLOR
        } else {
            WARNING_COLOR
        };
        let _ = write!(
            body,
            r#"        <tr>
            <td>{segment}</td>
            <td style="color: {color}; font-weight: bold;">{pct:.2}%</td>
            <td>{kwh}</td>
            <td>{customers}</td>
            <td style="color: {color};">{severity}</td>
        </tr>
"#,
            segment = rec.customer_type,
            color = color,
            pct = rec.yoy_change_pct.unwrap_or_default(),
            kwh = format_kwh(rec.current_month_kwh),
            customers = format_count(rec.customers_active),
            severity = rec.alert_severity,
        );
    }

    body.push_str(
        r#"    </table>

    <h3>Recommended Actions:</h3>
    <ul>
        <li><strong>HIGH GROWTH (&gt;60%):</strong> Review capacity planning and procurement contracts</li>
        <li><strong>LOW GROWTH (&lt;10%):</strong> Investigate potential customer churn or market changes</li>
    </ul>

    <p><em>Generated automatically by the usage alerts service</em></p>
</body>
</html>
"#,
    );
    body
}

/// kWh totals are shown rounded to whole units with thousands separators.
fn format_kwh(kwh: f64) -> String {
    format_count(kwh.round() as i64)
}

fn format_count(n: i64) -> String {
    let negative = n < 0;
    let digits = n.unsigned_abs().to_string();
    let chars: Vec<char> = digits.chars().collect();

    let mut grouped = String::new();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::AlertStatus;
    use time::macros::date;

    fn alert(
        segment: &str,
        pct: f64,
        kwh: f64,
        customers: i64,
        status: AlertStatus,
        severity: AlertSeverity,
    ) -> TrendRecord {
        TrendRecord {
            usage_month: date!(2024 - 08 - 01),
            customer_type: segment.to_string(),
            current_month_kwh: kwh,
            customers_active: customers,
            yoy_change_pct: Some(pct),
            alert_status: status,
            alert_severity: severity,
        }
    }

    fn high(segment: &str, pct: f64, kwh: f64, customers: i64) -> TrendRecord {
        alert(
            segment,
            pct,
            kwh,
            customers,
            AlertStatus::HighGrowthAlert,
            AlertSeverity::Critical,
        )
    }

    fn low(segment: &str, pct: f64, kwh: f64, customers: i64) -> TrendRecord {
        alert(
            segment,
            pct,
            kwh,
            customers,
            AlertStatus::LowGrowthAlert,
            AlertSeverity::Warning,
        )
    }

    #[test]
    fn empty_input_produces_the_no_alert_outcome() {
        match build(Vec::new()) {
            ReportOutcome::NoAlerts { message } => assert_eq!(message, NO_ALERTS_MESSAGE),
            ReportOutcome::Alerts(_) => panic!("expected no-alert outcome"),
        }
    }

    #[test]
    fn critical_segments_precede_warnings_with_segment_tiebreak() {
        let outcome = build(vec![
            low("Commercial", 5.0, 10_500.0, 505),
            high("Residential", 100.0, 120_000.0, 1_100),
            low("Agricultural", -12.0, 4_000.0, 80),
            high("Municipal", 75.0, 50_000.0, 12),
        ]);

        let report = match outcome {
            ReportOutcome::Alerts(r) => r,
            ReportOutcome::NoAlerts { .. } => panic!("expected alerts"),
        };

        let order: Vec<&str> = report
            .records
            .iter()
            .map(|r| r.customer_type.as_str())
            .collect();
        assert_eq!(order, vec!["Municipal", "Residential", "Agricultural", "Commercial"]);
    }

    #[test]
    fn subject_carries_the_segment_count() {
        let outcome = build(vec![
            high("Residential", 100.0, 120_000.0, 1_100),
            low("Commercial", 5.0, 10_500.0, 505),
        ]);

        let report = match outcome {
            ReportOutcome::Alerts(r) => r,
            ReportOutcome::NoAlerts { .. } => panic!("expected alerts"),
        };
        assert!(report.subject.contains("2 segments need attention"));
    }

    #[test]
    fn narrative_line_matches_the_source_format() {
        let rec = high("Residential", 100.0, 120_000.0, 1_100);
        assert_eq!(
            rec.alert_message(),
            "Residential segment: 100.0% YoY growth (120000 kWh total)"
        );
    }

    #[test]
    fn html_body_uses_separators_and_severity_colors() {
        let outcome = build(vec![
            high("Residential", 100.0, 120_000.0, 1_100),
            low("Commercial", 5.0, 10_500.0, 505),
        ]);

        let report = match outcome {
            ReportOutcome::Alerts(r) => r,
            ReportOutcome::NoAlerts { .. } => panic!("expected alerts"),
        };

        assert!(report.body_html.contains("120,000"));
        assert!(report.body_html.contains("1,100"));
        assert!(report.body_html.contains("10,500"));
        assert!(report.body_html.contains("100.00%"));
        assert!(report.body_html.contains("5.00%"));
        assert!(report.body_html.contains(CRITICAL_COLOR));
        assert!(report.body_html.contains(WARNING_COLOR));
        assert!(report.body_html.contains("Review capacity planning"));
        assert!(report.body_html.contains("customer churn"));
    }

    #[test]
    fn table_percentage_is_shown_as_computed() {
        let outcome = build(vec![high("Residential", 66.67, 40_000.0, 950)]);

        let report = match outcome {
            ReportOutcome::Alerts(r) => r,
            ReportOutcome::NoAlerts { .. } => panic!("expected alerts"),
        };
        // Two decimals in the table, one in the narrative.
        assert!(report.body_html.contains("66.67%"));
        assert!(report.body_text.contains("66.7% YoY growth"));
    }

    #[test]
    fn rendering_is_byte_identical_across_runs() {
        let records = vec![
            low("Commercial", 5.0, 10_500.0, 505),
            high("Residential", 100.0, 120_000.0, 1_100),
        ];

        let first = build(records.clone());
        let second = build(records);
        assert_eq!(first, second);
    }

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(123), "123");
        assert_eq!(format_count(1_234), "1,234");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_kwh(120_000.4), "120,000");
    }
}
