use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub uri: String,
    pub max_connections: u32,
}

/// Trend analysis knobs. Thresholds are percentages applied to the raw
/// signed year-over-year change.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    #[serde(default = "default_high_growth_pct")]
    pub high_growth_pct: f64,
    #[serde(default = "default_low_growth_pct")]
    pub low_growth_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_months: default_window_months(),
            high_growth_pct: default_high_growth_pct(),
            low_growth_pct: default_low_growth_pct(),
        }
    }
}

fn default_window_months() -> u32 {
    25
}

fn default_high_growth_pct() -> f64 {
    60.0
}

fn default_low_growth_pct() -> f64 {
    10.0
}

/// SMTP delivery settings. `username`/`password` are optional on purpose:
/// when either is absent the notifier is disabled and the run still
/// succeeds, with the report computed but not sent.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    pub http_bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub email: EmailConfig,
    pub trigger: TriggerConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ALERTS_CONFIG").unwrap_or_else(|_| "alerts-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [warehouse]
            uri = "postgres://warehouse:5432/usage"
            max_connections = 4

            [analysis]
            window_months = 25
            high_growth_pct = 60.0
            low_growth_pct = 10.0

            [email]
            smtp_server = "smtp.example.com"
            smtp_port = 587
            username = "alerts@example.com"
            password = "s3cret"
            recipients = ["ops@example.com", "planning@example.com"]

            [trigger]
            http_bind_addr = "0.0.0.0:8080"

            [metrics]
            bind_addr = "0.0.0.0:9100"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.analysis.window_months, 25);
        assert_eq!(cfg.email.recipients.len(), 2);
        assert!(cfg.metrics.is_some());
    }

    #[test]
    fn analysis_and_email_defaults_apply() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [warehouse]
            uri = "postgres://warehouse:5432/usage"
            max_connections = 4

            [email]

            [trigger]
            http_bind_addr = "127.0.0.1:8080"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.analysis.window_months, 25);
        assert_eq!(cfg.analysis.high_growth_pct, 60.0);
        assert_eq!(cfg.analysis.low_growth_pct, 10.0);
        assert_eq!(cfg.email.smtp_server, "smtp.gmail.com");
        assert_eq!(cfg.email.smtp_port, 587);
        assert!(cfg.email.username.is_none());
        assert!(cfg.email.recipients.is_empty());
        assert!(cfg.metrics.is_none());
    }
}
