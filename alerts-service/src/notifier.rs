use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::report::Report;

#[derive(thiserror::Error, Debug)]
#[error("report delivery failed: {0}")]
pub struct DeliveryError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Delivery was not attempted because email is not configured.
    Skipped,
}

/// Accepts a rendered report and performs (or skips) delivery.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, report: &Report) -> Result<Delivery, DeliveryError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

pub enum EmailNotifier {
    /// Credentials or recipients are missing; every deliver call is a
    /// logged no-op. Configuration problems never fail the run.
    Disabled,
    Smtp(SmtpMailer),
}

impl EmailNotifier {
    /// Build the notifier from config, downgrading any configuration problem
    /// to `Disabled` with a warning.
    pub fn from_config(cfg: &EmailConfig) -> Self {
        let (Some(username), Some(password)) = (cfg.username.clone(), cfg.password.clone()) else {
            tracing::warn!("email credentials not configured - skipping email send");
            return Self::Disabled;
        };

        let from_raw = cfg.from_address.clone().unwrap_or_else(|| username.clone());
        let from: Mailbox = match from_raw.parse() {
            Ok(mb) => mb,
            Err(e) => {
                tracing::warn!(error = %e, address = %from_raw, "invalid from address - email delivery disabled");
                return Self::Disabled;
            }
        };

        let mut recipients = Vec::with_capacity(cfg.recipients.len());
        for raw in &cfg.recipients {
            match raw.parse::<Mailbox>() {
                Ok(mb) => recipients.push(mb),
                Err(e) => {
                    tracing::warn!(error = %e, address = %raw, "skipping invalid recipient address");
                }
            }
        }
        if recipients.is_empty() {
            tracing::warn!("no valid alert recipients configured - email delivery disabled");
            return Self::Disabled;
        }

        let transport = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_server)
        {
            Ok(builder) => builder
                .port(cfg.smtp_port)
                .credentials(Credentials::new(username, password))
                .build(),
            Err(e) => {
                tracing::warn!(error = %e, server = %cfg.smtp_server, "invalid SMTP relay - email delivery disabled");
                return Self::Disabled;
            }
        };

        Self::Smtp(SmtpMailer {
            transport,
            from,
            recipients,
        })
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, report: &Report) -> Result<Delivery, DeliveryError> {
        let mailer = match self {
            Self::Disabled => {
                tracing::warn!(
                    subject = %report.subject,
                    "email delivery disabled - report computed but not sent"
                );
                return Ok(Delivery::Skipped);
            }
            Self::Smtp(mailer) => mailer,
        };

        let mut builder = Message::builder().from(mailer.from.clone());
        for recipient in &mailer.recipients {
            builder = builder.to(recipient.clone());
        }

        let message = builder
            .subject(report.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                report.body_text.clone(),
                report.body_html.clone(),
            ))
            .map_err(|e| DeliveryError(format!("failed to build alert email: {e}")))?;

        mailer
            .transport
            .send(message)
            .await
            .map_err(|e| DeliveryError(format!("failed to send email: {e}")))?;

        tracing::info!(
            recipients = mailer.recipients.len(),
            subject = %report.subject,
            "alert email sent successfully"
        );
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> EmailConfig {
        EmailConfig {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: Some("alerts@example.com".to_string()),
            password: Some("s3cret".to_string()),
            from_address: None,
            recipients: vec!["ops@example.com".to_string()],
        }
    }

    #[test]
    fn missing_credentials_disable_delivery() {
        let mut cfg = base_config();
        cfg.password = None;
        assert!(EmailNotifier::from_config(&cfg).is_disabled());

        let mut cfg = base_config();
        cfg.username = None;
        assert!(EmailNotifier::from_config(&cfg).is_disabled());
    }

    #[test]
    fn empty_or_invalid_recipients_disable_delivery() {
        let mut cfg = base_config();
        cfg.recipients.clear();
        assert!(EmailNotifier::from_config(&cfg).is_disabled());

        let mut cfg = base_config();
        cfg.recipients = vec!["not an address".to_string()];
        assert!(EmailNotifier::from_config(&cfg).is_disabled());
    }

    #[tokio::test]
    async fn complete_config_produces_an_smtp_notifier() {
        let notifier = EmailNotifier::from_config(&base_config());
        assert!(!notifier.is_disabled());
    }

    #[tokio::test]
    async fn disabled_notifier_skips_without_error() {
        let report = Report {
            subject: "subject".to_string(),
            body_text: "text".to_string(),
            body_html: "<html></html>".to_string(),
            records: Vec::new(),
        };

        let outcome = EmailNotifier::Disabled.deliver(&report).await.unwrap();
        assert_eq!(outcome, Delivery::Skipped);
    }
}
