// SMTP email service. One pharmacy, one outbound account.
use crate::error::{EmailError, EmailResult};
use mail_builder::MessageBuilder;
use mail_send::SmtpClientBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Email service configuration, loaded from the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub from_email: String,
    pub from_name: String,
    pub email_enabled: bool,
}

impl EmailConfig {
    /// Load email configuration from environment variables.
    pub fn from_env() -> EmailResult<Self> {
        let email_enabled = std::env::var("EMAIL_ENABLED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        Ok(Self {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            smtp_tls: std::env::var("SMTP_TLS_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            from_email: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@ibhayipharmacy.co.za".to_string()),
            from_name: std::env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "Ibhayi Pharmacy".to_string()),
            email_enabled,
        })
    }
}

/// Email service for sending transactional notifications over SMTP.
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Create a new email service.
    pub fn new(config: EmailConfig) -> Self {
        if !config.email_enabled {
            info!("Email service disabled by configuration");
        }
        Self { config }
    }

    /// Send a plain text email.
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> EmailResult<String> {
        if !self.config.email_enabled {
            debug!("Email disabled, skipping send to: {}", to);
            return Ok(format!("disabled-{}", Uuid::new_v4()));
        }

        let message = MessageBuilder::new()
            .from((
                self.config.from_name.as_str(),
                self.config.from_email.as_str(),
            ))
            .to(to)
            .subject(subject)
            .text_body(body);

        self.send_message(message).await
    }

    /// Send an HTML email.
    pub async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> EmailResult<String> {
        if !self.config.email_enabled {
            debug!("Email disabled, skipping send to: {}", to);
            return Ok(format!("disabled-{}", Uuid::new_v4()));
        }

        let message = MessageBuilder::new()
            .from((
                self.config.from_name.as_str(),
                self.config.from_email.as_str(),
            ))
            .to(to)
            .subject(subject)
            .html_body(html_body);

        self.send_message(message).await
    }

    /// Verify the SMTP configuration by connecting without sending.
    pub async fn verify_email_config(&self) -> EmailResult<()> {
        info!(
            host = %self.config.smtp_host,
            port = %self.config.smtp_port,
            "Testing SMTP connection"
        );

        let mut smtp_client =
            SmtpClientBuilder::new(self.config.smtp_host.as_str(), self.config.smtp_port)
                .implicit_tls(self.config.smtp_tls);

        if let (Some(user), Some(pass)) = (&self.config.smtp_username, &self.config.smtp_password)
        {
            smtp_client = smtp_client.credentials((user.as_str(), pass.as_str()));
        }

        let _client = smtp_client
            .connect()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SMTP connection failed: {}", e)))?;

        info!("Email configuration verified successfully");
        Ok(())
    }

    /// Connect to the configured SMTP server and send a constructed message.
    async fn send_message(&self, message: MessageBuilder<'_>) -> EmailResult<String> {
        let mut smtp_client =
            SmtpClientBuilder::new(self.config.smtp_host.as_str(), self.config.smtp_port)
                .implicit_tls(self.config.smtp_tls);

        if let (Some(user), Some(pass)) = (&self.config.smtp_username, &self.config.smtp_password)
        {
            smtp_client = smtp_client.credentials((user.as_str(), pass.as_str()));
        }

        let mut client = smtp_client
            .connect()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SMTP connection failed: {}", e)))?;

        let message_id = Uuid::new_v4().to_string();
        client
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(format!("Failed to send email: {}", e)))?;

        debug!(message_id = %message_id, "Email sent successfully");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_env_defaults() {
        // No SMTP_* variables set in the test environment: defaults apply.
        std::env::remove_var("SMTP_HOST");
        std::env::remove_var("SMTP_PORT");

        let config = EmailConfig::from_env().unwrap();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_name, "Ibhayi Pharmacy");
    }

    #[tokio::test]
    async fn disabled_service_short_circuits() {
        let service = EmailService::new(EmailConfig {
            smtp_host: "unreachable.invalid".into(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: true,
            from_email: "noreply@ibhayipharmacy.co.za".into(),
            from_name: "Ibhayi Pharmacy".into(),
            email_enabled: false,
        });

        let id = service
            .send_email("customer@example.com", "subject", "body")
            .await
            .unwrap();
        assert!(id.starts_with("disabled-"));
    }
}
