//! Email service for transactional mail (password reset links).
//!
//! Uses SMTP via lettre. Messages are plain text.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay can't be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the message can't be built or delivered.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let body = password_reset_body(name, reset_url);
        self.send_text_email(to, "Reset your Loomline Wholesale password", body)
            .await
    }

    async fn send_text_email(&self, to: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Reset link for a raw token.
#[must_use]
pub fn reset_link(base_url: &str, token: &str) -> String {
    format!("{base_url}/reset-password?token={token}")
}

fn password_reset_body(name: &str, reset_url: &str) -> String {
    format!(
        "Hi {name},\n\n\
         We received a request to reset the password for your Loomline Wholesale account.\n\
         Open the link below within the next hour to choose a new password:\n\n\
         {reset_url}\n\n\
         If you didn't ask for this, you can ignore this email. Your password won't change.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link() {
        assert_eq!(
            reset_link("https://shop.loomline.in", "abc_-123"),
            "https://shop.loomline.in/reset-password?token=abc_-123"
        );
    }

    #[test]
    fn test_reset_body_mentions_link_and_name() {
        let body = password_reset_body("Asha", "https://x/reset-password?token=t");
        assert!(body.starts_with("Hi Asha,"));
        assert!(body.contains("https://x/reset-password?token=t"));
    }
}
