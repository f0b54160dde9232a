use serde::Serialize;

use crate::configuration::EmailSettings;
use crate::error::{EmailError, ValidationError};
use crate::validators::is_valid_email;

/// Client for the transactional email HTTP API
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

#[derive(Clone, Debug)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Ok(Self(is_valid_email(s)?))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Html")]
    html: &'a str,
    #[serde(rename = "Text")]
    text: &'a str,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub fn from_settings(settings: &EmailSettings) -> Result<Self, EmailError> {
        let sender = SenderEmail::parse(&settings.sender_email)
            .map_err(|e| EmailError::InvalidRecipient(format!("sender: {}", e)))?;
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| EmailError::ServiceUnavailable(e.to_string()))?;

        Ok(Self::new(settings.base_url.clone(), sender, http_client))
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url.trim_end_matches('/'));
        let request = SendEmailRequest {
            from: self.sender.inner(),
            to: recipient,
            subject,
            html: html_content,
            text: text_content,
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmailError::ServiceUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Deliver a password-reset link. Returns `false` on any delivery failure;
    /// the failure is logged here.
    pub async fn send_reset_email(&self, recipient: &str, reset_link: &str) -> bool {
        let html_content = format!(
            r#"
            <h1>Reset your SkyLink password</h1>
            <p>Click the link below to choose a new password:</p>
            <a href="{}">Reset Password</a>
            <p>This link will expire in 30 minutes. If you did not request a reset, ignore this email.</p>
            "#,
            reset_link
        );
        let text_content = format!(
            "Reset your SkyLink password: {}\nThis link will expire in 30 minutes.",
            reset_link
        );

        match self
            .send_email(recipient, "Reset your password", &html_content, &text_content)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Password reset email was not delivered");
                false
            }
        }
    }
}
