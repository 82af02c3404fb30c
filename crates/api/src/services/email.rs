//! Email delivery for OTP codes and guarantor invitations.
//!
//! Supports two providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: SendGrid v3 mail API

use chrono::{DateTime, Utc};
use domain::services::{MailError, Mailer, OtpPurpose};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
    /// Lifetime quoted in OTP emails
    otp_ttl_minutes: i64,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            otp_ttl_minutes: 10,
        }
    }

    pub fn with_otp_ttl_minutes(mut self, minutes: i64) -> Self {
        self.otp_ttl_minutes = minutes;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message through the configured provider.
    pub async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(MailError::NotConfigured(format!(
                    "unknown provider '{}'",
                    provider
                )))
            }
        }
    }

    fn html_enabled(&self) -> bool {
        self.config.template_style == "html"
    }

    fn otp_message(
        &self,
        to: &str,
        recipient_name: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> EmailMessage {
        let (subject, intro) = match purpose {
            OtpPurpose::EmailVerification => (
                "Verify your email address",
                "Use the code below to verify your email address.",
            ),
            OtpPurpose::PasswordReset => (
                "Reset your password",
                "Use the code below to reset your password. If you did not ask for a reset, you can ignore this email.",
            ),
        };

        let greeting = greeting(recipient_name);
        let expiry = expiry_notice(self.otp_ttl_minutes);
        let body_text = format!(
            "{greeting}\n\n{intro}\n\n{code}\n\n{expiry}\n\nThe {sender} Team",
            sender = self.config.sender_name
        );
        let body_html = self.html_enabled().then(|| {
            format!(
                r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <p>{greeting}</p>
    <p>{intro}</p>
    <p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{code}</p>
    <p style="color: #666; font-size: 14px;">{expiry}</p>
</body>
</html>"#,
                greeting = escape_html(&greeting),
                code = escape_html(code),
            )
        });

        EmailMessage {
            to: to.to_string(),
            to_name: non_empty(recipient_name),
            subject: subject.to_string(),
            body_text,
            body_html,
        }
    }

    fn invitation_message(
        &self,
        to: &str,
        applicant_name: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> EmailMessage {
        let expires = expires_at.format("%B %-d, %Y");
        let subject = format!("{} asked you to be their guarantor", applicant_name);
        let body_text = format!(
            r#"Hello,

{applicant_name} has listed you as a guarantor. Please complete the guarantor form using the link below:

{link}

This link expires on {expires}.

If you do not know {applicant_name}, you can safely ignore this email.

The {sender} Team"#,
            sender = self.config.sender_name
        );
        let body_html = self.html_enabled().then(|| {
            format!(
                r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <p>Hello,</p>
    <p><strong>{name}</strong> has listed you as a guarantor. Please complete the guarantor form:</p>
    <div style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background: #1f6feb; color: white; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: bold;">Complete guarantor form</a>
    </div>
    <p style="color: #666; font-size: 14px;">This link expires on {expires}.</p>
    <p style="color: #999; font-size: 12px;">Or copy and paste this link into your browser:<br><a href="{link}">{link}</a></p>
</body>
</html>"#,
                name = escape_html(applicant_name),
                link = escape_html(link),
            )
        });

        EmailMessage {
            to: to.to_string(),
            to_name: None,
            subject,
            body_text,
            body_html,
        }
    }

    /// Console provider - logs email content.
    fn send_console(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            "Email (console provider)"
        );
        debug!(body = %message.body_text, "Email body");
        Ok(())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(MailError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let mut recipient = serde_json::json!({ "email": message.to });
        if let Some(name) = &message.to_name {
            recipient["name"] = serde_json::json!(name);
        }

        let mut content = vec![serde_json::json!({
            "type": "text/plain",
            "value": message.body_text
        })];
        if let Some(html) = &message.body_html {
            content.push(serde_json::json!({
                "type": "text/html",
                "value": html
            }));
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": content
        });

        let response = self
            .client
            .post(&self.config.sendgrid_url)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via SendGrid"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "SendGrid API error"
            );
            Err(MailError::Rejected(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait::async_trait]
impl Mailer for EmailService {
    async fn send_otp(
        &self,
        to: &str,
        recipient_name: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError> {
        self.send(self.otp_message(to, recipient_name, code, purpose))
            .await
    }

    async fn send_guarantor_invitation(
        &self,
        to: &str,
        applicant_name: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailError> {
        self.send(self.invitation_message(to, applicant_name, link, expires_at))
            .await
    }
}

fn greeting(name: &str) -> String {
    match non_empty(name) {
        Some(name) => format!("Hi {},", name),
        None => "Hi,".to_string(),
    }
}

fn expiry_notice(minutes: i64) -> String {
    match minutes {
        1 => "The code expires in 1 minute.".to_string(),
        n => format!("The code expires in {} minutes.", n),
    }
}

/// Escapes text interpolated into HTML bodies and attributes.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sendgrid_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Test".to_string(),
            template_style: "html".to_string(),
        }
    }

    #[tokio::test]
    async fn test_console_provider_sends() {
        let service = EmailService::new(test_config());
        let result = service
            .send_otp("user@example.com", "Ada", "123456", OtpPurpose::EmailVerification)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_silently_succeeds() {
        let mut config = test_config();
        config.enabled = false;
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);
        assert!(!service.is_enabled());

        let result = service
            .send_guarantor_invitation("g@example.com", "Ada Obi", "https://x", Utc::now())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_is_not_configured() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);

        let result = service
            .send_otp("user@example.com", "", "123456", OtpPurpose::PasswordReset)
            .await;
        assert!(matches!(result, Err(MailError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let mut config = test_config();
        config.provider = "pigeon".to_string();
        let service = EmailService::new(config);

        let result = service
            .send_otp("user@example.com", "", "123456", OtpPurpose::PasswordReset)
            .await;
        assert!(matches!(result, Err(MailError::NotConfigured(_))));
    }

    #[test]
    fn test_otp_message_contents() {
        let service = EmailService::new(test_config());
        let message =
            service.otp_message("user@example.com", "Ada", "654321", OtpPurpose::PasswordReset);

        assert_eq!(message.subject, "Reset your password");
        assert!(message.body_text.starts_with("Hi Ada,"));
        assert!(message.body_text.contains("654321"));
        assert!(message.body_html.unwrap().contains("654321"));
    }

    #[test]
    fn test_invitation_message_contents() {
        let mut config = test_config();
        config.template_style = "plain".to_string();
        let service = EmailService::new(config);
        let expires = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();

        let message = service.invitation_message(
            "g@example.com",
            "Ada Obi",
            "https://app.test/guarantor-form?token=abc",
            expires,
        );

        assert!(message.subject.contains("Ada Obi"));
        assert!(message
            .body_text
            .contains("https://app.test/guarantor-form?token=abc"));
        assert!(message.body_text.contains("March 9, 2025"));
        assert!(message.body_html.is_none());
    }

    #[test]
    fn test_invitation_html_escapes_applicant_name() {
        let service = EmailService::new(test_config());
        let name = r#"<a href="https://phish.test/login">Bank</a> Obi"#;

        let message = service.invitation_message(
            "g@example.com",
            name,
            "https://app.test/guarantor-form?token=abc&x=1",
            Utc::now(),
        );
        let html = message.body_html.unwrap();

        assert!(!html.contains("<a href=\"https://phish.test"));
        assert!(html.contains("&lt;a href=&quot;https://phish.test/login&quot;&gt;Bank&lt;/a&gt; Obi"));
        assert!(html.contains("token=abc&amp;x=1"));
    }

    #[test]
    fn test_otp_html_escapes_greeting_and_quotes_ttl() {
        let service = EmailService::new(test_config()).with_otp_ttl_minutes(15);
        let message = service.otp_message(
            "user@example.com",
            "<script>alert(1)</script>",
            "123456",
            OtpPurpose::EmailVerification,
        );
        let html = message.body_html.unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("Hi &lt;script&gt;alert(1)&lt;/script&gt;,"));
        assert!(html.contains("The code expires in 15 minutes."));
        assert!(message.body_text.contains("The code expires in 15 minutes."));
    }

    #[test]
    fn test_expiry_notice() {
        assert_eq!(expiry_notice(1), "The code expires in 1 minute.");
        assert_eq!(expiry_notice(10), "The code expires in 10 minutes.");
    }
}
