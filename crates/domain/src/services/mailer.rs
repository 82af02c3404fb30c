//! Outbound email port.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email provider not configured: {0}")]
    NotConfigured(String),

    #[error("Email provider rejected the message: {0}")]
    Rejected(String),

    #[error("Email transport error: {0}")]
    Transport(String),
}

/// Why a one-time code is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(
        &self,
        to: &str,
        recipient_name: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError>;

    async fn send_guarantor_invitation(
        &self,
        to: &str,
        applicant_name: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailError>;
}

/// A message captured by [`MockMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    Otp {
        to: String,
        code: String,
        purpose: OtpPurpose,
    },
    GuarantorInvitation {
        to: String,
        link: String,
    },
}

/// Mailer that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockMailer {
    pub simulate_failure: bool,
    sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent code mailed to `email`.
    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|m| match m {
            SentMail::Otp { to, code, .. } if to == email => Some(code),
            _ => None,
        })
    }

    fn record(&self, mail: SentMail) -> Result<(), MailError> {
        if self.simulate_failure {
            tracing::warn!("Mock mailer simulating failure");
            return Err(MailError::Transport("Simulated failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send_otp(
        &self,
        to: &str,
        _recipient_name: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError> {
        self.record(SentMail::Otp {
            to: to.to_string(),
            code: code.to_string(),
            purpose,
        })
    }

    async fn send_guarantor_invitation(
        &self,
        to: &str,
        _applicant_name: &str,
        link: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), MailError> {
        self.record(SentMail::GuarantorInvitation {
            to: to.to_string(),
            link: link.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_messages() {
        let mailer = MockMailer::new();
        mailer
            .send_otp("a@example.com", "Ada", "123456", OtpPurpose::EmailVerification)
            .await
            .unwrap();
        mailer
            .send_otp("a@example.com", "Ada", "654321", OtpPurpose::PasswordReset)
            .await
            .unwrap();

        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(mailer.last_otp_for("a@example.com").as_deref(), Some("654321"));
        assert_eq!(mailer.last_otp_for("b@example.com"), None);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mailer = MockMailer::failing();
        let result = mailer
            .send_guarantor_invitation("g@example.com", "Ada", "https://x", Utc::now())
            .await;

        assert!(matches!(result, Err(MailError::Transport(_))));
        assert!(mailer.sent().is_empty());
    }
}
