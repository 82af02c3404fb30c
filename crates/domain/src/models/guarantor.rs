//! Guarantor and guarantor invitation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_not_blank;
use uuid::Uuid;
use validator::Validate;

/// Maximum number of guarantors an applicant may have.
pub const MAX_GUARANTORS_PER_APPLICANT: i64 = 3;

/// Days an invitation (and its token) stays valid.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Invitation lifecycle. `Completed` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Completed,
    Expired,
}

impl InvitationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Completed => write!(f, "completed"),
            InvitationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// An invitation sent to a prospective guarantor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuarantorInvitation {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub email: String,
    pub token: String,
    pub link: String,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl GuarantorInvitation {
    /// Pending but past its expiry, waiting for the sweep.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewGuarantorInvitation {
    pub applicant_id: Uuid,
    pub email: String,
    pub token: String,
    pub link: String,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A guarantor who completed the invitation form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guarantor {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub relationship: String,
    pub filled_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGuarantor {
    pub applicant_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub relationship: String,
    pub filled_at: DateTime<Utc>,
}

/// Body of `POST /guarantors/send-invite`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Body of `POST /guarantors/submit-form`.
///
/// The guarantor's email comes from the invitation token; a supplied `email`
/// must match it.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuarantorFormRequest {
    #[validate(
        length(min = 2, max = 100, message = "Name must be 2-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(
        length(min = 7, max = 20, message = "Phone number must be 7-20 characters"),
        custom(function = "validate_not_blank")
    )]
    pub phone_number: String,

    #[validate(
        length(min = 2, max = 300, message = "Address must be 2-300 characters"),
        custom(function = "validate_not_blank")
    )]
    pub address: String,

    #[validate(
        length(min = 2, max = 100, message = "Relationship must be 2-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub relationship: String,
}

/// Result of sending an invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentInvitation {
    pub guarantor_invitation: GuarantorInvitation,
    /// False when the invitation was stored but the email could not be sent.
    pub email_delivered: bool,
}

/// Result of a guarantor form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedForm {
    pub guarantor: Guarantor,
    /// False when no pending invitation matched the token.
    pub invitation_completed: bool,
}
