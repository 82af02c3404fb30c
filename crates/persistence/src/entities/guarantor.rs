//! Guarantor and invitation entities.

use chrono::{DateTime, Utc};
use domain::models::{Guarantor, GuarantorInvitation, InvitationStatus};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
pub enum InvitationStatusDb {
    Pending,
    Completed,
    Expired,
}

impl From<InvitationStatusDb> for InvitationStatus {
    fn from(db: InvitationStatusDb) -> Self {
        match db {
            InvitationStatusDb::Pending => InvitationStatus::Pending,
            InvitationStatusDb::Completed => InvitationStatus::Completed,
            InvitationStatusDb::Expired => InvitationStatus::Expired,
        }
    }
}

/// Database row mapping for the guarantor_invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct GuarantorInvitationEntity {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub email: String,
    pub token: String,
    pub link: String,
    pub status: InvitationStatusDb,
    pub sent_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<GuarantorInvitationEntity> for GuarantorInvitation {
    fn from(entity: GuarantorInvitationEntity) -> Self {
        Self {
            id: entity.id,
            applicant_id: entity.applicant_id,
            email: entity.email,
            token: entity.token,
            link: entity.link,
            status: entity.status.into(),
            sent_at: entity.sent_at,
            completed_at: entity.completed_at,
            expires_at: entity.expires_at,
        }
    }
}

/// Database row mapping for the guarantors table.
#[derive(Debug, Clone, FromRow)]
pub struct GuarantorEntity {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub relationship: String,
    pub filled_at: DateTime<Utc>,
}

impl From<GuarantorEntity> for Guarantor {
    fn from(entity: GuarantorEntity) -> Self {
        Self {
            id: entity.id,
            applicant_id: entity.applicant_id,
            name: entity.name,
            email: entity.email,
            phone_number: entity.phone_number,
            address: entity.address,
            relationship: entity.relationship,
            filled_at: entity.filled_at,
        }
    }
}
