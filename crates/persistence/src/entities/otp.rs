//! OTP code entity.

use chrono::{DateTime, Utc};
use domain::models::OtpCode;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OtpCodeEntity {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OtpCodeEntity> for OtpCode {
    fn from(entity: OtpCodeEntity) -> Self {
        Self {
            email: entity.email,
            code_hash: entity.code_hash,
            expires_at: entity.expires_at,
            failed_attempts: entity.failed_attempts,
            created_at: entity.created_at,
        }
    }
}
