//! OTP code repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::OtpCode;
use domain::repositories::{OtpRepository, RepositoryError};
use sqlx::PgPool;

use crate::db::db_error;
use crate::entities::OtpCodeEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgOtpRepository {
    pool: PgPool,
}

impl PgOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn upsert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("upsert_otp");
        let result = sqlx::query(
            r#"
            INSERT INTO otp_codes (email, code_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                expires_at = EXCLUDED.expires_at,
                failed_attempts = 0,
                created_at = NOW()
            "#,
        )
        .bind(email)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ()).map_err(db_error)
    }

    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, RepositoryError> {
        let timer = QueryTimer::new("find_active_otp");
        let result = sqlx::query_as::<_, OtpCodeEntity>(
            r#"
            SELECT email, code_hash, expires_at, failed_attempts, created_at
            FROM otp_codes
            WHERE email = $1 AND expires_at > $2
            "#,
        )
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<i32, RepositoryError> {
        let timer = QueryTimer::new("record_failed_otp_attempt");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE otp_codes
            SET failed_attempts = failed_attempts + 1
            WHERE email = $1
            RETURNING failed_attempts
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|n| n.unwrap_or(0)).map_err(db_error)
    }

    async fn delete(&self, email: &str) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("delete_otp");
        let result = sqlx::query("DELETE FROM otp_codes WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ()).map_err(db_error)
    }
}
