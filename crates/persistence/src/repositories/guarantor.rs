//! Guarantor and invitation repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Guarantor, GuarantorInvitation, NewGuarantor, NewGuarantorInvitation};
use domain::repositories::{GuardedInsert, GuarantorRepository, RepositoryError};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::db_error;
use crate::entities::{GuarantorEntity, GuarantorInvitationEntity};
use crate::metrics::QueryTimer;

const INVITATION_COLUMNS: &str =
    "id, applicant_id, email, token, link, status, sent_at, completed_at, expires_at";

const GUARANTOR_COLUMNS: &str =
    "id, applicant_id, name, email, phone_number, address, relationship, filled_at";

#[derive(Clone)]
pub struct PgGuarantorRepository {
    pool: PgPool,
}

impl PgGuarantorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_guarded_tx(
        &self,
        new: NewGuarantor,
        token: &str,
        max_guarantors: i64,
    ) -> Result<GuardedInsert, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent submissions for the same applicant.
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM applicants WHERE id = $1 FOR UPDATE")
                .bind(new.applicant_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(GuardedInsert::ApplicantMissing);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM guarantors WHERE applicant_id = $1")
                .bind(new.applicant_id)
                .fetch_one(&mut *tx)
                .await?;
        if count >= max_guarantors {
            return Ok(GuardedInsert::CapacityReached);
        }

        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM guarantors WHERE applicant_id = $1 AND LOWER(email) = LOWER($2)
            )
            "#,
        )
        .bind(new.applicant_id)
        .bind(&new.email)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Ok(GuardedInsert::DuplicateEmail);
        }

        let sql = format!(
            r#"
            INSERT INTO guarantors (applicant_id, name, email, phone_number, address, relationship, filled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {GUARANTOR_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, GuarantorEntity>(&sql)
            .bind(new.applicant_id)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone_number)
            .bind(&new.address)
            .bind(&new.relationship)
            .bind(new.filled_at)
            .fetch_one(&mut *tx)
            .await;
        let guarantor = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                return Ok(GuardedInsert::DuplicateEmail);
            }
            Err(err) => return Err(err),
        };

        let completed = sqlx::query(
            r#"
            UPDATE guarantor_invitations
            SET status = 'completed', completed_at = $3
            WHERE token = $1 AND applicant_id = $2 AND status = 'pending'
            "#,
        )
        .bind(token)
        .bind(new.applicant_id)
        .bind(new.filled_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(GuardedInsert::Inserted {
            guarantor: guarantor.into(),
            invitation_completed: completed > 0,
        })
    }
}

#[async_trait]
impl GuarantorRepository for PgGuarantorRepository {
    async fn count_for_applicant(&self, applicant_id: Uuid) -> Result<i64, RepositoryError> {
        let timer = QueryTimer::new("count_guarantors");
        let result: Result<(i64,), sqlx::Error> =
            sqlx::query_as("SELECT COUNT(*) FROM guarantors WHERE applicant_id = $1")
                .bind(applicant_id)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result.map(|(count,)| count).map_err(db_error)
    }

    async fn create_invitation(
        &self,
        new: NewGuarantorInvitation,
    ) -> Result<GuarantorInvitation, RepositoryError> {
        let timer = QueryTimer::new("create_guarantor_invitation");
        let sql = format!(
            r#"
            INSERT INTO guarantor_invitations (applicant_id, email, token, link, sent_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVITATION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, GuarantorInvitationEntity>(&sql)
            .bind(new.applicant_id)
            .bind(&new.email)
            .bind(&new.token)
            .bind(&new.link)
            .bind(new.sent_at)
            .bind(new.expires_at)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result.map(Into::into).map_err(db_error)
    }

    async fn list_invitations(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<GuarantorInvitation>, RepositoryError> {
        let timer = QueryTimer::new("list_guarantor_invitations");
        let sql = format!(
            "SELECT {INVITATION_COLUMNS} FROM guarantor_invitations WHERE applicant_id = $1 ORDER BY sent_at DESC"
        );
        let result = sqlx::query_as::<_, GuarantorInvitationEntity>(&sql)
            .bind(applicant_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(db_error)
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<GuarantorInvitation>, RepositoryError> {
        let timer = QueryTimer::new("find_guarantor_invitation_by_token");
        let sql = format!("SELECT {INVITATION_COLUMNS} FROM guarantor_invitations WHERE token = $1");
        let result = sqlx::query_as::<_, GuarantorInvitationEntity>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn expire_stale_invitations(
        &self,
        applicant_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let timer = QueryTimer::new("expire_stale_invitations");
        let result = sqlx::query(
            r#"
            UPDATE guarantor_invitations
            SET status = 'expired'
            WHERE status = 'pending'
              AND expires_at <= $1
              AND ($2::uuid IS NULL OR applicant_id = $2)
            "#,
        )
        .bind(now)
        .bind(applicant_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected()).map_err(db_error)
    }

    async fn insert_guarded(
        &self,
        new: NewGuarantor,
        token: &str,
        max_guarantors: i64,
    ) -> Result<GuardedInsert, RepositoryError> {
        let timer = QueryTimer::new("insert_guarantor_guarded");
        let applicant_id = new.applicant_id;
        let result = self.insert_guarded_tx(new, token, max_guarantors).await;
        timer.record();

        let outcome = result.map_err(db_error)?;
        debug!(applicant_id = %applicant_id, outcome = ?outcome, "Guarded guarantor insert");
        Ok(outcome)
    }

    async fn list_guarantors(
        &self,
        applicant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Guarantor>, i64), RepositoryError> {
        let timer = QueryTimer::new("list_guarantors");
        let sql = format!(
            r#"
            SELECT {GUARANTOR_COLUMNS}
            FROM guarantors
            WHERE applicant_id = $1
            ORDER BY filled_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, GuarantorEntity>(&sql)
            .bind(applicant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error);
        let total: Result<(i64,), RepositoryError> =
            sqlx::query_as("SELECT COUNT(*) FROM guarantors WHERE applicant_id = $1")
                .bind(applicant_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error);
        timer.record();

        let rows = rows?;
        let (total,) = total?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_guarantor(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Guarantor>, RepositoryError> {
        let timer = QueryTimer::new("find_guarantor");
        let sql =
            format!("SELECT {GUARANTOR_COLUMNS} FROM guarantors WHERE id = $1 AND applicant_id = $2");
        let result = sqlx::query_as::<_, GuarantorEntity>(&sql)
            .bind(id)
            .bind(applicant_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }
}
