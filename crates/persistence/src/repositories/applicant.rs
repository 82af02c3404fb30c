//! Applicant repository for database operations.

use async_trait::async_trait;
use domain::models::applicant::ProfileChanges;
use domain::models::{Applicant, NewApplicant};
use domain::repositories::{ApplicantRepository, RepositoryError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::db_error;
use crate::entities::{ApplicantEntity, GenderDb};
use crate::metrics::QueryTimer;

const APPLICANT_COLUMNS: &str = r#"
    id, first_name, last_name, email, password_hash, gender, phone_number, address,
    country, state, lga, postal_code, age, date_of_birth, nin, bvn, skills,
    avatar_public_id, avatar_url, avatar_uploaded_at,
    resume_public_id, resume_url, resume_uploaded_at,
    password_version, is_active, is_verified, can_take_assessment, created_at, updated_at
"#;

/// Repository for applicant accounts.
#[derive(Clone)]
pub struct PgApplicantRepository {
    pool: PgPool,
}

impl PgApplicantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicantRepository for PgApplicantRepository {
    async fn create(&self, new: NewApplicant) -> Result<Applicant, RepositoryError> {
        let timer = QueryTimer::new("create_applicant");
        let sql = format!(
            r#"
            INSERT INTO applicants (
                first_name, last_name, email, password_hash, gender,
                avatar_public_id, avatar_url, avatar_uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {APPLICANT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, ApplicantEntity>(&sql)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(GenderDb::from(new.gender))
            .bind(new.avatar.as_ref().map(|f| f.public_id.clone()))
            .bind(new.avatar.as_ref().map(|f| f.secure_url.clone()))
            .bind(new.avatar.as_ref().map(|f| f.uploaded_at))
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result.map(Into::into).map_err(db_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Applicant>, RepositoryError> {
        let timer = QueryTimer::new("find_applicant_by_id");
        let sql = format!("SELECT {APPLICANT_COLUMNS} FROM applicants WHERE id = $1");
        let result = sqlx::query_as::<_, ApplicantEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError> {
        let timer = QueryTimer::new("find_applicant_by_email");
        let sql = format!("SELECT {APPLICANT_COLUMNS} FROM applicants WHERE LOWER(email) = LOWER($1)");
        let result = sqlx::query_as::<_, ApplicantEntity>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Applicant>, RepositoryError> {
        let timer = QueryTimer::new("update_applicant_profile");
        let f = &changes.fields;
        let sql = format!(
            r#"
            UPDATE applicants SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                address = COALESCE($5, address),
                country = COALESCE($6, country),
                state = COALESCE($7, state),
                lga = COALESCE($8, lga),
                postal_code = COALESCE($9, postal_code),
                age = COALESCE($10, age),
                date_of_birth = COALESCE($11, date_of_birth),
                gender = COALESCE($12, gender),
                nin = COALESCE($13, nin),
                bvn = COALESCE($14, bvn),
                skills = COALESCE($15, skills),
                avatar_public_id = COALESCE($16, avatar_public_id),
                avatar_url = COALESCE($17, avatar_url),
                avatar_uploaded_at = COALESCE($18, avatar_uploaded_at),
                resume_public_id = COALESCE($19, resume_public_id),
                resume_url = COALESCE($20, resume_url),
                resume_uploaded_at = COALESCE($21, resume_uploaded_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICANT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, ApplicantEntity>(&sql)
            .bind(id)
            .bind(f.first_name.as_deref())
            .bind(f.last_name.as_deref())
            .bind(f.phone_number.as_deref())
            .bind(f.address.as_deref())
            .bind(f.country.as_deref())
            .bind(f.state.as_deref())
            .bind(f.lga.as_deref())
            .bind(f.postal_code.as_deref())
            .bind(f.age)
            .bind(f.date_of_birth)
            .bind(f.gender.map(GenderDb::from))
            .bind(f.nin.as_deref())
            .bind(f.bvn.as_deref())
            .bind(f.skills.clone())
            .bind(changes.avatar.as_ref().map(|a| a.public_id.clone()))
            .bind(changes.avatar.as_ref().map(|a| a.secure_url.clone()))
            .bind(changes.avatar.as_ref().map(|a| a.uploaded_at))
            .bind(changes.resume.as_ref().map(|r| r.public_id.clone()))
            .bind(changes.resume.as_ref().map(|r| r.secure_url.clone()))
            .bind(changes.resume.as_ref().map(|r| r.uploaded_at))
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("mark_applicant_verified");
        let result = sqlx::query(
            "UPDATE applicants SET is_verified = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ()).map_err(db_error)
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<i32, RepositoryError> {
        let timer = QueryTimer::new("update_applicant_password");
        let result: Result<(i32,), sqlx::Error> = sqlx::query_as(
            r#"
            UPDATE applicants
            SET password_hash = $2, password_version = password_version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING password_version
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(|(version,)| version).map_err(db_error)
    }
}
