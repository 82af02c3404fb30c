//! Work experience repository.

use async_trait::async_trait;
use domain::models::{WorkExperience, WorkExperienceInput};
use domain::repositories::{RepositoryError, WorkExperienceRepository};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::db_error;
use crate::entities::{EmploymentTypeDb, WorkExperienceEntity, WorkTypeDb};
use crate::metrics::QueryTimer;

const COLUMNS: &str = r#"
    id, applicant_id, job_title, employment_type, company, start_date, end_date,
    location, work_type, description, currently_working, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgWorkExperienceRepository {
    pool: PgPool,
}

impl PgWorkExperienceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_entries(
    conn: &mut PgConnection,
    applicant_id: Uuid,
    entries: &[WorkExperienceInput],
) -> Result<(), sqlx::Error> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO work_experiences (
                applicant_id, job_title, employment_type, company, start_date, end_date,
                location, work_type, description, currently_working
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(applicant_id)
        .bind(&entry.job_title)
        .bind(EmploymentTypeDb::from(entry.employment_type))
        .bind(&entry.company)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .bind(&entry.location)
        .bind(WorkTypeDb::from(entry.work_type))
        .bind(&entry.description)
        .bind(entry.currently_working)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl WorkExperienceRepository for PgWorkExperienceRepository {
    async fn list(&self, applicant_id: Uuid) -> Result<Vec<WorkExperience>, RepositoryError> {
        let timer = QueryTimer::new("list_work_experience");
        let sql = format!(
            "SELECT {COLUMNS} FROM work_experiences WHERE applicant_id = $1 ORDER BY created_at, id"
        );
        let result = sqlx::query_as::<_, WorkExperienceEntity>(&sql)
            .bind(applicant_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(db_error)
    }

    async fn find(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkExperience>, RepositoryError> {
        let timer = QueryTimer::new("find_work_experience");
        let sql =
            format!("SELECT {COLUMNS} FROM work_experiences WHERE id = $1 AND applicant_id = $2");
        let result = sqlx::query_as::<_, WorkExperienceEntity>(&sql)
            .bind(id)
            .bind(applicant_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result.map(|row| row.map(Into::into)).map_err(db_error)
    }

    async fn insert_many(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("insert_work_experience");
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        insert_entries(&mut *tx, applicant_id, entries)
            .await
            .map_err(db_error)?;
        let result = tx.commit().await;
        timer.record();
        result.map_err(db_error)
    }

    async fn replace_all(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("replace_work_experience");
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("DELETE FROM work_experiences WHERE applicant_id = $1")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        insert_entries(&mut *tx, applicant_id, entries)
            .await
            .map_err(db_error)?;
        let result = tx.commit().await;
        timer.record();
        result.map_err(db_error)
    }

    async fn update(&self, entry: &WorkExperience) -> Result<bool, RepositoryError> {
        let timer = QueryTimer::new("update_work_experience");
        let result = sqlx::query(
            r#"
            UPDATE work_experiences SET
                job_title = $3,
                employment_type = $4,
                company = $5,
                start_date = $6,
                end_date = $7,
                location = $8,
                work_type = $9,
                description = $10,
                currently_working = $11,
                updated_at = NOW()
            WHERE id = $1 AND applicant_id = $2
            "#,
        )
        .bind(entry.id)
        .bind(entry.applicant_id)
        .bind(&entry.job_title)
        .bind(EmploymentTypeDb::from(entry.employment_type))
        .bind(&entry.company)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .bind(&entry.location)
        .bind(WorkTypeDb::from(entry.work_type))
        .bind(&entry.description)
        .bind(entry.currently_working)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0).map_err(db_error)
    }

    async fn delete(&self, applicant_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let timer = QueryTimer::new("delete_work_experience");
        let result = sqlx::query("DELETE FROM work_experiences WHERE id = $1 AND applicant_id = $2")
            .bind(id)
            .bind(applicant_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0).map_err(db_error)
    }
}
