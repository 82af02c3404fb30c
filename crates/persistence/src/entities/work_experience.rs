//! Work experience entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{EmploymentType, WorkExperience, WorkType};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "employment_type")]
pub enum EmploymentTypeDb {
    #[sqlx(rename = "full-time")]
    FullTime,
    #[sqlx(rename = "part-time")]
    PartTime,
    #[sqlx(rename = "contract")]
    Contract,
    #[sqlx(rename = "internship")]
    Internship,
}

impl From<EmploymentTypeDb> for EmploymentType {
    fn from(db: EmploymentTypeDb) -> Self {
        match db {
            EmploymentTypeDb::FullTime => EmploymentType::FullTime,
            EmploymentTypeDb::PartTime => EmploymentType::PartTime,
            EmploymentTypeDb::Contract => EmploymentType::Contract,
            EmploymentTypeDb::Internship => EmploymentType::Internship,
        }
    }
}

impl From<EmploymentType> for EmploymentTypeDb {
    fn from(value: EmploymentType) -> Self {
        match value {
            EmploymentType::FullTime => EmploymentTypeDb::FullTime,
            EmploymentType::PartTime => EmploymentTypeDb::PartTime,
            EmploymentType::Contract => EmploymentTypeDb::Contract,
            EmploymentType::Internship => EmploymentTypeDb::Internship,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "work_type")]
pub enum WorkTypeDb {
    #[sqlx(rename = "remote")]
    Remote,
    #[sqlx(rename = "on-site")]
    OnSite,
    #[sqlx(rename = "hybrid")]
    Hybrid,
}

impl From<WorkTypeDb> for WorkType {
    fn from(db: WorkTypeDb) -> Self {
        match db {
            WorkTypeDb::Remote => WorkType::Remote,
            WorkTypeDb::OnSite => WorkType::OnSite,
            WorkTypeDb::Hybrid => WorkType::Hybrid,
        }
    }
}

impl From<WorkType> for WorkTypeDb {
    fn from(value: WorkType) -> Self {
        match value {
            WorkType::Remote => WorkTypeDb::Remote,
            WorkType::OnSite => WorkTypeDb::OnSite,
            WorkType::Hybrid => WorkTypeDb::Hybrid,
        }
    }
}

/// Database row mapping for the work_experiences table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkExperienceEntity {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub job_title: String,
    pub employment_type: EmploymentTypeDb,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub work_type: WorkTypeDb,
    pub description: String,
    pub currently_working: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkExperienceEntity> for WorkExperience {
    fn from(entity: WorkExperienceEntity) -> Self {
        Self {
            id: entity.id,
            applicant_id: entity.applicant_id,
            job_title: entity.job_title,
            employment_type: entity.employment_type.into(),
            company: entity.company,
            start_date: entity.start_date,
            end_date: entity.end_date,
            location: entity.location,
            work_type: entity.work_type.into(),
            description: entity.description,
            currently_working: entity.currently_working,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
