//! Applicant entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{Applicant, Gender, StoredFile};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "applicant_gender", rename_all = "lowercase")]
pub enum GenderDb {
    Male,
    Female,
    Other,
}

impl From<GenderDb> for Gender {
    fn from(db: GenderDb) -> Self {
        match db {
            GenderDb::Male => Gender::Male,
            GenderDb::Female => Gender::Female,
            GenderDb::Other => Gender::Other,
        }
    }
}

impl From<Gender> for GenderDb {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => GenderDb::Male,
            Gender::Female => GenderDb::Female,
            Gender::Other => GenderDb::Other,
        }
    }
}

/// Database row mapping for the applicants table.
///
/// Uploaded files are flattened into `avatar_*` and `resume_*` columns.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantEntity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: GenderDb,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub postal_code: Option<String>,
    pub age: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub nin: Option<String>,
    pub bvn: Option<String>,
    pub skills: Vec<String>,
    pub avatar_public_id: Option<String>,
    pub avatar_url: Option<String>,
    pub avatar_uploaded_at: Option<DateTime<Utc>>,
    pub resume_public_id: Option<String>,
    pub resume_url: Option<String>,
    pub resume_uploaded_at: Option<DateTime<Utc>>,
    pub password_version: i32,
    pub is_active: bool,
    pub is_verified: bool,
    pub can_take_assessment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn stored_file(
    public_id: Option<String>,
    url: Option<String>,
    uploaded_at: Option<DateTime<Utc>>,
) -> Option<StoredFile> {
    match (public_id, url, uploaded_at) {
        (Some(public_id), Some(secure_url), Some(uploaded_at)) => Some(StoredFile {
            public_id,
            secure_url,
            uploaded_at,
        }),
        _ => None,
    }
}

impl From<ApplicantEntity> for Applicant {
    fn from(entity: ApplicantEntity) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            password_hash: entity.password_hash,
            gender: entity.gender.into(),
            phone_number: entity.phone_number,
            address: entity.address,
            country: entity.country,
            state: entity.state,
            lga: entity.lga,
            postal_code: entity.postal_code,
            age: entity.age,
            date_of_birth: entity.date_of_birth,
            nin: entity.nin,
            bvn: entity.bvn,
            skills: entity.skills,
            avatar: stored_file(
                entity.avatar_public_id,
                entity.avatar_url,
                entity.avatar_uploaded_at,
            ),
            resume: stored_file(
                entity.resume_public_id,
                entity.resume_url,
                entity.resume_uploaded_at,
            ),
            password_version: entity.password_version,
            is_active: entity.is_active,
            is_verified: entity.is_verified,
            can_take_assessment: entity.can_take_assessment,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
