//! Work experience CRUD for the authenticated applicant.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::work_experience::{AddWorkExperienceRequest, UpdateWorkExperienceRequest};
use crate::models::WorkExperience;
use crate::repositories::WorkExperienceRepository;
use crate::services::error::ServiceError;

pub struct WorkExperienceService {
    repo: Arc<dyn WorkExperienceRepository>,
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Work experience not found".to_string())
}

impl WorkExperienceService {
    pub fn new(repo: Arc<dyn WorkExperienceRepository>) -> Self {
        Self { repo }
    }

    /// Appends entries and returns the applicant's full list.
    pub async fn add(
        &self,
        applicant_id: Uuid,
        req: AddWorkExperienceRequest,
    ) -> Result<Vec<WorkExperience>, ServiceError> {
        req.validate()?;
        self.repo
            .insert_many(applicant_id, &req.work_experience)
            .await?;

        info!(
            applicant_id = %applicant_id,
            added = req.work_experience.len(),
            "Work experience added"
        );
        self.list(applicant_id).await
    }

    /// Patches one entry and returns the applicant's full list.
    pub async fn update(
        &self,
        applicant_id: Uuid,
        id: Uuid,
        patch: UpdateWorkExperienceRequest,
    ) -> Result<Vec<WorkExperience>, ServiceError> {
        patch.validate()?;
        let mut entry = self
            .repo
            .find(applicant_id, id)
            .await?
            .ok_or_else(not_found)?;

        if patch.currently_working == Some(false) && patch.end_date.is_none() {
            return Err(ServiceError::BadRequest(
                "endDate is required when setting currentlyWorking to false".to_string(),
            ));
        }
        if patch.currently_working == Some(true) && patch.end_date.is_some() {
            return Err(ServiceError::BadRequest(
                "endDate must be empty when currentlyWorking is true".to_string(),
            ));
        }

        entry.apply(&patch);
        if !entry.currently_working && entry.end_date.is_none() {
            return Err(ServiceError::BadRequest(
                "endDate is required when not currently working".to_string(),
            ));
        }
        if matches!(entry.end_date, Some(end) if end < entry.start_date) {
            return Err(ServiceError::BadRequest(
                "endDate cannot be before startDate".to_string(),
            ));
        }
        // An end date closes a current position.
        if patch.end_date.is_some() {
            entry.currently_working = false;
        }

        if !self.repo.update(&entry).await? {
            return Err(not_found());
        }

        info!(applicant_id = %applicant_id, work_experience_id = %id, "Work experience updated");
        self.list(applicant_id).await
    }

    pub async fn list(&self, applicant_id: Uuid) -> Result<Vec<WorkExperience>, ServiceError> {
        Ok(self.repo.list(applicant_id).await?)
    }

    pub async fn get(&self, applicant_id: Uuid, id: Uuid) -> Result<WorkExperience, ServiceError> {
        self.repo.find(applicant_id, id).await?.ok_or_else(not_found)
    }

    /// Removes one entry and returns what is left.
    pub async fn delete(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<WorkExperience>, ServiceError> {
        if !self.repo.delete(applicant_id, id).await? {
            return Err(not_found());
        }
        info!(applicant_id = %applicant_id, work_experience_id = %id, "Work experience removed");
        self.list(applicant_id).await
    }
}
