//! Work experience routes. Every handler is scoped to the session's
//! applicant.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use domain::models::work_experience::{AddWorkExperienceRequest, UpdateWorkExperienceRequest};
use domain::models::WorkExperience;
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApplicantAuth};
use crate::response::ApiSuccess;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceList {
    pub work_experience: Vec<WorkExperience>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceItem {
    pub work_experience: WorkExperience,
}

fn list(work_experience: Vec<WorkExperience>) -> WorkExperienceList {
    WorkExperienceList { work_experience }
}

/// GET /api/v1/applicants/work-experience
pub async fn list_work_experience(
    State(state): State<AppState>,
    auth: ApplicantAuth,
) -> Result<ApiSuccess<WorkExperienceList>, ApiError> {
    let entries = state.work_experience.list(auth.id()).await?;
    Ok(ApiSuccess::ok(
        "Applicant work experience retrieved successfully",
        list(entries),
    ))
}

/// POST /api/v1/applicants/work-experience
pub async fn add_work_experience(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Json(request), _): ApiJson<AddWorkExperienceRequest>,
) -> Result<ApiSuccess<WorkExperienceList>, ApiError> {
    let entries = state.work_experience.add(auth.id(), request).await?;
    Ok(ApiSuccess::ok(
        "Work experience added successfully",
        list(entries),
    ))
}

/// GET /api/v1/applicants/work-experience/:id
pub async fn get_work_experience(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ApiSuccess<WorkExperienceItem>, ApiError> {
    let work_experience = state.work_experience.get(auth.id(), id).await?;
    Ok(ApiSuccess::ok(
        "Work experience retrieved successfully",
        WorkExperienceItem { work_experience },
    ))
}

/// PUT /api/v1/applicants/work-experience/:id
pub async fn update_work_experience(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(patch), _): ApiJson<UpdateWorkExperienceRequest>,
) -> Result<ApiSuccess<WorkExperienceList>, ApiError> {
    let entries = state.work_experience.update(auth.id(), id, patch).await?;
    Ok(ApiSuccess::ok(
        "Work experience updated successfully",
        list(entries),
    ))
}

/// DELETE /api/v1/applicants/work-experience/:id
pub async fn delete_work_experience(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ApiSuccess<WorkExperienceList>, ApiError> {
    let entries = state.work_experience.delete(auth.id(), id).await?;
    Ok(ApiSuccess::ok("Removed work experience", list(entries)))
}
