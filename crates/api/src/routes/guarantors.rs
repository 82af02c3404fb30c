//! Guarantor invitation routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use domain::models::guarantor::{
    GuarantorFormRequest, SendInviteRequest, SentInvitation, SubmittedForm,
};
use domain::models::{Guarantor, GuarantorInvitation};
use domain::services::ServiceError;
use serde::{Deserialize, Serialize};
use shared::pagination::{PageMeta, PageQuery};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApplicantAuth};
use crate::middleware::metrics::{record_guarantor_submission, record_invitation_sent};
use crate::response::ApiSuccess;

#[derive(Debug, Deserialize)]
pub struct SubmitFormQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationsData {
    pub guarantor_invitations: Vec<GuarantorInvitation>,
}

#[derive(Debug, Serialize)]
pub struct GuarantorData {
    pub guarantor: Guarantor,
}

#[derive(Debug, Serialize)]
pub struct GuarantorsPage {
    pub guarantors: Vec<Guarantor>,
    pub pagination: PageMeta,
}

/// POST /api/v1/guarantors/send-invite
pub async fn send_invite(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Json(request), _): ApiJson<SendInviteRequest>,
) -> Result<ApiSuccess<SentInvitation>, ApiError> {
    request.validate()?;
    let sent = state.guarantors.send_invite(auth.id(), &request.email).await?;
    record_invitation_sent(sent.email_delivered);

    Ok(ApiSuccess::ok("Guarantor invitation sent successfully", sent))
}

/// GET /api/v1/guarantors/invites
pub async fn get_invites(
    State(state): State<AppState>,
    auth: ApplicantAuth,
) -> Result<ApiSuccess<InvitationsData>, ApiError> {
    let guarantor_invitations = state.guarantors.get_invites(auth.id()).await?;

    Ok(ApiSuccess::ok(
        "Guarantor invitations fetched successfully",
        InvitationsData {
            guarantor_invitations,
        },
    ))
}

/// POST /api/v1/guarantors/submit-form?token=...
///
/// Unauthenticated: the invitation token is the credential.
pub async fn submit_form(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SubmitFormQuery>, ApiError>,
    WithRejection(Json(form), _): ApiJson<GuarantorFormRequest>,
) -> Result<ApiSuccess<SubmittedForm>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ServiceError::InvalidToken)?;

    let submitted = state.guarantors.submit_form(token.trim(), form).await?;
    record_guarantor_submission(submitted.invitation_completed);

    Ok(ApiSuccess::ok("Guarantor added successfully", submitted))
}

/// GET /api/v1/guarantors?page=&limit=
pub async fn list_guarantors(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<ApiSuccess<GuarantorsPage>, ApiError> {
    let page = state.guarantors.list_guarantors(auth.id(), &query).await?;

    Ok(ApiSuccess::ok(
        "Guarantors fetched successfully",
        GuarantorsPage {
            guarantors: page.items,
            pagination: page.pagination,
        },
    ))
}

/// GET /api/v1/guarantors/:guarantor_id
pub async fn get_guarantor(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(Path(guarantor_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ApiSuccess<GuarantorData>, ApiError> {
    let guarantor = state
        .guarantors
        .get_guarantor(auth.id(), guarantor_id)
        .await?;

    Ok(ApiSuccess::ok(
        "Guarantor fetched successfully",
        GuarantorData { guarantor },
    ))
}
