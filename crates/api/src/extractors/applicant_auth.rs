//! Session authentication for applicant routes.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use domain::models::Applicant;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The applicant owning the session.
///
/// The token is read from `Authorization: Bearer` first, then from the
/// session cookie.
#[derive(Debug, Clone)]
pub struct ApplicantAuth(pub Applicant);

impl ApplicantAuth {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ApplicantAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let token = bearer
            .or_else(|| {
                state
                    .cookies
                    .extract_session_token(&parts.headers)
                    .map(str::to_string)
            })
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let applicant = state.profiles.authenticate(&token).await?;
        Ok(ApplicantAuth(applicant))
    }
}
