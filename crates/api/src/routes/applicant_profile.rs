//! Applicant account and profile routes.

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDate};
use domain::models::applicant::{
    EmailRequest, LoginRequest, LoginResponse, ResetPasswordRequest, SignupRequest,
    VerifyOtpRequest,
};
use domain::models::{ApplicantProfile, WorkExperience, WorkExperienceInput};
use domain::services::{FileUpload, OtpOutcome, ProfileUpdate};
use serde::Serialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApplicantAuth};
use crate::response::ApiSuccess;

const ONE_FILE_ONLY: &str = "Only one file can be uploaded at a time.";

/// Plain text multipart fields copied into the profile update as-is.
const TEXT_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "phoneNumber",
    "country",
    "state",
    "lga",
    "postalCode",
    "gender",
    "address",
    "nin",
    "bvn",
];

#[derive(Debug, Serialize)]
pub struct ApplicantData {
    pub applicant: ApplicantProfile,
}

/// Profile plus its work experience, as returned by the profile endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    #[serde(flatten)]
    pub profile: ApplicantProfile,
    pub work_experience: Vec<WorkExperience>,
}

#[derive(Debug, Serialize)]
pub struct ApplicantViewData {
    pub applicant: ApplicantView,
}

async fn view(state: &AppState, profile: ApplicantProfile) -> Result<ApplicantViewData, ApiError> {
    let work_experience = state.work_experience.list(profile.id).await?;
    Ok(ApplicantViewData {
        applicant: ApplicantView {
            profile,
            work_experience,
        },
    })
}

/// POST /api/v1/applicants/profile/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<SignupRequest>,
) -> Result<ApiSuccess<ApplicantData>, ApiError> {
    let (applicant, otp_sent) = state.profiles.signup(request).await?;

    let message = if otp_sent {
        format!("Registration Successful. OTP sent to {}", applicant.email)
    } else {
        "Registration Successful. The verification email could not be sent; request a new OTP."
            .to_string()
    };
    Ok(ApiSuccess::created(message, ApplicantData { applicant }))
}

/// POST /api/v1/applicants/profile/auth/login
///
/// The session token is returned only as an httpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<LoginRequest>,
) -> Result<(HeaderMap, ApiSuccess<LoginResponse>), ApiError> {
    let outcome = state.profiles.login(request).await?;

    let mut headers = HeaderMap::new();
    state
        .cookies
        .add_session_cookie(&mut headers, &outcome.session_token);

    Ok((
        headers,
        ApiSuccess::ok(
            "Login Successful",
            LoginResponse {
                applicant: outcome.profile,
                token: None,
            },
        ),
    ))
}

/// GET /api/v1/applicants/profile/auth/validate-user
pub async fn validate_user(
    State(state): State<AppState>,
    auth: ApplicantAuth,
) -> Result<ApiSuccess<ApplicantViewData>, ApiError> {
    let data = view(&state, ApplicantProfile::from(&auth.0)).await?;
    Ok(ApiSuccess::ok("Profile Validated", data))
}

/// POST /api/v1/applicants/profile/auth/request-otp
pub async fn request_otp(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<EmailRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    request.validate()?;
    let message = match state.profiles.request_otp(&request.email).await? {
        OtpOutcome::AlreadyVerified => "Profile already verified".to_string(),
        _ => format!("OTP sent to {}", request.email.trim()),
    };
    Ok(ApiSuccess::message(message))
}

/// POST /api/v1/applicants/profile/auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<VerifyOtpRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let message = match state.profiles.verify_otp(request).await? {
        OtpOutcome::AlreadyVerified => "Profile already verified",
        _ => "Email verified",
    };
    Ok(ApiSuccess::message(message))
}

/// POST /api/v1/applicants/profile/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<EmailRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    request.validate()?;
    state.profiles.forgot_password(&request.email).await?;
    Ok(ApiSuccess::message(format!(
        "OTP sent to {}",
        request.email.trim()
    )))
}

/// POST /api/v1/applicants/profile/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): ApiJson<ResetPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state.profiles.reset_password(request).await?;
    Ok(ApiSuccess::message("Password updated successfully"))
}

/// POST /api/v1/applicants/profile/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: ApplicantAuth,
) -> (HeaderMap, ApiSuccess<()>) {
    let mut headers = HeaderMap::new();
    state.cookies.add_clear_cookie(&mut headers);

    tracing::info!(applicant_id = %auth.id(), "Applicant logged out");
    (headers, ApiSuccess::message("Logout successful"))
}

/// GET /api/v1/applicants/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: ApplicantAuth,
) -> Result<ApiSuccess<ApplicantViewData>, ApiError> {
    let profile = state.profiles.get_profile(auth.id()).await?;
    Ok(ApiSuccess::ok("Profile Retrieved", view(&state, profile).await?))
}

/// PUT /api/v1/applicants/profile (multipart/form-data)
pub async fn update_profile(
    State(state): State<AppState>,
    auth: ApplicantAuth,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<ApiSuccess<ApplicantViewData>, ApiError> {
    let update = parse_profile_form(multipart).await?;
    let profile = state.profiles.update_profile(auth.id(), update).await?;
    Ok(ApiSuccess::ok("Profile Updated", view(&state, profile).await?))
}

/// Reads the multipart profile form. Empty text parts count as absent.
async fn parse_profile_form(mut multipart: Multipart) -> Result<ProfileUpdate, ApiError> {
    let mut fields = Map::new();
    let mut update = ProfileUpdate::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "avatar" || name == "resume" {
            let slot = if name == "avatar" {
                &mut update.avatar
            } else {
                &mut update.resume
            };
            if slot.is_some() {
                return Err(ApiError::BadRequest(ONE_FILE_ONLY.to_string()));
            }
            let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                continue;
            }
            *slot = Some(FileUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field.text().await?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match name.as_str() {
            "skills" => {
                let skills = parse_list(text)?;
                fields.insert(name, Value::from(skills));
            }
            "workExperience" => {
                update.work_experience = Some(parse_work_experience(text)?);
            }
            "age" => {
                let age: i32 = text
                    .parse()
                    .map_err(|_| ApiError::BadRequest("Age must be a number".to_string()))?;
                fields.insert(name, Value::from(age));
            }
            "dateOfBirth" => {
                let date = parse_date(text)?;
                fields.insert(name, Value::from(date.format("%Y-%m-%d").to_string()));
            }
            n if TEXT_FIELDS.contains(&n) => {
                fields.insert(name, Value::from(text.to_string()));
            }
            other => {
                return Err(ApiError::BadRequest(format!("Unrecognized field: {}", other)));
            }
        }
    }

    update.fields = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::BadRequest(format!("Invalid profile field: {}", e)))?;
    Ok(update)
}

/// Accepts a JSON array of strings or a comma separated list.
fn parse_list(text: &str) -> Result<Vec<String>, ApiError> {
    if text.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(text)
            .map_err(|_| ApiError::BadRequest("Invalid value for skills".to_string()))?;
        return Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect());
    }
    Ok(text
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn parse_work_experience(text: &str) -> Result<Vec<WorkExperienceInput>, ApiError> {
    serde_json::from_str(text)
        .map_err(|e| ApiError::BadRequest(format!("Invalid value for workExperience: {}", e)))
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp.
fn parse_date(text: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::BadRequest("Invalid dateOfBirth".to_string()))
}
