//! Custom Axum extractors.

pub mod applicant_auth;

pub use applicant_auth::ApplicantAuth;

use axum::Json;
use axum_extra::extract::WithRejection;

use crate::error::ApiError;

/// JSON body whose parse failures render as the standard error envelope.
pub type ApiJson<T> = WithRejection<Json<T>, ApiError>;
