use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::repositories::RepositoryError;
use domain::services::ServiceError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error envelope: `{statusCode, status, message}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    status: &'static str,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                "Service temporarily unavailable. Please try again later.".to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Validation(msg) => msg,
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("Error"),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::CapacityExceeded
            | ServiceError::DuplicateGuarantor
            | ServiceError::InvalidToken
            | ServiceError::ExpiredToken => ApiError::BadRequest(err.to_string()),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::BadRequest(msg) => ApiError::BadRequest(msg),
            ServiceError::Validation(errors) => errors.into(),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::MailDelivery(e) => ApiError::ServiceUnavailable(e.to_string()),
            ServiceError::Storage(e) => ApiError::ServiceUnavailable(e.to_string()),
            ServiceError::Repository(e) => e.into(),
            ServiceError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => ApiError::Conflict("Resource already exists".into()),
            RepositoryError::Backend(msg) => ApiError::Internal(format!("Database error: {}", msg)),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict("Resource already exists".into()),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, "", &mut messages);

        let message = match messages.len() {
            0 => "Validation failed".to_string(),
            1 => messages.remove(0),
            _ => messages.join("; "),
        };
        ApiError::Validation(message)
    }
}

/// Flattens field, struct-level and nested list errors into readable lines.
fn collect_messages(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = match (prefix.is_empty(), *field == "__all__") {
            (true, true) => String::new(),
            (true, false) => field.to_string(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}.{}", prefix, field),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    out.push(msg);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::MailError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::NotFound("Applicant not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["status"], "Not Found");
        assert_eq!(json["message"], "Applicant not found");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::Internal("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[test]
    fn test_workflow_errors_are_bad_requests() {
        for err in [
            ServiceError::CapacityExceeded,
            ServiceError::DuplicateGuarantor,
            ServiceError::InvalidToken,
            ServiceError::ExpiredToken,
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_capacity_message() {
        let api: ApiError = ServiceError::CapacityExceeded.into();
        assert_eq!(
            api.to_string(),
            "Bad request: Maximum number of guarantors reached"
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let cases: Vec<(ServiceError, StatusCode)> = vec![
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                ServiceError::MailDelivery(MailError::Transport("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Repository(RepositoryError::Backend("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(msg) if msg == "Resource not found"));
    }

    #[test]
    fn test_validation_messages_are_flattened() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 3, message = "Name is too short"))]
            name: String,
        }

        let errors = Probe {
            name: "a".to_string(),
        }
        .validate()
        .unwrap_err();
        let api: ApiError = errors.into();
        assert!(matches!(api, ApiError::Validation(msg) if msg == "Name is too short"));
    }
}
