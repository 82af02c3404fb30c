//! Success envelope shared by every JSON endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{success, status_code, message, data}`
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            data,
            status,
        }
    }
}

impl ApiSuccess<()> {
    /// A success without payload; `data` serializes as `null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let body = serde_json::to_value(ApiSuccess::created("Created", vec![1, 2])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["status_code"], 201);
        assert_eq!(body["message"], "Created");
        assert_eq!(body["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_message_only() {
        let response = ApiSuccess::message("Logged out").into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = serde_json::to_value(ApiSuccess::message("Logged out")).unwrap();
        assert!(body["data"].is_null());
    }
}
