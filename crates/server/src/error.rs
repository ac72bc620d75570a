use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use petstore_agent::FieldErrors;
use petstore_db::StoreError;
use serde::Serialize;

/// Error envelope returned by every API route: `{"error": "..."}`, plus
/// `fieldErrors` for form validation failures.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    field_errors: Option<FieldErrors>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), field_errors: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(singular: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{singular} not found"))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn invalid_form(field_errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid form data.".to_string(),
            field_errors: Some(field_errors),
        }
    }

    /// Body that failed to parse into the resource's creation payload.
    pub fn invalid_payload(resource: &str, rejection: &JsonRejection) -> Self {
        Self::bad_request(format!("Invalid {resource} payload: {}", rejection.body_text()))
    }

    pub fn invalid_query(rejection: &QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query: {}", rejection.body_text()))
    }

    /// Store failure during a write. Domain rejections keep their message,
    /// anything else collapses to `Failed to add <resource>`.
    pub fn from_store(error: &StoreError, resource: &str) -> Self {
        match error {
            StoreError::Domain(domain) => Self::bad_request(domain.to_string()),
            StoreError::SequenceExhausted { .. } => {
                Self::internal(format!("Failed to add {resource}"))
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, field_errors: self.field_errors };
        (self.status, Json(body)).into_response()
    }
}
