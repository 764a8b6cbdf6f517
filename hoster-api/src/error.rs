use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hoster_data::DataError;
use serde_json::json;

/// The document-envelope error shape every endpoint reports through:
/// `{"errors":[{"status":"404","title":"Not Found","detail":"..."}]}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "Not Found", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "Bad Request", detail.clone()),
            ApiError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, "Unauthorized", detail.clone()),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "Forbidden", detail.clone()),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "Conflict", detail.clone()),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", detail.clone()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (status, title, detail) = self.parts();
        write!(f, "{status} {title}: {detail}")
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title, detail) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail, "request failed");
        }
        let body = json!({
            "errors": [{
                "status": status.as_u16().to_string(),
                "title": title,
                "detail": detail,
            }]
        });
        (status, Json(body)).into_response()
    }
}

/// A row that genuinely does not exist always reports 404 here. Ownership
/// mismatches are a separate decision made by the handler: `get_one` also
/// reports 404 for those (existence is not revealed to a non-owner), but
/// write paths (`patch`/`delete`/`transition`) report 403 instead, since the
/// caller is authenticated and the row's existence is not what's in
/// question.
impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DataError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            DataError::GuardFailed { .. } => ApiError::Conflict(err.to_string()),
            DataError::Validation(errors) => ApiError::BadRequest(
                errors.into_iter().map(|e| e.message).collect::<Vec<_>>().join("; "),
            ),
            DataError::Storage(message) => ApiError::Internal(message),
        }
    }
}
