use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors the auth layer can raise. Most header parsing is deliberately
/// lenient (see [`crate::plan_limits::PlanLimits::parse`]) — this type only
/// covers the cases that must fail the request outright.
#[derive(Debug)]
pub enum SecurityError {
    GatewaySecretMismatch,
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::GatewaySecretMismatch => write!(f, "gateway shared secret mismatch"),
        }
    }
}

impl std::error::Error for SecurityError {}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "errors": [{"status": "403", "title": "Forbidden", "detail": self.to_string()}]
        });
        (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
    }
}
