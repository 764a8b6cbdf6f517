use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn liveness() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

pub async fn readiness() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "ready"})))
}
