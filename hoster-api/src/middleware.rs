use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hoster_schema::Row;
use hoster_security::{check_gateway_secret, resolve, AuthContext};
use serde_json::json;
use uuid::Uuid;

use crate::state::ApiState;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static JSONAPI_MEDIA_TYPE: HeaderValue = HeaderValue::from_static("application/vnd.api+json");

/// Rewrites the response `Content-Type` for everything under `/api/v1` from
/// axum's default `application/json` to the JSON:API media type. Added as
/// the outermost layer so it still runs on responses the panic recoverer
/// has already converted to a normal response. Responses with no body (a
/// `204` from `delete`) carry no `Content-Type` to begin with and are left
/// alone.
pub async fn set_jsonapi_media_type(req: Request, next: Next) -> Response {
    let is_api = req.uri().path().starts_with("/api/v1");
    let mut response = next.run(req).await;
    if is_api && response.headers().contains_key(axum::http::header::CONTENT_TYPE) {
        response.headers_mut().insert(axum::http::header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE.clone());
    }
    response
}

/// Propagates or generates a request id, same shape as the request-id
/// middleware elsewhere in this stack: read `X-Request-Id` if present,
/// otherwise mint a UUID v4, stash it as an extension, echo it back out.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Checks `X-APIGate-Secret` (when a secret is configured), then resolves
/// identity from trusted headers and upserts the external user id into the
/// `user` table so every authenticated request carries a resolved internal
/// `user_id`. Two concurrent first-time callers racing this upsert both
/// retry the lookup on a unique-constraint failure rather than erroring —
/// the insert is there to make the row exist, not to own exclusive
/// creation rights over it.
pub async fn resolve_identity(State(state): State<ApiState>, mut req: Request, next: Next) -> Response {
    if check_gateway_secret(req.headers(), state.gateway_secret.as_deref()).is_err() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"errors": [{"status": "403", "title": "Forbidden", "detail": "gateway secret mismatch"}]})),
        )
            .into_response();
    }

    let mut ctx = resolve(req.headers());
    if ctx.is_authenticated() {
        match upsert_user(&state, ctx.external_user_id().unwrap()).await {
            Ok(user_id) => ctx = ctx.with_user_id(user_id),
            Err(err) => {
                tracing::error!(error = %err, "identity middleware: failed to resolve user row");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"errors": [{"status": "500", "title": "Internal Server Error", "detail": "identity resolution failed"}]})),
                )
                    .into_response();
            }
        }
    }
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

async fn upsert_user(state: &ApiState, external_id: &str) -> Result<i64, hoster_data::DataError> {
    if let Some(existing) = state.store.get_by_field("user", "external_id", &json!(external_id)).await? {
        return Ok(existing.get("id").and_then(|v| v.as_i64()).unwrap_or_default());
    }
    let mut payload = Row::new();
    payload.insert("external_id".to_string(), json!(external_id));
    match state.store.create("user", payload).await {
        Ok(row) => Ok(row.get("id").and_then(|v| v.as_i64()).unwrap_or_default()),
        Err(_) => {
            // Lost the race against a concurrent first request for the same
            // external id; the row now exists under the unique constraint.
            let row = state
                .store
                .get_by_field("user", "external_id", &json!(external_id))
                .await?
                .ok_or_else(|| hoster_data::DataError::storage("user row missing after create race"))?;
            Ok(row.get("id").and_then(|v| v.as_i64()).unwrap_or_default())
        }
    }
}