use std::collections::HashMap;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hoster_commands::CommandContext;
use hoster_data::{Filter, ListQuery};
use hoster_effects::PaymentStatus;
use hoster_schema::{resource as lookup_resource, Resource, Row};
use hoster_security::AuthContext;
use serde_json::{json, Value};

use crate::envelope;
use crate::error::ApiError;
use crate::filters;
use crate::pagination;
use crate::payload::{encrypt_fields, strip_internal};
use crate::state::ApiState;

fn is_owner_of(def: &Resource, auth: &AuthContext, row: &Row) -> bool {
    match def.owner_field {
        Some(owner_field) => {
            let owner_id = row.get(owner_field).and_then(Value::as_i64);
            hoster_authz::is_owner(auth.user_id, owner_id)
        }
        None => true,
    }
}

fn is_visible(def: &Resource, auth: &AuthContext, row: &Row) -> bool {
    if let Some(visibility) = def.visibility {
        return visibility(auth.user_id, row);
    }
    if def.public_read {
        return true;
    }
    is_owner_of(def, auth, row)
}

fn attributes_of(body: &Value) -> Result<Row, ApiError> {
    let attributes = body.get("data").and_then(|d| d.get("attributes")).cloned().unwrap_or(json!({}));
    match attributes {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest("expected data.attributes object".to_string())),
    }
}

pub async fn list(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let pagination = pagination::parse(&params);
    let mut query = ListQuery::new(pagination);
    for filter in filters::parse(def, &params)? {
        query = query.filter(filter);
    }
    if let (Some(owner_field), false, true) = (def.owner_field, def.public_read, auth.is_authenticated()) {
        query = query.filter(Filter::Eq(owner_field, json!(auth.user_id)));
    }
    let mut page = state.store.list(def.name, query).await?;
    if let Some(visibility) = def.visibility {
        page.content.retain(|row| visibility(auth.user_id, row));
    }
    Ok(Json(envelope::list(def, &page)))
}

pub async fn create(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if !auth.is_authenticated() {
        return Err(ApiError::Unauthorized("authentication required".to_string()));
    }
    let mut payload = strip_internal(def, attributes_of(&body)?);
    if let Some(owner_field) = def.owner_field {
        payload.insert(owner_field.to_string(), json!(auth.user_id));
    }
    if def.name == "deployment" {
        check_deployment_quota(&state, &auth).await?;
    }
    if let Some(hook) = def.before_create {
        hook(&mut payload).map_err(ApiError::BadRequest)?;
    }
    let payload = encrypt_fields(def, &*state.credential_cipher, payload)?;
    let row = state.store.create(def.name, payload).await?;
    Ok(Json(envelope::single(def, &row)))
}

async fn check_deployment_quota(state: &ApiState, auth: &AuthContext) -> Result<(), ApiError> {
    let current = state
        .store
        .list(
            "deployment",
            ListQuery::new(hoster_data::Pagination::new(Some(1), Some(0)))
                .filter(Filter::Eq("customer_id", json!(auth.user_id))),
        )
        .await?
        .total as i64;
    let (allowed, reason) = hoster_authz::can_create_deployment(auth, current);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden(reason.unwrap_or_else(|| "plan limit reached".to_string())))
    }
}

pub async fn get_one(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let row = state.store.get(def.name, &id).await?;
    if !is_visible(def, &auth, &row) {
        return Err(ApiError::NotFound(format!("{} not found", def.name)));
    }
    Ok(Json(envelope::single(def, &row)))
}

pub async fn patch(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let row = state.store.get(def.name, &id).await?;
    if !is_owner_of(def, &auth, &row) {
        return Err(ApiError::Forbidden(format!("not the owner of this {}", def.name)));
    }
    let payload = strip_internal(def, attributes_of(&body)?);
    let payload = encrypt_fields(def, &*state.credential_cipher, payload)?;
    let updated = state.store.update(def.name, &id, payload).await?;
    Ok(Json(envelope::single(def, &updated)))
}

pub async fn delete(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let row = state.store.get(def.name, &id).await?;
    if !is_owner_of(def, &auth, &row) {
        return Err(ApiError::Forbidden(format!("not the owner of this {}", def.name)));
    }
    if let Some(hook) = def.before_delete {
        hook(&row).map_err(ApiError::Conflict)?;
    }
    state.store.delete(def.name, &id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn transition(
    def: &'static Resource,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, to_state)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let row = state.store.get(def.name, &id).await?;
    if !is_owner_of(def, &auth, &row) {
        return Err(ApiError::Forbidden(format!("not the owner of this {}", def.name)));
    }
    let outcome = state.store.transition(def.name, &id, &to_state).await?;
    if let Some(command) = outcome.command {
        let ctx = CommandContext { store: state.store.clone(), extras: state.extras.clone(), bus: state.bus.clone() };
        let bus = state.bus.clone();
        let resource = def.name;
        let reference_id = id.clone();
        let dispatch_row = outcome.row.clone();
        tokio::spawn(async move {
            if let Err(err) = bus.dispatch(ctx, command, resource, reference_id, dispatch_row).await {
                tracing::error!(error = %err, command, resource, "on-enter command dispatch failed");
            }
        });
    }
    Ok(Json(envelope::single(def, &outcome.row)))
}

pub async fn custom_action(
    def: &'static Resource,
    action: &'static str,
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match (def.name, action) {
        ("template", "publish") => publish_template(state, auth, id).await,
        ("invoice", "pay") => pay_invoice(state, auth, id).await,
        ("invoice", "verify-payment") => verify_invoice_payment(state, auth, id).await,
        _ => Err(ApiError::NotFound(format!("no handler registered for {}.{action}", def.name))),
    }
}

async fn publish_template(state: ApiState, auth: AuthContext, id: String) -> Result<Json<Value>, ApiError> {
    let def = lookup_resource("template").expect("template resource is registered");
    let row = state.store.get("template", &id).await?;
    let creator_id = row.get("creator_id").and_then(Value::as_i64);
    if !hoster_authz::is_owner(auth.user_id, creator_id) {
        return Err(ApiError::NotFound("template not found".to_string()));
    }
    let mut patch = Row::new();
    patch.insert("published".to_string(), json!(true));
    let updated = state.store.update("template", &id, patch).await?;
    Ok(Json(envelope::single(def, &updated)))
}

async fn pay_invoice(state: ApiState, auth: AuthContext, id: String) -> Result<Json<Value>, ApiError> {
    let def = lookup_resource("invoice").expect("invoice resource is registered");
    let row = state.store.get("invoice", &id).await?;
    let owner_id = row.get("user_id").and_then(Value::as_i64);
    if !hoster_authz::is_owner(auth.user_id, owner_id) {
        return Err(ApiError::NotFound("invoice not found".to_string()));
    }
    let total_cents = row.get("total_cents").and_then(Value::as_i64).unwrap_or(0);
    // The checkout session id is taken to be the invoice reference id itself:
    // the schema has no dedicated session-id column, and the payment provider
    // is expected to support status lookup by the id it was given at creation.
    let session = state
        .payment_provider
        .create_checkout_session(&id, total_cents)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let outcome = state.store.transition("invoice", &id, "pending").await?;
    let mut document = envelope::single(def, &outcome.row);
    if let Some(object) = document.as_object_mut() {
        object.insert("meta".to_string(), json!({ "checkout_url": session.checkout_url }));
    }
    Ok(Json(document))
}

async fn verify_invoice_payment(state: ApiState, auth: AuthContext, id: String) -> Result<Json<Value>, ApiError> {
    let def = lookup_resource("invoice").expect("invoice resource is registered");
    let row = state.store.get("invoice", &id).await?;
    let owner_id = row.get("user_id").and_then(Value::as_i64);
    if !hoster_authz::is_owner(auth.user_id, owner_id) {
        return Err(ApiError::NotFound("invoice not found".to_string()));
    }
    let status = state
        .payment_provider
        .check_status(&id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let row = match status {
        PaymentStatus::Paid => state.store.transition("invoice", &id, "paid").await?.row,
        PaymentStatus::Failed => state.store.transition("invoice", &id, "failed").await?.row,
        PaymentStatus::Pending => row,
    };
    Ok(Json(envelope::single(def, &row)))
}
