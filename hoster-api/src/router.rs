use axum::routing::{delete, get, patch, post};
use axum::Router;
use hoster_schema::{all_resources, HttpMethod, Resource};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::health;
use crate::middleware;
use crate::panic::panic_response;
use crate::state::ApiState;

/// Builds the full API router: one route group per resource in the
/// registry, generated from its declared fields, state machine, and
/// custom actions rather than hand-written per-resource modules.
pub fn build_router(state: ApiState) -> Router {
    let mut api = Router::new();
    for def in all_resources() {
        api = api.merge(resource_router(def));
    }

    // Inner to outer: request-id injector, panic recoverer, identity
    // resolution (gateway secret check folded in), CORS, JSON:API media type.
    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::resolve_identity))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::set_jsonapi_media_type))
        .with_state(state)
}

fn resource_router(def: &'static Resource) -> Router<ApiState> {
    let base = format!("/{}", def.name);
    let item = format!("/{}/{{id}}", def.name);

    let mut router = Router::new()
        .route(
            &base,
            get(move |state, auth, query| handlers::list(def, state, auth, query))
                .post(move |state, auth, body| handlers::create(def, state, auth, body)),
        )
        .route(
            &item,
            get(move |state, auth, id| handlers::get_one(def, state, auth, id))
                .patch(move |state, auth, id, body| handlers::patch(def, state, auth, id, body))
                .delete(move |state, auth, id| handlers::delete(def, state, auth, id)),
        );

    if def.state_machine.is_some() {
        let transition_path = format!("/{}/{{id}}/transition/{{state}}", def.name);
        router = router.route(
            &transition_path,
            post(move |state, auth, path| handlers::transition(def, state, auth, path)),
        );
    }

    for action in def.custom_actions {
        let action_path = format!("/{}/{{id}}/{}", def.name, action.name);
        let route = match action.method {
            HttpMethod::Get => get(move |state, auth, id| handlers::custom_action(def, action.name, state, auth, id)),
            HttpMethod::Post => post(move |state, auth, id| handlers::custom_action(def, action.name, state, auth, id)),
            HttpMethod::Patch => patch(move |state, auth, id| handlers::custom_action(def, action.name, state, auth, id)),
            HttpMethod::Delete => {
                delete(move |state, auth, id| handlers::custom_action(def, action.name, state, auth, id))
            }
        };
        router = router.route(&action_path, route);
    }

    router
}
