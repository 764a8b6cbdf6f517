//! Schema-driven REST surface (C7): one route group per resource in the
//! registry, generated from its field/state-machine/custom-action
//! declarations instead of hand-written per-resource route modules.

pub mod envelope;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod pagination;
pub mod panic;
pub mod payload;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::ApiState;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hoster_commands::Extras;
    use hoster_data::{DataError, ListQuery, Page, Store, TransitionOutcome};
    use hoster_effects::{CheckoutSession, PaymentError, PaymentProvider, PaymentStatus};
    use hoster_schema::Row;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EmptyStore;

    #[async_trait]
    impl Store for EmptyStore {
        async fn create(&self, _: &'static str, _: Row) -> Result<Row, DataError> {
            Err(DataError::storage("not implemented"))
        }
        async fn get(&self, resource: &'static str, id: &str) -> Result<Row, DataError> {
            Err(DataError::NotFound { resource, id: id.to_string() })
        }
        async fn get_by_id(&self, resource: &'static str, id: i64) -> Result<Row, DataError> {
            Err(DataError::NotFound { resource, id: id.to_string() })
        }
        async fn get_by_field(&self, _: &'static str, _: &'static str, _: &Value) -> Result<Option<Row>, DataError> {
            Ok(None)
        }
        async fn list(&self, _: &'static str, query: ListQuery) -> Result<Page<Row>, DataError> {
            Ok(Page::new(vec![], 0, query.pagination))
        }
        async fn update(&self, _: &'static str, _: &str, _: Row) -> Result<Row, DataError> {
            Err(DataError::storage("not implemented"))
        }
        async fn delete(&self, _: &'static str, _: &str) -> Result<(), DataError> {
            Ok(())
        }
        async fn transition(&self, _: &'static str, _: &str, _: &str) -> Result<TransitionOutcome, DataError> {
            Err(DataError::storage("not implemented"))
        }
        async fn raw_query(&self, _: &str, _: Vec<Value>) -> Result<Vec<Row>, DataError> {
            Ok(vec![])
        }
        async fn raw_exec(&self, _: &str, _: Vec<Value>) -> Result<u64, DataError> {
            Ok(0)
        }
        async fn list_cloud_provisions_with_credential(&self, query: ListQuery) -> Result<Page<Row>, DataError> {
            Ok(Page::new(vec![], 0, query.pagination))
        }
    }

    struct NullPaymentProvider;

    #[async_trait]
    impl PaymentProvider for NullPaymentProvider {
        async fn create_checkout_session(&self, _: &str, _: i64) -> Result<CheckoutSession, PaymentError> {
            Err(PaymentError("not implemented".to_string()))
        }
        async fn check_status(&self, _: &str) -> Result<PaymentStatus, PaymentError> {
            Err(PaymentError("not implemented".to_string()))
        }
    }

    fn test_state() -> ApiState {
        ApiState::new(
            Arc::new(EmptyStore),
            hoster_commands::default_bus(),
            Extras::new(),
            Arc::new(NullPaymentProvider),
            Arc::new(hoster_effects::AesGcmCipher::new(&[7u8; 32]).unwrap()),
            None,
        )
    }

    #[tokio::test]
    async fn health_endpoint_reports_healthy() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn listing_an_unknown_resource_is_a_404_not_found_route() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/not_a_resource").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/deployment")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"data\":{\"attributes\":{}}}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_missing_row_is_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/template/tmpl_does_not_exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
