//! SQLite backend for the Hoster [`Store`](hoster_data::Store) trait.
//!
//! A single [`SqliteStore`] drives every resource in the schema registry —
//! there is no per-resource repository type. [`migration::run_migrations`]
//! creates every table from the same registry at startup.

pub mod codec;
pub mod error;
pub mod migration;
pub mod store;
pub mod where_clause;

pub use error::SqlxErrorExt;
pub use migration::run_migrations;
pub use store::SqliteStore;

pub mod prelude {
    pub use crate::{run_migrations, SqliteStore, SqlxErrorExt};
    pub use hoster_data::{DataError, Filter, ListQuery, Page, Pagination, Store, TransitionOutcome};
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoster_data::{ListQuery, Pagination, Store};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn in_memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory sqlite");
        run_migrations(&pool).await.expect("run migrations");
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = in_memory_store().await;
        let user = store
            .create(
                "user",
                hoster_schema::Row::from_iter([
                    ("external_id".to_string(), json!("auth0|abc")),
                ]),
            )
            .await
            .expect("create user");
        let reference_id = user["reference_id"].as_str().unwrap().to_string();

        let fetched = store.get("user", &reference_id).await.expect("get user");
        assert_eq!(fetched["external_id"], json!("auth0|abc"));
    }

    #[tokio::test]
    async fn create_rejects_missing_required_field() {
        let store = in_memory_store().await;
        let err = store.create("user", hoster_schema::Row::new()).await;
        assert!(matches!(err, Err(hoster_data::DataError::Validation(_))));
    }

    #[tokio::test]
    async fn transition_rejects_invalid_jump_and_accepts_valid_one() {
        let store = in_memory_store().await;
        let user = store
            .create(
                "user",
                hoster_schema::Row::from_iter([("external_id".to_string(), json!("u1"))]),
            )
            .await
            .unwrap();
        let template = store
            .create(
                "template",
                hoster_schema::Row::from_iter([
                    ("creator_id".to_string(), json!(user["id"].as_i64().unwrap())),
                    ("name".to_string(), json!("Postgres")),
                    ("version".to_string(), json!("1.0.0")),
                    ("compose_spec".to_string(), json!("services: {}")),
                ]),
            )
            .await
            .unwrap();
        let deployment = store
            .create(
                "deployment",
                hoster_schema::Row::from_iter([
                    ("customer_id".to_string(), json!(user["id"].as_i64().unwrap())),
                    (
                        "template_id".to_string(),
                        json!(template["id"].as_i64().unwrap()),
                    ),
                ]),
            )
            .await
            .unwrap();
        let reference_id = deployment["reference_id"].as_str().unwrap().to_string();

        let invalid = store.transition("deployment", &reference_id, "running").await;
        assert!(matches!(
            invalid,
            Err(hoster_data::DataError::InvalidTransition { .. })
        ));

        let outcome = store
            .transition("deployment", &reference_id, "scheduled")
            .await
            .expect("valid transition");
        assert_eq!(outcome.row["status"], json!("scheduled"));
        assert_eq!(outcome.command, Some("schedule_deployment"));
    }

    #[tokio::test]
    async fn list_honors_pagination_and_filters() {
        let store = in_memory_store().await;
        let user = store
            .create(
                "user",
                hoster_schema::Row::from_iter([("external_id".to_string(), json!("u2"))]),
            )
            .await
            .unwrap();
        for name in ["a", "b", "c"] {
            store
                .create(
                    "template",
                    hoster_schema::Row::from_iter([
                        ("creator_id".to_string(), json!(user["id"].as_i64().unwrap())),
                        ("name".to_string(), json!(name)),
                        ("version".to_string(), json!("1.0.0")),
                        ("compose_spec".to_string(), json!("services: {}")),
                    ]),
                )
                .await
                .unwrap();
        }

        let page = store
            .list(
                "template",
                ListQuery::new(Pagination::new(Some(2), Some(0))),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.content.len(), 2);
    }
}
