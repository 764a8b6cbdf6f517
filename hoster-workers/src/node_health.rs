//! Node health checker (spec period: 60s). Pings every non-maintenance
//! node and records its reachability.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hoster_data::{DataError, Filter, ListQuery, Pagination, Store};
use hoster_effects::DockerNodePool;
use hoster_schema::Row;
use serde_json::{json, Value};

use crate::support::{spawn_interval_worker, WorkerHandle};

pub fn spawn(store: Arc<dyn Store>, pool: Arc<dyn DockerNodePool>, period: Duration) -> WorkerHandle {
    spawn_interval_worker("node_health_checker", period, move || {
        let store = store.clone();
        let pool = pool.clone();
        async move { run_cycle(&*store, &*pool).await }
    })
}

pub async fn run_cycle(store: &dyn Store, pool: &dyn DockerNodePool) {
    let nodes = match store
        .list(
            "node",
            ListQuery::new(Pagination::new(Some(1000), Some(0)))
                .filter(Filter::Eq("status", json!("online")))
                .order_by("id", false),
        )
        .await
    {
        Ok(page) => page.content,
        Err(err) => {
            tracing::error!(error = %err, "node health: failed to list online nodes");
            return;
        }
    };

    // Offline nodes are retried too — a node only leaves rotation
    // permanently by being deleted or put into maintenance.
    let offline = match store
        .list(
            "node",
            ListQuery::new(Pagination::new(Some(1000), Some(0)))
                .filter(Filter::Eq("status", json!("offline")))
                .order_by("id", false),
        )
        .await
    {
        Ok(page) => page.content,
        Err(err) => {
            tracing::error!(error = %err, "node health: failed to list offline nodes");
            Vec::new()
        }
    };

    let mut checked = 0u64;
    let mut failed = 0u64;
    for node in nodes.into_iter().chain(offline) {
        let Some(reference_id) = node.get("reference_id").and_then(Value::as_str) else {
            continue;
        };
        checked += 1;
        if let Err(err) = check_node(store, pool, reference_id).await {
            failed += 1;
            tracing::warn!(reference_id, error = %err, "node health: check failed for row, continuing");
        }
    }
    tracing::info!(checked, failed, "node health: cycle complete");
}

/// On-demand single-node check, also used by the cloud provisioner right
/// after it hands off a freshly provisioned node rather than waiting for
/// the next 60s cycle to confirm it.
pub async fn check_node(store: &dyn Store, pool: &dyn DockerNodePool, reference_id: &str) -> Result<(), DataError> {
    let node = store.get("node", reference_id).await?;
    if node.get("status").and_then(Value::as_str) == Some("maintenance") {
        return Ok(());
    }

    let mut patch = Row::new();
    patch.insert(
        "last_health_check".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    match pool.ping_node(reference_id).await {
        Ok(()) => {
            patch.insert("status".to_string(), Value::String("online".to_string()));
            patch.insert("error_message".to_string(), Value::Null);
        }
        Err(err) => {
            patch.insert("status".to_string(), Value::String("offline".to_string()));
            patch.insert("error_message".to_string(), Value::String(err.to_string()));
        }
    }
    store.update("node", reference_id, patch).await?;
    Ok(())
}
