//! Cloud provisioner (spec period: 5s). Drives `cloud_provision` rows
//! through `pending -> creating -> configuring -> ready`, and retries
//! `destroying -> destroyed` independently of the on-enter command that
//! already tried it once.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hoster_data::{parse_timestamp, DataError, Filter, ListQuery, Pagination, Store};
use hoster_effects::{CloudProviderFactory, CredentialCipher, InstanceSpec};
use hoster_schema::Row;
use serde_json::{json, Value};
use tokio::net::TcpStream;

use crate::node_health;
use crate::support::{spawn_interval_worker, WorkerHandle};

const SSH_DIAL_TIMEOUT: Duration = Duration::from_secs(3);
const CONFIGURING_GRACE: chrono::Duration = chrono::Duration::minutes(5);

pub fn spawn(
    store: Arc<dyn Store>,
    factory: Arc<dyn CloudProviderFactory>,
    cipher: Arc<dyn CredentialCipher>,
    docker_pool: Arc<dyn hoster_effects::DockerNodePool>,
    period: Duration,
) -> WorkerHandle {
    spawn_interval_worker("cloud_provisioner", period, move || {
        let store = store.clone();
        let factory = factory.clone();
        let cipher = cipher.clone();
        let docker_pool = docker_pool.clone();
        async move { run_cycle(&*store, &*factory, &*cipher, &*docker_pool).await }
    })
}

pub async fn run_cycle(
    store: &dyn Store,
    factory: &dyn CloudProviderFactory,
    cipher: &dyn CredentialCipher,
    docker_pool: &dyn hoster_effects::DockerNodePool,
) {
    let work_states = ["pending", "creating", "configuring", "destroying"]
        .into_iter()
        .map(|s| json!(s))
        .collect();
    let page = match store
        .list_cloud_provisions_with_credential(
            ListQuery::new(Pagination::new(Some(1000), Some(0)))
                .filter(Filter::In("status", work_states))
                .order_by("cloud_provision.id", false),
        )
        .await
    {
        Ok(page) => page,
        Err(err) => {
            tracing::error!(error = %err, "cloud provisioner: failed to list work-state provisions");
            return;
        }
    };

    let mut processed = 0u64;
    let mut failed = 0u64;
    for row in page.content {
        let reference_id = row
            .get("reference_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = row.get("status").and_then(Value::as_str).unwrap_or_default();
        processed += 1;
        let result = match status {
            "pending" => handle_pending(store, factory, cipher, &reference_id, &row).await,
            "creating" => handle_creating(store, &reference_id).await,
            "configuring" => handle_configuring(store, docker_pool, &reference_id, &row).await,
            "destroying" => handle_destroying(store, factory, cipher, &reference_id, &row).await,
            other => {
                tracing::warn!(reference_id, status = other, "cloud provisioner: unexpected work-state row");
                Ok(())
            }
        };
        if let Err(err) = result {
            failed += 1;
            tracing::error!(reference_id, status, error = %err, "cloud provisioner: cycle step failed, will retry next tick");
        }
    }
    tracing::info!(processed, failed, "cloud provisioner: cycle complete");
}

async fn advance(store: &dyn Store, reference_id: &str, to_state: &str) -> Result<Row, DataError> {
    store.transition("cloud_provision", reference_id, to_state).await?;
    let mut patch = Row::new();
    patch.insert(
        "state_entered_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    store.update("cloud_provision", reference_id, patch).await
}

async fn fail(store: &dyn Store, reference_id: &str, message: &str) -> Result<(), DataError> {
    let mut patch = Row::new();
    patch.insert("error_message".to_string(), Value::String(message.to_string()));
    store.update("cloud_provision", reference_id, patch).await?;
    store.transition("cloud_provision", reference_id, "failed").await?;
    Ok(())
}

async fn handle_pending(
    store: &dyn Store,
    factory: &dyn CloudProviderFactory,
    cipher: &dyn CredentialCipher,
    reference_id: &str,
    row: &Row,
) -> Result<(), DataError> {
    let provider = row.get("provider").and_then(Value::as_str).unwrap_or_default();
    let encrypted = row
        .get("credential_credentials_encrypted")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let ssh_key_id = row.get("ssh_key_id").and_then(Value::as_i64);

    let outcome = async {
        let decrypted = cipher
            .decrypt(encrypted)
            .map_err(|e| e.to_string())?;
        let ssh_key_id = ssh_key_id.ok_or_else(|| "provision has no ssh_key_id".to_string())?;
        let ssh_key = store
            .get_by_id("ssh_key", ssh_key_id)
            .await
            .map_err(|e| e.to_string())?;
        let spec = InstanceSpec {
            instance_name: row.get("instance_name").and_then(Value::as_str).unwrap_or_default().to_string(),
            region: row.get("region").and_then(Value::as_str).unwrap_or_default().to_string(),
            size: row.get("size").and_then(Value::as_str).unwrap_or_default().to_string(),
            ssh_public_key: ssh_key.get("public_key").and_then(Value::as_str).unwrap_or_default().to_string(),
        };
        let provider = factory.new_provider(provider, &decrypted).map_err(|e| e.to_string())?;
        provider.create_instance(&spec).await.map_err(|e| e.to_string())
    }
    .await;

    match outcome {
        Ok(handle) => {
            let mut patch = Row::new();
            patch.insert("provider_instance_id".to_string(), Value::String(handle.provider_instance_id));
            patch.insert("public_ip".to_string(), Value::String(handle.public_ip));
            store.update("cloud_provision", reference_id, patch).await?;
            advance(store, reference_id, "creating").await?;
            Ok(())
        }
        Err(message) => fail(store, reference_id, &message).await,
    }
}

async fn handle_creating(store: &dyn Store, reference_id: &str) -> Result<(), DataError> {
    advance(store, reference_id, "configuring").await?;
    Ok(())
}

async fn handle_configuring(
    store: &dyn Store,
    docker_pool: &dyn hoster_effects::DockerNodePool,
    reference_id: &str,
    row: &Row,
) -> Result<(), DataError> {
    let public_ip = row.get("public_ip").and_then(Value::as_str).unwrap_or_default();
    let reachable = match format!("{public_ip}:22").parse::<SocketAddr>() {
        Ok(addr) => tokio::time::timeout(SSH_DIAL_TIMEOUT, TcpStream::connect(addr))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false),
        Err(_) => false,
    };

    if !reachable {
        let entered_at = row
            .get("state_entered_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let stale = entered_at
            .map(|t| Utc::now().signed_duration_since(t) >= CONFIGURING_GRACE)
            .unwrap_or(true);
        if stale {
            return fail(store, reference_id, "ssh port unreachable after 5 minutes").await;
        }
        return Ok(());
    }

    let creator_id = row.get("creator_id").and_then(Value::as_i64);
    let mut node_payload = Row::new();
    node_payload.insert("creator_id".to_string(), json!(creator_id));
    node_payload.insert(
        "name".to_string(),
        Value::String(row.get("instance_name").and_then(Value::as_str).unwrap_or_default().to_string()),
    );
    node_payload.insert("host".to_string(), Value::String(public_ip.to_string()));
    node_payload.insert(
        "kind".to_string(),
        Value::String(row.get("provider").and_then(Value::as_str).unwrap_or_default().to_string()),
    );
    node_payload.insert("status".to_string(), Value::String("online".to_string()));
    node_payload.insert("ssh_key_id".to_string(), row.get("ssh_key_id").cloned().unwrap_or(Value::Null));

    let node = store.create("node", node_payload).await?;
    let node_id = node.get("id").and_then(Value::as_i64).unwrap_or_default();
    let node_reference_id = node.get("reference_id").and_then(Value::as_str).unwrap_or_default().to_string();

    if let Err(err) = node_health::check_node(store, docker_pool, &node_reference_id).await {
        tracing::warn!(node_reference_id, error = %err, "cloud provisioner: on-demand node check failed after provisioning");
    }

    let mut patch = Row::new();
    patch.insert("node_id".to_string(), json!(node_id));
    store.update("cloud_provision", reference_id, patch).await?;
    advance(store, reference_id, "ready").await?;
    Ok(())
}

async fn handle_destroying(
    store: &dyn Store,
    factory: &dyn CloudProviderFactory,
    cipher: &dyn CredentialCipher,
    reference_id: &str,
    row: &Row,
) -> Result<(), DataError> {
    let provider = row.get("provider").and_then(Value::as_str).unwrap_or_default();
    let encrypted = row
        .get("credential_credentials_encrypted")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let provider_instance_id = row.get("provider_instance_id").and_then(Value::as_str);

    if let Some(provider_instance_id) = provider_instance_id {
        match cipher.decrypt(encrypted) {
            Ok(decrypted) => match factory.new_provider(provider, &decrypted) {
                Ok(client) => {
                    if let Err(err) = client.destroy_instance(provider_instance_id).await {
                        tracing::warn!(reference_id, error = %err, "cloud provisioner: destroy failed, treating as already gone");
                    }
                }
                Err(err) => tracing::warn!(reference_id, error = %err, "cloud provisioner: could not construct provider for destroy retry"),
            },
            Err(err) => tracing::warn!(reference_id, error = %err, "cloud provisioner: could not decrypt credential for destroy retry"),
        }
    }

    // Already-destroyed rows (the on-enter handler got there first) simply
    // fail this no-op transition; that's expected and not logged as an error.
    let _ = store.transition("cloud_provision", reference_id, "destroyed").await;
    Ok(())
}
