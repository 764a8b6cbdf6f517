//! The five canonical on-enter command handlers. Each is registered under
//! its schema-declared command name in [`crate::default_bus`] and is
//! invoked with the row as it stands the instant it entered the state that
//! names it — none of these read the state column themselves.

use std::collections::HashSet;
use std::sync::Arc;

use hoster_data::{Filter, ListQuery, Pagination};
use hoster_effects::{BillingRecorder, CloudProviderFactory, ComposeSpec, CredentialCipher, DockerNodePool};
use hoster_schema::Row;
use serde_json::{json, Value};

use crate::bus::{CommandContext, CommandError};
use crate::support::{fail_or_annotate, transition_and_dispatch};

const PROXY_PORT_RANGE: std::ops::Range<i64> = 30_000..40_000;

/// `pending -> scheduled`: pick a proxy port, synthesize a domain if none
/// is set, then push on into `starting`.
pub async fn schedule_deployment(
    ctx: CommandContext,
    resource: &'static str,
    reference_id: String,
    row: Row,
) -> Result<(), CommandError> {
    let Some(node_id) = row.get("node_id").and_then(Value::as_i64) else {
        fail_or_annotate(&ctx, resource, &reference_id, "no node selected for deployment").await;
        return Ok(());
    };

    let node = ctx.store.get_by_id("node", node_id).await?;
    if node.get("status").and_then(Value::as_str) != Some("online") {
        fail_or_annotate(&ctx, resource, &reference_id, "target node is not online").await;
        return Ok(());
    }

    let siblings = ctx
        .store
        .list(
            "deployment",
            ListQuery::new(Pagination::new(Some(1000), Some(0)))
                .filter(Filter::Eq("node_id", json!(node_id))),
        )
        .await?;
    let used_ports: HashSet<i64> = siblings
        .content
        .iter()
        .filter(|d| {
            d.get("reference_id").and_then(Value::as_str) != Some(reference_id.as_str())
                && d.get("status").and_then(Value::as_str) != Some("stopped")
        })
        .filter_map(|d| d.get("proxy_port").and_then(Value::as_i64))
        .collect();

    let Some(port) = PROXY_PORT_RANGE.into_iter().find(|p| !used_ports.contains(p)) else {
        fail_or_annotate(&ctx, resource, &reference_id, "no free proxy port on target node").await;
        return Ok(());
    };

    let mut patch = Row::new();
    patch.insert("proxy_port".to_string(), json!(port));
    let has_domains = row
        .get("domains")
        .map(|v| matches!(v, Value::Array(items) if !items.is_empty()))
        .unwrap_or(false);
    if !has_domains {
        if let Some(base_domain) = ctx.extras.get::<String>("base_domain") {
            patch.insert(
                "domains".to_string(),
                json!([format!("{reference_id}.{base_domain}")]),
            );
        }
    }
    ctx.store.update(resource, &reference_id, patch).await?;

    transition_and_dispatch(&ctx, resource, &reference_id, "starting").await?;
    Ok(())
}

/// `scheduled -> starting`: load the template's compose spec, obtain a
/// Docker client for the target node, start the containers, persist the
/// resulting container list, then push on into `running`.
pub async fn start_deployment(
    ctx: CommandContext,
    resource: &'static str,
    reference_id: String,
    row: Row,
) -> Result<(), CommandError> {
    let (Some(template_id), Some(node_id)) = (
        row.get("template_id").and_then(Value::as_i64),
        row.get("node_id").and_then(Value::as_i64),
    ) else {
        fail_or_annotate(&ctx, resource, &reference_id, "missing template or node reference").await;
        return Ok(());
    };

    let template = ctx.store.get_by_id("template", template_id).await?;
    let node = ctx.store.get_by_id("node", node_id).await?;
    let node_ref = node
        .get("reference_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let Some(pool) = ctx.extras.get::<Arc<dyn DockerNodePool>>("docker_pool") else {
        return Err(CommandError("docker node pool not configured".to_string()));
    };
    let client = match pool.get_client(&node_ref).await {
        Ok(client) => client,
        Err(err) => {
            fail_or_annotate(&ctx, resource, &reference_id, &err.to_string()).await;
            return Ok(());
        }
    };

    let compose = ComposeSpec {
        raw_yaml: template
            .get("compose_spec")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        config_files: Vec::new(),
    };

    let containers = match client.start_deployment(&reference_id, &compose).await {
        Ok(containers) => containers,
        Err(err) => {
            fail_or_annotate(&ctx, resource, &reference_id, &err.to_string()).await;
            return Ok(());
        }
    };

    let mut patch = Row::new();
    patch.insert(
        "container_ids".to_string(),
        serde_json::to_value(&containers).unwrap_or(Value::Null),
    );
    ctx.store.update(resource, &reference_id, patch).await?;

    transition_and_dispatch(&ctx, resource, &reference_id, "running").await?;
    record_usage(&ctx, &row, "deployment_started", &reference_id).await;
    Ok(())
}

/// `running -> stopping`: stop the containers (a node that can't be
/// reached is not fatal — the deployment still moves to `stopped`), then
/// record the billing event.
pub async fn stop_deployment(
    ctx: CommandContext,
    resource: &'static str,
    reference_id: String,
    row: Row,
) -> Result<(), CommandError> {
    if let Some(node_id) = row.get("node_id").and_then(Value::as_i64) {
        if let Ok(node) = ctx.store.get_by_id("node", node_id).await {
            let node_ref = node
                .get("reference_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(pool) = ctx.extras.get::<Arc<dyn DockerNodePool>>("docker_pool") {
                match pool.get_client(&node_ref).await {
                    Ok(client) => {
                        if let Err(err) = client.stop_deployment(&reference_id).await {
                            tracing::warn!(reference_id, error = %err, "container stop failed, continuing to stopped");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(reference_id, error = %err, "node unreachable while stopping deployment, continuing to stopped");
                    }
                }
            }
        }
    }

    transition_and_dispatch(&ctx, resource, &reference_id, "stopped").await?;
    record_usage(&ctx, &row, "deployment_stopped", &reference_id).await;
    Ok(())
}

/// Best-effort container removal, then move on to `deleted` regardless of
/// whether the remove call succeeded.
pub async fn delete_deployment(
    ctx: CommandContext,
    resource: &'static str,
    reference_id: String,
    row: Row,
) -> Result<(), CommandError> {
    if let Some(node_id) = row.get("node_id").and_then(Value::as_i64) {
        if let Ok(node) = ctx.store.get_by_id("node", node_id).await {
            let node_ref = node
                .get("reference_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(pool) = ctx.extras.get::<Arc<dyn DockerNodePool>>("docker_pool") {
                if let Ok(client) = pool.get_client(&node_ref).await {
                    if let Err(err) = client.remove_deployment(&reference_id).await {
                        tracing::warn!(reference_id, error = %err, "container removal failed, deleting anyway");
                    }
                }
            }
        }
    }

    transition_and_dispatch(&ctx, resource, &reference_id, "deleted").await?;
    Ok(())
}

/// Decrypt the owning credential, ask the cloud provider to tear down the
/// instance (a failure here is treated as "already gone", not fatal),
/// move the provision to `destroyed`, then delete its associated node row.
pub async fn destroy_cloud_provision(
    ctx: CommandContext,
    resource: &'static str,
    reference_id: String,
    row: Row,
) -> Result<(), CommandError> {
    let provider = row
        .get("provider")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let (Some(credential_id), Some(provider_instance_id)) = (
        row.get("credential_id").and_then(Value::as_i64),
        row.get("provider_instance_id").and_then(Value::as_str),
    ) {
        if let Ok(credential) = ctx.store.get_by_id("cloud_credential", credential_id).await {
            let encrypted = credential
                .get("credentials_encrypted")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let cipher = ctx.extras.get::<Arc<dyn CredentialCipher>>("credential_cipher");
            let factory = ctx.extras.get::<Arc<dyn CloudProviderFactory>>("cloud_provider_factory");
            if let (Some(cipher), Some(factory)) = (cipher, factory) {
                match cipher.decrypt(encrypted) {
                    Ok(decrypted) => match factory.new_provider(&provider, &decrypted) {
                        Ok(provider) => {
                            if let Err(err) = provider.destroy_instance(provider_instance_id).await {
                                tracing::warn!(reference_id, error = %err, "cloud instance destroy failed, treating as already gone");
                            }
                        }
                        Err(err) => {
                            tracing::warn!(reference_id, error = %err, "could not construct cloud provider for destroy");
                        }
                    },
                    Err(err) => {
                        tracing::warn!(reference_id, error = %err, "could not decrypt credential for destroy");
                    }
                }
            }
        }
    }

    let outcome_row = transition_and_dispatch(&ctx, resource, &reference_id, "destroyed").await?;

    if let Some(node_id) = outcome_row.get("node_id").and_then(Value::as_i64) {
        if let Ok(node) = ctx.store.get_by_id("node", node_id).await {
            if let Some(node_ref) = node.get("reference_id").and_then(Value::as_str) {
                if let Err(err) = ctx.store.delete("node", node_ref).await {
                    tracing::warn!(reference_id, node_ref, error = %err, "failed to delete node row after provision destroy");
                }
            }
        }
    }
    Ok(())
}

async fn record_usage(ctx: &CommandContext, deployment: &Row, event_type: &str, reference_id: &str) {
    let Some(billing) = ctx.extras.get::<Arc<dyn BillingRecorder>>("billing_recorder") else {
        return;
    };
    let Some(owner_id) = deployment.get("customer_id").and_then(Value::as_i64) else {
        return;
    };
    if let Err(err) = billing
        .record_event(owner_id, event_type, reference_id, "deployment", json!({}))
        .await
    {
        tracing::warn!(reference_id, event_type, error = %err, "failed to record billing event");
    }
}
