use hoster_data::{DataError, Store};
use hoster_schema::Row;
use serde_json::Value;

use crate::bus::CommandContext;

/// Transition a resource, then — if the destination state declares an
/// on-enter command — dispatch it through the same bus before returning.
/// This is how `pending -> scheduled -> starting` runs as one logical
/// operation even though each leg is its own atomic compare-and-swap:
/// `schedule_deployment` calls this to push on into `starting`, which
/// chain-dispatches `start_deployment` in turn. Chained dispatch failures
/// are logged, not propagated — the transition itself already committed.
pub async fn transition_and_dispatch(
    ctx: &CommandContext,
    resource: &'static str,
    reference_id: &str,
    to_state: &str,
) -> Result<Row, DataError> {
    let outcome = ctx.store.transition(resource, reference_id, to_state).await?;
    if let Some(command) = outcome.command {
        let row = outcome.row.clone();
        if let Err(err) = ctx
            .bus
            .dispatch(ctx.clone(), command, resource, reference_id.to_string(), row)
            .await
        {
            tracing::error!(resource, reference_id, command, error = %err, "chained command handler failed");
        }
    }
    Ok(outcome.row)
}

/// Annotate `error_message` on the row, then attempt to move it to
/// `failed`. If the current state has no `failed` transition declared
/// (e.g. a deployment still sitting in `scheduled`), the annotation stands
/// on its own and the row is left for the next retry or manual
/// intervention — handlers never force a transition the schema doesn't
/// allow.
pub async fn fail_or_annotate(
    ctx: &CommandContext,
    resource: &'static str,
    reference_id: &str,
    message: &str,
) {
    let mut patch = Row::new();
    patch.insert("error_message".to_string(), Value::String(message.to_string()));
    if let Err(err) = ctx.store.update(resource, reference_id, patch).await {
        tracing::error!(resource, reference_id, error = %err, "failed to annotate error_message");
        return;
    }
    match ctx.store.transition(resource, reference_id, "failed").await {
        Ok(_) => {}
        Err(DataError::InvalidTransition { .. }) => {
            tracing::warn!(
                resource,
                reference_id,
                message,
                "cannot transition to failed from current state, left annotated"
            );
        }
        Err(err) => tracing::error!(resource, reference_id, error = %err, "failed to transition to failed"),
    }
}
