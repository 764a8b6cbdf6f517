//! Invoice generator (spec period: 24h). Builds or refreshes the current
//! month's draft invoice per user from their running deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, TimeZone, Utc};
use hoster_data::{DataError, Filter, ListQuery, Pagination, Store};
use hoster_schema::Row;
use serde_json::{json, Value};

use crate::support::{spawn_interval_worker, WorkerHandle};

pub fn spawn(store: Arc<dyn Store>, period: Duration) -> WorkerHandle {
    spawn_interval_worker("invoice_generator", period, move || {
        let store = store.clone();
        async move { run_cycle(&*store).await }
    })
}

pub async fn run_cycle(store: &dyn Store) {
    let now = Utc::now();
    let period_start = Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).unwrap();
    let period_end = next_month_start(period_start) - chrono::Duration::seconds(1);
    let month_prefix = period_start.format("%Y-%m").to_string();

    let running = match store
        .list(
            "deployment",
            ListQuery::new(Pagination::new(Some(1000), Some(0)))
                .filter(Filter::Eq("status", json!("running")))
                .order_by("id", false),
        )
        .await
    {
        Ok(page) => page.content,
        Err(err) => {
            tracing::error!(error = %err, "invoice generator: failed to list running deployments");
            return;
        }
    };

    let mut by_owner: HashMap<i64, Vec<Value>> = HashMap::new();
    for deployment in &running {
        let Some(owner_id) = deployment.get("customer_id").and_then(Value::as_i64) else {
            continue;
        };
        let Some(template_id) = deployment.get("template_id").and_then(Value::as_i64) else {
            continue;
        };
        let template = match store.get_by_id("template", template_id).await {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(owner_id, template_id, error = %err, "invoice generator: could not load template for line item");
                continue;
            }
        };
        let line = json!({
            "deployment_reference_id": deployment.get("reference_id").cloned().unwrap_or(Value::Null),
            "template_name": template.get("name").cloned().unwrap_or(Value::Null),
            "price_monthly_cents": template.get("price_monthly_cents").cloned().unwrap_or(json!(0)),
        });
        by_owner.entry(owner_id).or_default().push(line);
    }

    let mut processed = 0u64;
    let mut failed = 0u64;
    for (owner_id, line_items) in by_owner {
        processed += 1;
        let total_cents: i64 = line_items
            .iter()
            .filter_map(|line| line.get("price_monthly_cents").and_then(Value::as_i64))
            .sum();

        match find_draft_invoice_for_month(store, owner_id, &month_prefix).await {
            Ok(Some(invoice)) => {
                let status = invoice.get("status").and_then(Value::as_str).unwrap_or("draft");
                if status == "paid" || status == "pending" {
                    continue;
                }
                let reference_id = invoice.get("reference_id").and_then(Value::as_str).unwrap_or_default().to_string();
                let mut patch = Row::new();
                patch.insert("line_items".to_string(), json!(line_items));
                patch.insert("total_cents".to_string(), json!(total_cents));
                if let Err(err) = store.update("invoice", &reference_id, patch).await {
                    failed += 1;
                    tracing::error!(owner_id, error = %err, "invoice generator: failed to update draft invoice");
                }
            }
            Ok(None) => {
                let mut payload = Row::new();
                payload.insert("user_id".to_string(), json!(owner_id));
                payload.insert("period_start".to_string(), json!(period_start.to_rfc3339()));
                payload.insert("period_end".to_string(), json!(period_end.to_rfc3339()));
                payload.insert("line_items".to_string(), json!(line_items));
                payload.insert("total_cents".to_string(), json!(total_cents));
                if let Err(err) = store.create("invoice", payload).await {
                    failed += 1;
                    tracing::error!(owner_id, error = %err, "invoice generator: failed to create draft invoice");
                }
            }
            Err(err) => {
                failed += 1;
                tracing::error!(owner_id, error = %err, "invoice generator: failed to look up existing draft invoice");
            }
        }
    }
    tracing::info!(processed, failed, "invoice generator: cycle complete");
}

async fn find_draft_invoice_for_month(
    store: &dyn Store,
    owner_id: i64,
    month_prefix: &str,
) -> Result<Option<Row>, DataError> {
    let page = store
        .list(
            "invoice",
            ListQuery::new(Pagination::new(Some(1000), Some(0))).filter(Filter::Eq("user_id", json!(owner_id))),
        )
        .await?;
    Ok(page.content.into_iter().find(|invoice| {
        invoice
            .get("period_start")
            .and_then(Value::as_str)
            .map(|s| s.starts_with(month_prefix))
            .unwrap_or(false)
    }))
}

fn next_month_start(period_start: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    if period_start.month() == 12 {
        Utc.with_ymd_and_hms(period_start.year() + 1, 1, 1, 0, 0, 0).unwrap()
    } else {
        Utc.with_ymd_and_hms(period_start.year(), period_start.month() + 1, 1, 0, 0, 0).unwrap()
    }
}
