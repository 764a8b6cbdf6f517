use async_trait::async_trait;
use chrono::Utc;
use hoster_data::{new_reference_id, DataError, ListQuery, Page, Store, TransitionOutcome};
use hoster_schema::{Resource, Row};
use serde_json::Value;
use sqlx::{Row as SqlxRow, SqlitePool};

use crate::codec::{bind_dynamic, decode_row, decode_row_untyped};
use crate::error::SqlxErrorExt;
use crate::where_clause::build_where;

/// SQLite-backed [`Store`]. One implementation drives every resource —
/// the schema registry supplies the table shape, transition table, and
/// hooks; this type only ever issues generically-built SQL against them.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn resource_def(&self, resource: &'static str) -> Result<&'static Resource, DataError> {
        hoster_schema::resource(resource)
            .ok_or_else(|| DataError::storage(format!("unknown resource: {resource}")))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create(&self, resource: &'static str, mut payload: Row) -> Result<Row, DataError> {
        let def = self.resource_def(resource)?;

        if let Some(before_create) = def.before_create {
            before_create(&mut payload).map_err(|message| DataError::GuardFailed {
                resource: def.name,
                message,
            })?;
        }

        if let Some(compute) = def.compute {
            for field in def.fields.iter().filter(|f| f.is_computed()) {
                let already_present = payload
                    .get(field.name)
                    .map(|v| !v.is_null())
                    .unwrap_or(false);
                if !already_present {
                    if let Some(value) = compute(field.name, &payload) {
                        payload.insert(field.name.to_string(), value);
                    }
                }
            }
        }

        for field in def.fields {
            if !payload.contains_key(field.name) {
                if let Some(default) = &field.default {
                    payload.insert(field.name.to_string(), default.to_json());
                }
            }
        }

        if let Some(sm) = &def.state_machine {
            payload
                .entry(sm.field.to_string())
                .or_insert_with(|| Value::String(sm.initial.to_string()));
        }

        def.validate(&payload).map_err(DataError::Validation)?;

        let reference_id = new_reference_id(def.ref_prefix);
        let now = Utc::now().to_rfc3339();

        let mut columns = vec![
            "reference_id".to_string(),
            "created_at".to_string(),
            "updated_at".to_string(),
        ];
        let mut values = vec![
            Value::String(reference_id.clone()),
            Value::String(now.clone()),
            Value::String(now),
        ];
        for field in def.fields {
            columns.push(field.name.to_string());
            values.push(payload.get(field.name).cloned().unwrap_or(Value::Null));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            def.name,
            columns.join(", "),
            placeholders
        );
        bind_dynamic(sqlx::query(&sql), &values)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        self.get(resource, &reference_id).await
    }

    async fn get(&self, resource: &'static str, reference_id: &str) -> Result<Row, DataError> {
        let def = self.resource_def(resource)?;
        let sql = format!("SELECT * FROM {} WHERE reference_id = ?", def.name);
        let row = sqlx::query(&sql)
            .bind(reference_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?
            .ok_or_else(|| DataError::NotFound {
                resource: def.name,
                id: reference_id.to_string(),
            })?;
        decode_row(def, &row)
    }

    async fn get_by_id(&self, resource: &'static str, id: i64) -> Result<Row, DataError> {
        let def = self.resource_def(resource)?;
        let sql = format!("SELECT * FROM {} WHERE id = ?", def.name);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?
            .ok_or_else(|| DataError::NotFound {
                resource: def.name,
                id: id.to_string(),
            })?;
        decode_row(def, &row)
    }

    async fn get_by_field(
        &self,
        resource: &'static str,
        field: &'static str,
        value: &Value,
    ) -> Result<Option<Row>, DataError> {
        let def = self.resource_def(resource)?;
        let sql = format!("SELECT * FROM {} WHERE {} = ?", def.name, field);
        let bound = [value.clone()];
        let row = bind_dynamic(sqlx::query(&sql), &bound)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        row.map(|r| decode_row(def, &r)).transpose()
    }

    async fn list(&self, resource: &'static str, query: ListQuery) -> Result<Page<Row>, DataError> {
        let def = self.resource_def(resource)?;
        let (where_clause, params) = build_where(&query.filters);

        let count_sql = format!("SELECT COUNT(*) AS total FROM {} {}", def.name, where_clause);
        let count_row = bind_dynamic(sqlx::query(&count_sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        let total: i64 = count_row.try_get("total").map_err(DataError::storage)?;

        let order_col = query.order_by.unwrap_or("id");
        let direction = if query.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY {} {} LIMIT ? OFFSET ?",
            def.name, where_clause, order_col, direction
        );
        let mut all_params = params;
        all_params.push(Value::from(query.pagination.limit));
        all_params.push(Value::from(query.pagination.offset));

        let rows = bind_dynamic(sqlx::query(&sql), &all_params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        let content = rows
            .iter()
            .map(|r| decode_row(def, r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, total.max(0) as u64, query.pagination))
    }

    async fn update(
        &self,
        resource: &'static str,
        reference_id: &str,
        patch: Row,
    ) -> Result<Row, DataError> {
        let def = self.resource_def(resource)?;
        let mut merged = self.get(resource, reference_id).await?;
        for (key, value) in patch.iter() {
            merged.insert(key.clone(), value.clone());
        }
        def.validate(&merged).map_err(DataError::Validation)?;

        if patch.is_empty() {
            return Ok(merged);
        }

        let now = Utc::now().to_rfc3339();
        let mut sets = vec!["updated_at = ?".to_string()];
        let mut values = vec![Value::String(now)];
        for (key, value) in patch.iter() {
            if def.field(key).is_some() {
                sets.push(format!("{key} = ?"));
                values.push(value.clone());
            }
        }
        values.push(Value::String(reference_id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE reference_id = ?",
            def.name,
            sets.join(", ")
        );
        bind_dynamic(sqlx::query(&sql), &values)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        self.get(resource, reference_id).await
    }

    async fn delete(&self, resource: &'static str, reference_id: &str) -> Result<(), DataError> {
        let def = self.resource_def(resource)?;
        if let Some(before_delete) = def.before_delete {
            let row = self.get(resource, reference_id).await?;
            before_delete(&row).map_err(|message| DataError::GuardFailed {
                resource: def.name,
                message,
            })?;
        }
        let sql = format!("DELETE FROM {} WHERE reference_id = ?", def.name);
        let result = sqlx::query(&sql)
            .bind(reference_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        if result.rows_affected() == 0 {
            return Err(DataError::NotFound {
                resource: def.name,
                id: reference_id.to_string(),
            });
        }
        Ok(())
    }

    async fn transition(
        &self,
        resource: &'static str,
        reference_id: &str,
        to_state: &str,
    ) -> Result<TransitionOutcome, DataError> {
        let def = self.resource_def(resource)?;
        let sm_field = def
            .state_field()
            .ok_or_else(|| DataError::storage(format!("{resource} has no state machine")))?;

        let current = self.get(resource, reference_id).await?;
        let plan = hoster_statemachine::plan_transition(def, &current, to_state).map_err(|e| {
            use hoster_statemachine::TransitionError;
            match e {
                TransitionError::NoStateMachine => {
                    DataError::storage(format!("{resource} has no state machine"))
                }
                TransitionError::InvalidTransition { from, to } => DataError::InvalidTransition {
                    resource: def.name,
                    from,
                    to,
                },
                TransitionError::GuardFailed(message) => DataError::GuardFailed {
                    resource: def.name,
                    message,
                },
            }
        })?;

        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE {} SET {} = ?, updated_at = ? WHERE reference_id = ? AND {} = ?",
            def.name, sm_field, sm_field
        );
        let result = sqlx::query(&sql)
            .bind(to_state)
            .bind(&now)
            .bind(reference_id)
            .bind(&plan.from)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        if result.rows_affected() == 0 {
            return Err(DataError::InvalidTransition {
                resource: def.name,
                from: plan.from,
                to: to_state.to_string(),
            });
        }

        let row = self.get(resource, reference_id).await?;
        Ok(TransitionOutcome {
            row,
            command: plan.command,
        })
    }

    async fn raw_query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, DataError> {
        let rows = bind_dynamic(sqlx::query(sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(rows.iter().map(decode_row_untyped).collect())
    }

    async fn raw_exec(&self, sql: &str, params: Vec<Value>) -> Result<u64, DataError> {
        let result = bind_dynamic(sqlx::query(sql), &params)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(result.rows_affected())
    }

    async fn list_cloud_provisions_with_credential(
        &self,
        query: ListQuery,
    ) -> Result<Page<Row>, DataError> {
        let def = self.resource_def("cloud_provision")?;
        let (where_clause, params) = build_where(&query.filters);

        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM cloud_provision \
             JOIN cloud_credential ON cloud_provision.credential_id = cloud_credential.id {where_clause}"
        );
        let count_row = bind_dynamic(sqlx::query(&count_sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;
        let total: i64 = count_row.try_get("total").map_err(DataError::storage)?;

        let direction = if query.descending { "DESC" } else { "ASC" };
        let order_col = query.order_by.unwrap_or("cloud_provision.id");
        let sql = format!(
            "SELECT cloud_provision.*, \
                    cloud_credential.provider AS credential_provider, \
                    cloud_credential.credentials_encrypted AS credential_credentials_encrypted \
             FROM cloud_provision \
             JOIN cloud_credential ON cloud_provision.credential_id = cloud_credential.id \
             {where_clause} \
             ORDER BY {order_col} {direction} LIMIT ? OFFSET ?"
        );
        let mut all_params = params;
        all_params.push(Value::from(query.pagination.limit));
        all_params.push(Value::from(query.pagination.offset));

        let rows = bind_dynamic(sqlx::query(&sql), &all_params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_data_error())?;

        let content = rows
            .iter()
            .map(|r| {
                let mut row = decode_row(def, r)?;
                let provider: Option<String> = r.try_get("credential_provider").ok();
                row.insert(
                    "credential_provider".to_string(),
                    provider.map(Value::String).unwrap_or(Value::Null),
                );
                let credentials: Option<String> = r.try_get("credential_credentials_encrypted").ok();
                row.insert(
                    "credential_credentials_encrypted".to_string(),
                    credentials.map(Value::String).unwrap_or(Value::Null),
                );
                Ok::<_, DataError>(row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, total.max(0) as u64, query.pagination))
    }
}
