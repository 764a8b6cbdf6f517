use hoster_data::DataError;
use hoster_schema::{FieldKind, Resource, Row};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as SqlxRow};

/// Decode a full table row into the dynamic [`Row`] shape, using the
/// resource's field kinds to pick the right SQLite decode path. Unlike
/// `raw_query`'s column introspection, this knows exactly what each column
/// holds and never has to guess.
pub fn decode_row(def: &Resource, row: &SqliteRow) -> Result<Row, DataError> {
    let mut out = Row::new();

    let id: i64 = row.try_get("id").map_err(DataError::storage)?;
    out.insert("id".to_string(), Value::from(id));
    let reference_id: String = row.try_get("reference_id").map_err(DataError::storage)?;
    out.insert("reference_id".to_string(), Value::String(reference_id));
    let created_at: String = row.try_get("created_at").map_err(DataError::storage)?;
    out.insert("created_at".to_string(), Value::String(created_at));
    let updated_at: String = row.try_get("updated_at").map_err(DataError::storage)?;
    out.insert("updated_at".to_string(), Value::String(updated_at));

    for field in def.fields {
        let value = match field.kind {
            FieldKind::Text | FieldKind::LongText | FieldKind::SoftRef | FieldKind::Timestamp => {
                row.try_get::<Option<String>, _>(field.name)
                    .map_err(DataError::storage)?
                    .map(Value::String)
                    .unwrap_or(Value::Null)
            }
            FieldKind::Integer | FieldKind::HardRef => row
                .try_get::<Option<i64>, _>(field.name)
                .map_err(DataError::storage)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            FieldKind::Float => row
                .try_get::<Option<f64>, _>(field.name)
                .map_err(DataError::storage)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            FieldKind::Boolean => row
                .try_get::<Option<i64>, _>(field.name)
                .map_err(DataError::storage)?
                .map(|v| Value::Bool(v != 0))
                .unwrap_or(Value::Null),
            FieldKind::Json => row
                .try_get::<Option<String>, _>(field.name)
                .map_err(DataError::storage)?
                .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::Null))
                .unwrap_or(Value::Null),
        };
        out.insert(field.name.to_string(), value);
    }

    Ok(out)
}

/// Decode a row with no known schema (used by the raw query escape hatch),
/// guessing each column's type in integer → float → string → null order.
pub fn decode_row_untyped(row: &SqliteRow) -> Row {
    let mut out = Row::new();
    for column in row.columns() {
        let name = column.name();
        let value = if let Ok(v) = row.try_get::<i64, _>(name) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<f64, _>(name) {
            Value::from(v)
        } else if let Ok(Some(v)) = row.try_get::<Option<String>, _>(name) {
            Value::String(v)
        } else {
            Value::Null
        };
        out.insert(name.to_string(), value);
    }
    out
}

/// Bind a dynamic list of JSON values onto a query in positional order.
pub fn bind_dynamic<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    values: &'q [Value],
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b as i64),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else {
                    query.bind(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(other.to_string()),
        };
    }
    query
}
