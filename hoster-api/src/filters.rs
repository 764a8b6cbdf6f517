use crate::error::ApiError;
use hoster_data::Filter;
use hoster_schema::Resource;
use serde_json::Value;
use std::collections::HashMap;

/// Parses `filter[field]=value` query params into equality filters against
/// known, non-internal fields of `def`. An unknown field name is a client
/// error, not a silently-ignored no-op — callers should learn their filter
/// was never applied.
pub fn parse(def: &Resource, params: &HashMap<String, String>) -> Result<Vec<Filter>, ApiError> {
    let mut filters = Vec::new();
    for (key, value) in params {
        let Some(field_name) = key.strip_prefix("filter[").and_then(|rest| rest.strip_suffix(']')) else {
            continue;
        };
        let field = def
            .field(field_name)
            .filter(|field| !def.is_internal(field.name))
            .ok_or_else(|| ApiError::BadRequest(format!("unknown filter field '{field_name}'")))?;
        filters.push(Filter::Eq(field.name, coerce(value)));
    }
    Ok(filters)
}

fn coerce(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        Value::from(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        Value::from(b)
    } else {
        Value::from(raw)
    }
}
