use hoster_data::Page;
use hoster_schema::{Resource, Row};
use serde_json::{json, Map, Value};

/// Strip write-only and identity-duplicate fields out of a row before it
/// crosses back out as `attributes`. `id`/`reference_id` become the
/// envelope's own `id`, not an attribute. Internal fields (owner ids,
/// `created_at`/`updated_at`, ...) stay — "internal" only means the client
/// can't set them, not that they're hidden from reads.
fn resource_object(def: &Resource, row: &Row) -> Value {
    let id = row.get("reference_id").cloned().unwrap_or(Value::Null);
    let mut attributes = Map::new();
    for (key, value) in row.iter() {
        if key == "id" || key == "reference_id" {
            continue;
        }
        if def.is_write_only(key) {
            continue;
        }
        attributes.insert(key.clone(), value.clone());
    }
    json!({ "type": def.name, "id": id, "attributes": attributes })
}

/// A single-row document: `{"data": {...}}`.
pub fn single(def: &Resource, row: &Row) -> Value {
    json!({ "data": resource_object(def, row) })
}

/// A list document with pagination metadata.
pub fn list(def: &Resource, page: &Page<Row>) -> Value {
    let data: Vec<Value> = page.content.iter().map(|row| resource_object(def, row)).collect();
    json!({
        "data": data,
        "meta": {
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
        }
    })
}
