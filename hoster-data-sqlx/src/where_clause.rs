use hoster_data::Filter;
use serde_json::Value;

/// Turn a filter list into a `WHERE ...` fragment (empty string if there are
/// none) plus the positional parameters it binds, in order.
pub fn build_where(filters: &[Filter]) -> (String, Vec<Value>) {
    if filters.is_empty() {
        return (String::new(), Vec::new());
    }
    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::new();
    for filter in filters {
        match filter {
            Filter::Eq(column, value) => {
                clauses.push(format!("{column} = ?"));
                params.push(value.clone());
            }
            Filter::In(column, values) => {
                if values.is_empty() {
                    clauses.push("0".to_string());
                    continue;
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                clauses.push(format!("{column} IN ({placeholders})"));
                params.extend(values.iter().cloned());
            }
        }
    }
    (format!("WHERE {}", clauses.join(" AND ")), params)
}
