use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a timestamp accepting RFC 3339 first, falling back to the plain
/// `YYYY-MM-DD HH:MM:SS` form SQLite's `CURRENT_TIMESTAMP` produces.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// SQLite has no boolean column type; values round-trip as 0/1 integers.
/// This coerces whatever came back from the driver into a real bool.
pub fn coerce_bool(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        serde_json::Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        assert!(parse_timestamp("2026-01-02T03:04:05Z").is_some());
    }

    #[test]
    fn parses_sqlite_current_timestamp_form() {
        assert!(parse_timestamp("2026-01-02 03:04:05").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn coerces_sqlite_integer_bools() {
        assert!(coerce_bool(&serde_json::json!(1)));
        assert!(!coerce_bool(&serde_json::json!(0)));
        assert!(coerce_bool(&serde_json::json!(true)));
    }
}
