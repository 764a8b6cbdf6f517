use serde::{Deserialize, Serialize};

/// Quota limits carried on a plan. Deserialized from the `X-Plan-Limits`
/// header or a JWT's plan claim; missing/empty input is not an error, it
/// just means "use the conservative defaults".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    #[serde(default = "default_max_deployments")]
    pub max_deployments: i64,
    #[serde(default = "default_max_cpu_cores")]
    pub max_cpu_cores: i64,
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: i64,
    #[serde(default = "default_max_disk_mb")]
    pub max_disk_mb: i64,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_max_deployments() -> i64 {
    1
}
fn default_max_cpu_cores() -> i64 {
    1
}
fn default_max_memory_mb() -> i64 {
    1024
}
fn default_max_disk_mb() -> i64 {
    5120
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            max_deployments: default_max_deployments(),
            max_cpu_cores: default_max_cpu_cores(),
            max_memory_mb: default_max_memory_mb(),
            max_disk_mb: default_max_disk_mb(),
            capabilities: Vec::new(),
        }
    }
}

impl PlanLimits {
    /// Parse the raw header value. An empty string returns the defaults
    /// with no error; malformed JSON also returns the defaults, but along
    /// with an error message the caller may choose to log.
    pub fn parse(raw: &str) -> (Self, Option<String>) {
        if raw.trim().is_empty() {
            return (Self::default(), None);
        }
        match serde_json::from_str::<Self>(raw) {
            Ok(limits) => (limits, None),
            Err(err) => (Self::default(), Some(format!("invalid X-Plan-Limits: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults_with_no_error() {
        let (limits, err) = PlanLimits::parse("");
        assert_eq!(limits, PlanLimits::default());
        assert!(err.is_none());
    }

    #[test]
    fn malformed_json_yields_defaults_with_error() {
        let (limits, err) = PlanLimits::parse("{not json");
        assert_eq!(limits, PlanLimits::default());
        assert!(err.is_some());
    }

    #[test]
    fn defaults_round_trip_through_json() {
        let defaults = PlanLimits::default();
        let encoded = serde_json::to_string(&defaults).unwrap();
        let (reparsed, err) = PlanLimits::parse(&encoded);
        assert_eq!(reparsed, defaults);
        assert!(err.is_none());
    }

    #[test]
    fn partial_json_fills_remaining_fields_with_defaults() {
        let (limits, err) = PlanLimits::parse(r#"{"max_deployments":5}"#);
        assert!(err.is_none());
        assert_eq!(limits.max_deployments, 5);
        assert_eq!(limits.max_cpu_cores, 1);
    }
}
