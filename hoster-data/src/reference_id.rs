/// Generate a reference id: `prefix || short unique suffix`, or a full UUID
/// when the prefix is empty.
///
/// The suffix is a UUIDv4 with hyphens stripped, truncated to 20 hex
/// characters — short enough to stay URL-friendly, long enough that
/// collision is not a practical concern for a single-process control plane.
pub fn new_reference_id(prefix: &str) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    if prefix.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        format!("{prefix}{}", &raw[..20])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_ids_carry_the_prefix() {
        let id = new_reference_id("tmpl_");
        assert!(id.starts_with("tmpl_"));
        assert_eq!(id.len(), "tmpl_".len() + 20);
    }

    #[test]
    fn empty_prefix_yields_full_uuid() {
        let id = new_reference_id("");
        assert_eq!(id.len(), 36);
        assert!(id.contains('-'));
    }

    #[test]
    fn ids_are_unique() {
        let a = new_reference_id("node_");
        let b = new_reference_id("node_");
        assert_ne!(a, b);
    }
}
