//! Declarative resource schema for Hoster.
//!
//! A [`Resource`] enumerates fields, an optional state machine, custom
//! actions, visibility, and lifecycle hooks. The [`registry`] function
//! builds the concrete set of resources (template, deployment, node,
//! ssh_key, cloud_credential, cloud_provision, invoice, usage_event, user)
//! once at first access; everything downstream (store, REST surface,
//! reconcilers) derives its behavior from these declarations rather than
//! from hand-written per-resource glue.

pub mod field;
pub mod registry;
pub mod resource;

pub use field::{DefaultValue, FieldDef, FieldKind};
pub use registry::{registry as all_resources, resource};
pub use resource::{CustomAction, Guard, HttpMethod, Resource, Row, StateMachineDef, ValidationError, IMPLICIT_FIELDS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_all_nine_resources() {
        let names: Vec<&str> = all_resources().iter().map(|r| r.name).collect();
        for expected in [
            "template",
            "deployment",
            "node",
            "ssh_key",
            "cloud_credential",
            "cloud_provision",
            "invoice",
            "usage_event",
            "user",
        ] {
            assert!(names.contains(&expected), "missing resource {expected}");
        }
    }

    #[test]
    fn deployment_transition_table_matches_spec() {
        let deployment = resource("deployment").unwrap();
        assert!(deployment.can_transition("pending", "scheduled"));
        assert!(deployment.can_transition("starting", "running"));
        assert!(deployment.can_transition("starting", "failed"));
        assert!(!deployment.can_transition("running", "deleted"));
        assert!(!deployment.can_transition("pending", "running"));
    }

    #[test]
    fn deployment_starting_guard_requires_node() {
        let deployment = resource("deployment").unwrap();
        let sm = deployment.state_machine.as_ref().unwrap();
        let guard = sm.guard_for("starting").unwrap();
        let mut row = Row::new();
        assert!((guard.check)(&row).is_err());
        row.insert("node_id".into(), serde_json::json!(5));
        assert!((guard.check)(&row).is_ok());
    }

    #[test]
    fn cloud_provision_ready_guard_requires_instance_id() {
        let provision = resource("cloud_provision").unwrap();
        let sm = provision.state_machine.as_ref().unwrap();
        let guard = sm.guard_for("ready").unwrap();
        let mut row = Row::new();
        assert!((guard.check)(&row).is_err());
        row.insert(
            "provider_instance_id".into(),
            serde_json::json!("i-123456"),
        );
        assert!((guard.check)(&row).is_ok());
    }

    #[test]
    fn template_slug_is_computed_from_name() {
        let template = resource("template").unwrap();
        let mut row = Row::new();
        row.insert("name".into(), serde_json::json!("My Tmpl"));
        let slug = (template.compute.unwrap())("slug", &row).unwrap();
        assert_eq!(slug, serde_json::json!("my-tmpl"));
    }

    #[test]
    fn template_visibility_allows_published_to_anyone() {
        let template = resource("template").unwrap();
        let visibility = template.visibility.unwrap();
        let mut row = Row::new();
        row.insert("published".into(), serde_json::json!(true));
        row.insert("creator_id".into(), serde_json::json!(1));
        assert!(visibility(None, &row));
        assert!(visibility(Some(999), &row));
    }

    #[test]
    fn template_visibility_restricts_unpublished_to_creator() {
        let template = resource("template").unwrap();
        let visibility = template.visibility.unwrap();
        let mut row = Row::new();
        row.insert("published".into(), serde_json::json!(false));
        row.insert("creator_id".into(), serde_json::json!(1));
        assert!(!visibility(None, &row));
        assert!(!visibility(Some(2), &row));
        assert!(visibility(Some(1), &row));
    }

    #[test]
    fn generate_create_sql_is_idempotent_and_has_indices() {
        let deployment = resource("deployment").unwrap();
        let sql = deployment.generate_create_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS deployment"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_deployment_template_id"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_deployment_node_id"));
    }

    #[test]
    fn validate_rejects_missing_required_field() {
        let template = resource("template").unwrap();
        let mut row = Row::new();
        row.insert("slug".into(), serde_json::json!("x"));
        row.insert("version".into(), serde_json::json!("1.0.0"));
        row.insert("compose_spec".into(), serde_json::json!("services: {}"));
        let err = template.validate(&row).unwrap_err();
        assert!(err.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn validate_accepts_length_at_boundary() {
        let template = resource("template").unwrap();
        let mut row = Row::new();
        row.insert("name".into(), serde_json::json!("a".repeat(200)));
        row.insert("slug".into(), serde_json::json!("x"));
        row.insert("version".into(), serde_json::json!("1.0.0"));
        row.insert("compose_spec".into(), serde_json::json!("services: {}"));
        assert!(template.validate(&row).is_ok());

        row.insert("name".into(), serde_json::json!("a".repeat(201)));
        assert!(template.validate(&row).is_err());
    }
}
