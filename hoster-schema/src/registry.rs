use std::sync::OnceLock;

use serde_json::Value;

use crate::field::FieldDef;
use crate::resource::{CustomAction, Guard, HttpMethod, Resource, Row, StateMachineDef};

fn leak<T>(v: Vec<T>) -> &'static [T] {
    Box::leak(v.into_boxed_slice())
}

fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn template_compute(field: &'static str, row: &Row) -> Option<Value> {
    match field {
        "slug" => row
            .get("name")
            .and_then(|v| v.as_str())
            .map(|name| Value::String(slugify(name))),
        _ => None,
    }
}

fn template_visibility(caller_id: Option<i64>, row: &Row) -> bool {
    if row
        .get("published")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return true;
    }
    match (caller_id, row.get("creator_id").and_then(|v| v.as_i64())) {
        (Some(caller), Some(creator)) => caller == creator,
        _ => false,
    }
}

fn deployment_starting_guard(row: &Row) -> Result<(), String> {
    match row.get("node_id") {
        Some(v) if !v.is_null() => Ok(()),
        _ => Err("node_id is required for this transition".to_string()),
    }
}

fn cloud_provision_ready_guard(row: &Row) -> Result<(), String> {
    match row.get("provider_instance_id") {
        Some(v) if v.is_string() && !v.as_str().unwrap_or_default().is_empty() => Ok(()),
        _ => Err("provider_instance_id must be populated before entering ready".to_string()),
    }
}

fn build_template() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("creator_id", "user").required().internal(),
        FieldDef::text("name").required().max_length(200),
        FieldDef::text("slug").required().unique().computed_from("name"),
        FieldDef::text("version").required().max_length(50),
        FieldDef::long_text("compose_spec").required(),
        FieldDef::json("variables").nullable().default_null(),
        FieldDef::integer("price_monthly_cents")
            .nullable()
            .default_int(0)
            .min_value(0.0),
        FieldDef::boolean("published").default_bool(false),
    ]);
    Resource {
        name: "template",
        ref_prefix: "tmpl_",
        owner_field: Some("creator_id"),
        public_read: true,
        fields,
        state_machine: None,
        custom_actions: leak(vec![CustomAction {
            name: "publish",
            method: HttpMethod::Post,
        }]),
        visibility: Some(template_visibility),
        before_create: None,
        before_delete: None,
        compute: Some(template_compute),
    }
}

fn build_deployment() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("customer_id", "user").required().internal(),
        FieldDef::hard_ref("template_id", "template").required(),
        FieldDef::hard_ref("node_id", "node").nullable(),
        FieldDef::text("status").default_str("pending"),
        FieldDef::json("domains").nullable().default_null(),
        FieldDef::integer("proxy_port").nullable(),
        FieldDef::json("container_ids").nullable().default_null(),
        FieldDef::text("error_message").nullable(),
    ]);
    let transitions: &'static [(&'static str, &'static [&'static str])] = leak(vec![
        ("pending", &["scheduled"] as &[&str]),
        ("scheduled", &["starting"]),
        ("starting", &["running", "failed"]),
        ("running", &["stopping", "failed"]),
        ("stopping", &["stopped"]),
        ("stopped", &["starting", "deleting"]),
        ("failed", &["starting", "deleting"]),
        ("deleting", &["deleted"]),
    ]);
    let guards = leak(vec![Guard {
        to_state: "starting",
        check: deployment_starting_guard,
    }]);
    let on_enter = leak(vec![
        ("scheduled", "schedule_deployment"),
        ("starting", "start_deployment"),
        ("stopping", "stop_deployment"),
        ("deleting", "delete_deployment"),
    ]);
    Resource {
        name: "deployment",
        ref_prefix: "depl_",
        owner_field: Some("customer_id"),
        public_read: false,
        fields,
        state_machine: Some(StateMachineDef {
            field: "status",
            initial: "pending",
            transitions,
            guards,
            on_enter,
        }),
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_node() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("creator_id", "user").required().internal(),
        FieldDef::text("name").required().max_length(100),
        FieldDef::text("host").required(),
        FieldDef::text("kind").required(),
        FieldDef::text("status").default_str("offline"),
        FieldDef::boolean("public").default_bool(false),
        FieldDef::hard_ref("ssh_key_id", "ssh_key").nullable(),
        FieldDef::timestamp("last_health_check").nullable(),
        FieldDef::text("error_message").nullable(),
    ]);
    Resource {
        name: "node",
        ref_prefix: "node_",
        owner_field: Some("creator_id"),
        public_read: false,
        fields,
        state_machine: None,
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_ssh_key() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("creator_id", "user").required().internal(),
        FieldDef::text("name").required().max_length(100),
        FieldDef::long_text("public_key").required(),
        FieldDef::long_text("private_key_encrypted")
            .required()
            .write_only()
            .encrypted(),
    ]);
    Resource {
        name: "ssh_key",
        ref_prefix: "sshk_",
        owner_field: Some("creator_id"),
        public_read: false,
        fields,
        state_machine: None,
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_cloud_credential() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("creator_id", "user").required().internal(),
        FieldDef::text("name").required().max_length(100),
        FieldDef::text("provider").required(),
        FieldDef::long_text("credentials_encrypted")
            .required()
            .write_only()
            .encrypted(),
    ]);
    Resource {
        name: "cloud_credential",
        ref_prefix: "ccred_",
        owner_field: Some("creator_id"),
        public_read: false,
        fields,
        state_machine: None,
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_cloud_provision() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("creator_id", "user").required().internal(),
        FieldDef::hard_ref("credential_id", "cloud_credential").required(),
        FieldDef::hard_ref("node_id", "node").nullable(),
        FieldDef::hard_ref("ssh_key_id", "ssh_key").required(),
        FieldDef::text("provider").required(),
        FieldDef::text("region").required(),
        FieldDef::text("size").required(),
        FieldDef::text("instance_name").required(),
        FieldDef::text("provider_instance_id").nullable(),
        FieldDef::text("public_ip").nullable(),
        FieldDef::text("status").default_str("pending"),
        FieldDef::timestamp("state_entered_at").nullable(),
        FieldDef::text("error_message").nullable(),
    ]);
    let transitions: &'static [(&'static str, &'static [&'static str])] = leak(vec![
        ("pending", &["creating", "failed"] as &[&str]),
        ("creating", &["configuring", "failed"]),
        ("configuring", &["ready", "failed"]),
        ("ready", &["destroying"]),
        ("destroying", &["destroyed", "failed"]),
        ("failed", &["destroying"]),
    ]);
    let guards = leak(vec![Guard {
        to_state: "ready",
        check: cloud_provision_ready_guard,
    }]);
    let on_enter = leak(vec![("destroying", "destroy_cloud_provision")]);
    Resource {
        name: "cloud_provision",
        ref_prefix: "prov_",
        owner_field: Some("creator_id"),
        public_read: false,
        fields,
        state_machine: Some(StateMachineDef {
            field: "status",
            initial: "pending",
            transitions,
            guards,
            on_enter,
        }),
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_invoice() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("user_id", "user").required().internal(),
        FieldDef::timestamp("period_start").required(),
        FieldDef::timestamp("period_end").required(),
        FieldDef::json("line_items").required(),
        FieldDef::integer("total_cents").default_int(0).min_value(0.0),
        FieldDef::text("status").default_str("draft"),
    ]);
    let transitions: &'static [(&'static str, &'static [&'static str])] = leak(vec![
        ("draft", &["pending"] as &[&str]),
        ("pending", &["paid", "failed"]),
        ("failed", &["pending"]),
    ]);
    Resource {
        name: "invoice",
        ref_prefix: "inv_",
        owner_field: Some("user_id"),
        public_read: false,
        fields,
        state_machine: Some(StateMachineDef {
            field: "status",
            initial: "draft",
            transitions,
            guards: &[],
            on_enter: &[],
        }),
        custom_actions: leak(vec![
            CustomAction {
                name: "pay",
                method: HttpMethod::Post,
            },
            CustomAction {
                name: "verify-payment",
                method: HttpMethod::Post,
            },
        ]),
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_usage_event() -> Resource {
    let fields = leak(vec![
        FieldDef::hard_ref("owner_id", "user").required().internal(),
        FieldDef::text("event_type").required(),
        FieldDef::soft_ref("resource_ref", "various").required(),
        FieldDef::text("resource_type").required(),
        FieldDef::json("metadata").nullable().default_null(),
        FieldDef::timestamp("reported_at").nullable(),
    ]);
    Resource {
        name: "usage_event",
        ref_prefix: "evt_",
        owner_field: Some("owner_id"),
        public_read: false,
        fields,
        state_machine: None,
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_user() -> Resource {
    let fields = leak(vec![
        FieldDef::text("external_id").required().unique(),
        FieldDef::text("plan_id").nullable(),
        FieldDef::text("email").nullable(),
    ]);
    Resource {
        name: "user",
        ref_prefix: "user_",
        owner_field: None,
        public_read: false,
        fields,
        state_machine: None,
        custom_actions: &[],
        visibility: None,
        before_create: None,
        before_delete: None,
        compute: None,
    }
}

fn build_registry() -> Vec<Resource> {
    vec![
        build_user(),
        build_template(),
        build_node(),
        build_ssh_key(),
        build_cloud_credential(),
        build_cloud_provision(),
        build_deployment(),
        build_invoice(),
        build_usage_event(),
    ]
}

/// The process-wide schema registry, built once on first access.
pub fn registry() -> &'static [Resource] {
    static REGISTRY: OnceLock<Vec<Resource>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Look up a resource by its storage table name / REST path segment.
pub fn resource(name: &str) -> Option<&'static Resource> {
    registry().iter().find(|r| r.name == name)
}
