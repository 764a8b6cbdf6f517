use std::collections::BTreeSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::field::{FieldDef, FieldKind};

/// A row, prior to typed decoding: the dynamic `attributes` map that crosses
/// the REST boundary and is threaded through hooks, guards, and visibility
/// predicates.
pub type Row = Map<String, Value>;

/// HTTP verb for a custom action route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

/// A domain-specific operation declared alongside CRUD (`publish`, `start`, `pay`, ...).
#[derive(Debug, Clone, Copy)]
pub struct CustomAction {
    pub name: &'static str,
    pub method: HttpMethod,
}

/// Per-to-state guard: a predicate over the current row that must hold for entry.
pub struct Guard {
    pub to_state: &'static str,
    pub check: fn(&Row) -> Result<(), String>,
}

/// A declarative finite-state machine attached to a resource.
pub struct StateMachineDef {
    pub field: &'static str,
    pub initial: &'static str,
    pub transitions: &'static [(&'static str, &'static [&'static str])],
    pub guards: &'static [Guard],
    pub on_enter: &'static [(&'static str, &'static str)],
}

impl StateMachineDef {
    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.transitions
            .iter()
            .find(|(f, _)| *f == from)
            .map(|(_, tos)| tos.contains(&to))
            .unwrap_or(false)
    }

    pub fn all_states(&self) -> Vec<&'static str> {
        let mut set = BTreeSet::new();
        set.insert(self.initial);
        for (from, tos) in self.transitions {
            set.insert(from);
            for to in *tos {
                set.insert(to);
            }
        }
        set.into_iter().collect()
    }

    pub fn guard_for(&self, to_state: &str) -> Option<&Guard> {
        self.guards.iter().find(|g| g.to_state == to_state)
    }

    pub fn on_enter_command(&self, to_state: &str) -> Option<&'static str> {
        self.on_enter
            .iter()
            .find(|(s, _)| *s == to_state)
            .map(|(_, cmd)| *cmd)
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

/// A declarative resource definition. Constructed once at process start and
/// never mutated afterwards; the rest of the system (store, REST surface,
/// reconcilers) derives its behavior from it.
pub struct Resource {
    pub name: &'static str,
    pub ref_prefix: &'static str,
    pub owner_field: Option<&'static str>,
    pub public_read: bool,
    pub fields: &'static [FieldDef],
    pub state_machine: Option<StateMachineDef>,
    pub custom_actions: &'static [CustomAction],
    pub visibility: Option<fn(caller_id: Option<i64>, row: &Row) -> bool>,
    pub before_create: Option<fn(&mut Row) -> Result<(), String>>,
    pub before_delete: Option<fn(&Row) -> Result<(), String>>,
    pub compute: Option<fn(field: &'static str, row: &Row) -> Option<Value>>,
}

/// Fields implicitly present on every resource row.
pub const IMPLICIT_FIELDS: &[&str] = &["id", "reference_id", "created_at", "updated_at"];

impl Resource {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_internal(&self, name: &str) -> bool {
        self.field(name).map(|f| f.internal).unwrap_or(false)
            || name == "id"
            || name == "created_at"
            || name == "updated_at"
    }

    pub fn is_write_only(&self, name: &str) -> bool {
        self.field(name).map(|f| f.write_only).unwrap_or(false)
    }

    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.state_machine
            .as_ref()
            .map(|sm| sm.can_transition(from, to))
            .unwrap_or(false)
    }

    pub fn all_states(&self) -> Vec<&'static str> {
        self.state_machine
            .as_ref()
            .map(|sm| sm.all_states())
            .unwrap_or_default()
    }

    pub fn state_field(&self) -> Option<&'static str> {
        self.state_machine.as_ref().map(|sm| sm.field)
    }

    /// Run per-field validation (required / min-max length / min-max value /
    /// pattern) against a pre-defaulted, pre-computed row.
    pub fn validate(&self, row: &Row) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for field in self.fields {
            let value = row.get(field.name);

            let present = value.map(|v| !v.is_null()).unwrap_or(false);
            if field.required && !field.nullable && !present {
                errors.push(ValidationError {
                    field: field.name,
                    message: format!("{} is required", field.name),
                });
                continue;
            }
            let Some(value) = value else { continue };
            if value.is_null() {
                continue;
            }

            if let Some(s) = value.as_str() {
                if let Some(min) = field.min_length {
                    if s.chars().count() < min {
                        errors.push(ValidationError {
                            field: field.name,
                            message: format!("{} must be at least {min} characters", field.name),
                        });
                    }
                }
                if let Some(max) = field.max_length {
                    if s.chars().count() > max {
                        errors.push(ValidationError {
                            field: field.name,
                            message: format!("{} must be at most {max} characters", field.name),
                        });
                    }
                }
                if let Some(pattern) = field.pattern {
                    match Regex::new(pattern) {
                        Ok(re) if !re.is_match(s) => errors.push(ValidationError {
                            field: field.name,
                            message: format!("{} does not match required pattern", field.name),
                        }),
                        Err(_) => errors.push(ValidationError {
                            field: field.name,
                            message: format!("{} has an invalid validation pattern", field.name),
                        }),
                        _ => {}
                    }
                }
            }

            if matches!(field.kind, FieldKind::Integer | FieldKind::Float) {
                if let Some(n) = value.as_f64() {
                    if let Some(min) = field.min_value {
                        if n < min {
                            errors.push(ValidationError {
                                field: field.name,
                                message: format!("{} must be >= {min}", field.name),
                            });
                        }
                    }
                    if let Some(max) = field.max_value {
                        if n > max {
                            errors.push(ValidationError {
                                field: field.name,
                                message: format!("{} must be <= {max}", field.name),
                            });
                        }
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Generate an idempotent `CREATE TABLE` statement plus indices on every
    /// reference field. All defaults must be constant-foldable.
    pub fn generate_create_sql(&self) -> String {
        let mut cols = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "reference_id TEXT NOT NULL UNIQUE".to_string(),
        ];
        let mut fks = Vec::new();
        for field in self.fields {
            let mut col = format!("{} {}", field.name, field.sql_type());
            if !field.nullable && field.required {
                col.push_str(" NOT NULL");
            }
            if field.unique {
                col.push_str(" UNIQUE");
            }
            if let Some(default) = &field.default {
                col.push_str(&format!(" DEFAULT {}", default.to_sql_literal()));
            }
            cols.push(col);
            if field.kind == FieldKind::HardRef {
                if let Some(target) = field.references {
                    fks.push(format!(
                        "FOREIGN KEY ({}) REFERENCES {}(id)",
                        field.name, target
                    ));
                }
            }
        }
        cols.push("created_at TEXT NOT NULL".to_string());
        cols.push("updated_at TEXT NOT NULL".to_string());
        cols.extend(fks);

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n);\n",
            self.name,
            cols.join(",\n  ")
        );
        for field in self.fields {
            if field.kind == FieldKind::HardRef || field.kind == FieldKind::SoftRef {
                sql.push_str(&format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({});\n",
                    self.name, field.name, self.name, field.name
                ));
            }
        }
        sql
    }
}
