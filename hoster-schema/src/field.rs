use serde_json::Value;

/// The storage/runtime type of a field.
///
/// `HardRef` fields are integer foreign keys enforced at the storage layer;
/// `SoftRef` fields are textual reference ids, not enforced there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Integer,
    Float,
    Boolean,
    Json,
    Timestamp,
    HardRef,
    SoftRef,
}

/// A constant-foldable default value for a field.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl DefaultValue {
    pub fn to_json(&self) -> Value {
        match self {
            DefaultValue::Str(s) => Value::String((*s).to_string()),
            DefaultValue::Int(i) => Value::from(*i),
            DefaultValue::Float(f) => Value::from(*f),
            DefaultValue::Bool(b) => Value::Bool(*b),
            DefaultValue::Null => Value::Null,
        }
    }

    /// The literal as it appears in a `DEFAULT ...` SQL clause.
    pub fn to_sql_literal(&self) -> String {
        match self {
            DefaultValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::Int(i) => i.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            DefaultValue::Null => "NULL".to_string(),
        }
    }
}

/// A declarative field descriptor. Built via the chainable methods below; the
/// resulting value is pure data, composed once at process start into a
/// [`crate::resource::Resource`].
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub pattern: Option<&'static str>,
    pub write_only: bool,
    pub encrypted: bool,
    pub internal: bool,
    pub computed_from: Option<&'static str>,
    pub references: Option<&'static str>,
}

impl FieldDef {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            nullable: false,
            default: None,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            pattern: None,
            write_only: false,
            encrypted: false,
            internal: false,
            computed_from: None,
            references: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn long_text(name: &'static str) -> Self {
        Self::new(name, FieldKind::LongText)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: &'static str) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn json(name: &'static str) -> Self {
        Self::new(name, FieldKind::Json)
    }

    pub fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    /// Integer foreign key to another resource's `id` column.
    pub fn hard_ref(name: &'static str, resource: &'static str) -> Self {
        let mut f = Self::new(name, FieldKind::HardRef);
        f.references = Some(resource);
        f
    }

    /// Textual reference id to another resource, not enforced at the storage layer.
    pub fn soft_ref(name: &'static str, resource: &'static str) -> Self {
        let mut f = Self::new(name, FieldKind::SoftRef);
        f.references = Some(resource);
        f
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_str(mut self, v: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(v));
        self
    }

    pub fn default_int(mut self, v: i64) -> Self {
        self.default = Some(DefaultValue::Int(v));
        self
    }

    pub fn default_bool(mut self, v: bool) -> Self {
        self.default = Some(DefaultValue::Bool(v));
        self
    }

    pub fn default_null(mut self) -> Self {
        self.default = Some(DefaultValue::Null);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn min_value(mut self, n: f64) -> Self {
        self.min_value = Some(n);
        self
    }

    pub fn max_value(mut self, n: f64) -> Self {
        self.max_value = Some(n);
        self
    }

    pub fn pattern(mut self, re: &'static str) -> Self {
        self.pattern = Some(re);
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Marks this field as computed from another field (e.g. `slug` from `name`).
    /// The actual computation function lives with the resource, keyed by field name.
    pub fn computed_from(mut self, source_field: &'static str) -> Self {
        self.computed_from = Some(source_field);
        self
    }

    pub fn is_computed(&self) -> bool {
        self.computed_from.is_some()
    }

    /// SQL column type for DDL generation.
    pub fn sql_type(&self) -> &'static str {
        match self.kind {
            FieldKind::Text | FieldKind::LongText | FieldKind::Json | FieldKind::Timestamp => {
                "TEXT"
            }
            FieldKind::Integer | FieldKind::HardRef | FieldKind::Boolean => "INTEGER",
            FieldKind::Float => "REAL",
            FieldKind::SoftRef => "TEXT",
        }
    }
}
