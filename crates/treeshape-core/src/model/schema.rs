use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::handlers::HandlerRegistry;
use super::record::RecordRef;
use super::value::Value;
use crate::query::expr::{Lookup, OrderKey};
use crate::traversal::ancestors::DEFAULT_PARENT_FIELD;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

/// Kind of a declared base field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Int,
    Text,
    Float,
    Bool,
    #[serde(rename = "datetime")]
    DateTime,
    /// Foreign hop to a record of `entity`
    Relation { entity: String },
}

impl FieldKind {
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Text)
    }

    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldKind::Relation { entity } => Some(entity),
            _ => None,
        }
    }

    /// Decode a raw JSON value into this kind
    ///
    /// Null is accepted for every kind. The error string describes the
    /// mismatch and is wrapped by the caller with entity/field context.
    pub fn decode(&self, raw: &serde_json::Value) -> Result<Value, String> {
        use serde_json::Value as Json;

        if raw.is_null() {
            return Ok(Value::Null);
        }
        match self {
            FieldKind::Int => match raw {
                Json::Number(n) => n
                    .as_i64()
                    .map(Value::Int)
                    .ok_or_else(|| format!("expected integer, got {}", n)),
                Json::String(s) => s
                    .trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| format!("expected integer, got {:?}", s)),
                other => Err(format!("expected integer, got {}", other)),
            },
            FieldKind::Float => match raw {
                Json::Number(n) => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("expected number, got {}", n)),
                Json::String(s) => s
                    .trim()
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| format!("expected number, got {:?}", s)),
                other => Err(format!("expected number, got {}", other)),
            },
            FieldKind::Bool => match raw {
                Json::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(format!("expected boolean, got {}", other)),
            },
            FieldKind::Text => match raw {
                Json::String(s) => Ok(Value::Text(s.clone())),
                Json::Number(n) => Ok(Value::Text(n.to_string())),
                Json::Bool(b) => Ok(Value::Text(b.to_string())),
                other => Err(format!("expected text, got {}", other)),
            },
            FieldKind::DateTime => match raw {
                Json::String(s) => parse_datetime(s)
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("expected RFC 3339 datetime, got {:?}", s)),
                other => Err(format!("expected datetime string, got {}", other)),
            },
            FieldKind::Relation { entity } => {
                let key = match raw {
                    Json::Number(n) => n.as_i64(),
                    Json::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                key.map(|k| Value::Ref(RecordRef::new(entity.clone(), k)))
                    .ok_or_else(|| format!("expected {} key, got {}", entity, raw))
            }
        }
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare date
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Declared base field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Schema of one entity: primary key, parent relation, base fields and handlers
#[derive(Clone, Serialize, Deserialize)]
pub struct RecordSchema {
    pub entity: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(skip)]
    pub handlers: HandlerRegistry,
}

impl RecordSchema {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            primary_key: default_primary_key(),
            parent_field: None,
            fields: Vec::new(),
            handlers: HandlerRegistry::default(),
        }
    }

    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Declare a base field, in output order
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(name, kind));
        self
    }

    /// Declare the self-referencing parent relation
    pub fn with_parent(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.iter().any(|f| f.name == name) {
            let kind = FieldKind::Relation {
                entity: self.entity.clone(),
            };
            self.fields.push(FieldDef::new(name.clone(), kind));
        }
        self.parent_field = Some(name);
        self
    }

    pub fn with_search_handler<F>(mut self, field: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> Vec<Lookup> + Send + Sync + 'static,
    {
        self.handlers.register_search(field, handler);
        self
    }

    pub fn with_sort_handler<F>(mut self, field: impl Into<String>, handler: F) -> Self
    where
        F: Fn(bool) -> Vec<OrderKey> + Send + Sync + 'static,
    {
        self.handlers.register_sort(field, handler);
        self
    }

    /// Base fields in output order; the primary key always comes first
    pub fn base_fields(&self) -> Vec<FieldDef> {
        let mut out = vec![FieldDef::new(self.primary_key.clone(), FieldKind::Int)];
        out.extend(
            self.fields
                .iter()
                .filter(|f| f.name != self.primary_key)
                .cloned(),
        );
        out
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if self.is_primary_key(name) {
            return Some(FieldKind::Int);
        }
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.kind.clone())
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key == name
    }

    pub fn parent_field_name(&self) -> &str {
        self.parent_field.as_deref().unwrap_or(DEFAULT_PARENT_FIELD)
    }
}

impl std::fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSchema")
            .field("entity", &self.entity)
            .field("primary_key", &self.primary_key)
            .field("parent_field", &self.parent_field)
            .field("fields", &self.fields)
            .field("handlers", &self.handlers)
            .finish()
    }
}
