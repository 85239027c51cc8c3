use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::Value;

/// Typed pointer to a record of some entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    pub entity: String,
    pub key: i64,
}

impl RecordRef {
    pub fn new(entity: impl Into<String>, key: i64) -> Self {
        Self {
            entity: entity.into(),
            key,
        }
    }
}

/// Lifecycle status of a record
///
/// Records are never physically removed by this crate; deletion is a
/// transition to `SoftDeleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Active,
    SoftDeleted,
}

/// A stored entity instance
///
/// The primary key lives in `key`; every other attribute, including the
/// self-referencing parent pointer, lives in `attrs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub entity: String,
    pub key: i64,
    pub status: Status,
    pub attrs: BTreeMap<String, Value>,
}

impl Record {
    /// Create an active record with no attributes
    pub fn new(entity: impl Into<String>, key: i64) -> Self {
        Self {
            entity: entity.into(),
            key,
            status: Status::Active,
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.attrs.insert(name.into(), value);
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Reference pointing at this record
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(self.entity.clone(), self.key)
    }
}
