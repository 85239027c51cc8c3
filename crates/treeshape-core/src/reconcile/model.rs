use serde::{Deserialize, Serialize};

use crate::model::RawData;

/// One write requested by reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReconciliationOperation {
    Create { data: RawData },
    Update { key: i64, data: RawData },
    SoftDelete { key: i64 },
}

impl ReconciliationOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationOperation::Create { .. } => "create",
            ReconciliationOperation::Update { .. } => "update",
            ReconciliationOperation::SoftDelete { .. } => "soft_delete",
        }
    }

    pub fn key(&self) -> Option<i64> {
        match self {
            ReconciliationOperation::Create { .. } => None,
            ReconciliationOperation::Update { key, .. }
            | ReconciliationOperation::SoftDelete { key } => Some(*key),
        }
    }
}

/// Key assigned to a submitted entry
///
/// Entries without an integer primary key get `Placeholder(-(position + 1))`,
/// which never compares equal to an `Explicit` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionKey {
    Explicit(i64),
    Placeholder(i64),
}

impl SubmissionKey {
    pub fn for_entry(data: &RawData, primary_key: &str, position: usize) -> Self {
        match data.get(primary_key).and_then(serde_json::Value::as_i64) {
            Some(key) => SubmissionKey::Explicit(key),
            None => SubmissionKey::Placeholder(-(position as i64) - 1),
        }
    }

    pub fn explicit(&self) -> Option<i64> {
        match self {
            SubmissionKey::Explicit(key) => Some(*key),
            SubmissionKey::Placeholder(_) => None,
        }
    }
}

/// Stamp `field` with the acting user on creates, and carry the stored
/// value on updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub field: String,
    pub actor: serde_json::Value,
}

impl AuditStamp {
    pub fn new(field: impl Into<String>, actor: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            actor: actor.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOptions {
    pub audit: Option<AuditStamp>,
}

impl ReconcileOptions {
    pub fn with_audit(mut self, audit: AuditStamp) -> Self {
        self.audit = Some(audit);
        self
    }
}

/// Keys touched by an applied operation set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedSummary {
    pub created: Vec<i64>,
    pub updated: Vec<i64>,
    pub soft_deleted: Vec<i64>,
}

impl AppliedSummary {
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.soft_deleted.len()
    }
}

/// Operations produced and what applying them did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub operations: Vec<ReconciliationOperation>,
    pub summary: AppliedSummary,
}
