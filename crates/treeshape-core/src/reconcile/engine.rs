use std::collections::{HashMap, HashSet};

use super::model::{AuditStamp, ReconcileOptions, ReconciliationOperation, SubmissionKey};
use crate::model::{RawData, Record};

/// Diff a submitted list against existing records
///
/// Submitted order first: an entry whose key matches an existing record is
/// an update, anything else a create. Then existing order: every record not
/// submitted is soft-deleted. The primary key never appears in operation data.
pub fn reconcile(
    existing: &[&Record],
    submitted: &[RawData],
    primary_key: &str,
) -> Vec<ReconciliationOperation> {
    reconcile_with(existing, submitted, primary_key, &ReconcileOptions::default())
}

/// [`reconcile`] with audit stamping
pub fn reconcile_with(
    existing: &[&Record],
    submitted: &[RawData],
    primary_key: &str,
    options: &ReconcileOptions,
) -> Vec<ReconciliationOperation> {
    let by_key: HashMap<i64, &Record> = existing.iter().map(|r| (r.key, *r)).collect();
    let mut submitted_keys = HashSet::new();
    let mut ops = Vec::with_capacity(existing.len() + submitted.len());

    for (position, entry) in submitted.iter().enumerate() {
        let key = SubmissionKey::for_entry(entry, primary_key, position);
        let mut data: RawData = entry
            .iter()
            .filter(|(name, _)| name.as_str() != primary_key)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let matched = key.explicit().and_then(|k| by_key.get(&k).copied());
        match matched {
            Some(record) => {
                submitted_keys.insert(record.key);
                if let Some(audit) = &options.audit {
                    carry_audit(&mut data, audit, record);
                }
                ops.push(ReconciliationOperation::Update {
                    key: record.key,
                    data,
                });
            }
            None => {
                if let Some(audit) = &options.audit {
                    data.insert(audit.field.clone(), audit.actor.clone());
                }
                ops.push(ReconciliationOperation::Create { data });
            }
        }
    }

    for record in existing {
        if !submitted_keys.contains(&record.key) {
            ops.push(ReconciliationOperation::SoftDelete { key: record.key });
        }
    }

    tracing::debug!(
        existing = existing.len(),
        submitted = submitted.len(),
        ops_len = ops.len(),
        "reconciled"
    );
    ops
}

fn carry_audit(data: &mut RawData, audit: &AuditStamp, record: &Record) {
    let stored = record
        .get(&audit.field)
        .map(|v| v.to_json())
        .unwrap_or(serde_json::Value::Null);
    data.insert(audit.field.clone(), stored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_placeholders_never_match_negative_keys() {
        let negative = Record::new("tag", -1);
        let ops = reconcile(&[&negative], &[raw(json!({"name": "x"}))], "id");

        assert_eq!(
            ops,
            vec![
                ReconciliationOperation::Create {
                    data: raw(json!({"name": "x"}))
                },
                ReconciliationOperation::SoftDelete { key: -1 },
            ]
        );
    }

    #[test]
    fn test_non_integer_key_is_a_create() {
        let existing = Record::new("tag", 1);
        let ops = reconcile(&[&existing], &[raw(json!({"id": "1", "name": "x"}))], "id");

        assert_eq!(ops[0].kind(), "create");
        assert_eq!(ops[1], ReconciliationOperation::SoftDelete { key: 1 });
    }

    #[test]
    fn test_audit_stamp_on_create_and_update() {
        let existing = Record::new("tag", 1).with("added_by", 7i64);
        let options = ReconcileOptions::default().with_audit(AuditStamp::new("added_by", 42));
        let submitted = [raw(json!({"id": 1, "added_by": 99})), raw(json!({"name": "n"}))];

        let ops = reconcile_with(&[&existing], &submitted, "id", &options);
        assert_eq!(
            ops,
            vec![
                ReconciliationOperation::Update {
                    key: 1,
                    data: raw(json!({"added_by": 7}))
                },
                ReconciliationOperation::Create {
                    data: raw(json!({"name": "n", "added_by": 42}))
                },
            ]
        );
    }
}
