use std::time::Instant;

use super::engine::reconcile_with;
use super::model::{AppliedSummary, ReconcileOptions, ReconcileReport, ReconciliationOperation};
use crate::errors::{Result, ShapeError};
use crate::model::{RawData, Record};
use crate::ops::{QueryableCollection, StorageWriter, Store};
use crate::{log_op_end, log_op_error, log_op_start};

/// Apply operations in order through a storage writer
///
/// No compensation: operations before a failure stay applied.
///
/// # Errors
///
/// * `PartialReconciliation` - Naming the failed operation and how many
///   operations were applied before it
pub fn apply_operations<W: StorageWriter + ?Sized>(
    writer: &mut W,
    ops: &[ReconciliationOperation],
) -> Result<AppliedSummary> {
    let mut summary = AppliedSummary::default();
    for (index, op) in ops.iter().enumerate() {
        let step = match op {
            ReconciliationOperation::Create { data } => writer
                .create(data)
                .map(|record| summary.created.push(record.key)),
            ReconciliationOperation::Update { key, data } => writer
                .update(*key, data)
                .map(|record| summary.updated.push(record.key)),
            ReconciliationOperation::SoftDelete { key } => writer
                .soft_delete(*key)
                .map(|()| summary.soft_deleted.push(*key)),
        };
        if let Err(cause) = step {
            return Err(ShapeError::PartialReconciliation {
                index,
                op: op.kind().to_string(),
                applied: index,
                cause: Box::new(cause),
            });
        }
    }
    Ok(summary)
}

/// Reconcile and apply through `writer`
///
/// # Errors
///
/// * `PartialReconciliation` - If an operation fails
pub fn reconcile_and_apply<W: StorageWriter + ?Sized>(
    writer: &mut W,
    existing: &[&Record],
    submitted: &[RawData],
    primary_key: &str,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    let start = Instant::now();
    log_op_start!("reconcile_and_apply", submitted = submitted.len());

    let operations = reconcile_with(existing, submitted, primary_key, options);
    match apply_operations(writer, &operations) {
        Ok(summary) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            log_op_end!(
                "reconcile_and_apply",
                duration_ms = duration_ms,
                ops_len = operations.len()
            );
            Ok(ReconcileReport {
                operations,
                summary,
            })
        }
        Err(err) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            log_op_error!("reconcile_and_apply", err.clone(), duration_ms = duration_ms);
            Err(err)
        }
    }
}

/// Reconcile the active records of `entity` in one all-or-nothing transaction
///
/// # Errors
///
/// * `UnknownEntity` - If the entity has no schema
/// * `PartialReconciliation` - If an operation fails; the store is unchanged
pub fn reconcile_store(
    store: &mut Store,
    entity: &str,
    submitted: &[RawData],
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    store.transaction(|tx| {
        let primary_key = tx.get_schema(entity)?.primary_key.clone();
        let existing: Vec<Record> = tx
            .collection(entity)?
            .records()
            .into_iter()
            .cloned()
            .collect();
        let existing: Vec<&Record> = existing.iter().collect();

        let mut writer = tx.writer(entity)?;
        reconcile_and_apply(&mut writer, &existing, submitted, &primary_key, options)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, RecordSchema};
    use serde_json::json;

    fn store() -> Store {
        let mut store = Store::new();
        store.register_schema(RecordSchema::new("tag").field("name", FieldKind::Text));
        store
            .insert_record(Record::new("tag", 1).with("name", "a"))
            .unwrap();
        store
    }

    #[test]
    fn test_apply_reports_partial_failure() {
        let mut store = store();
        let ops = vec![
            ReconciliationOperation::SoftDelete { key: 1 },
            ReconciliationOperation::Update {
                key: 9,
                data: RawData::new(),
            },
        ];

        let mut writer = store.writer("tag").unwrap();
        let err = apply_operations(&mut writer, &ops).unwrap_err();
        match err {
            ShapeError::PartialReconciliation {
                index, applied, op, ..
            } => {
                assert_eq!((index, applied), (1, 1));
                assert_eq!(op, "update");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // No compensation
        assert!(!store.record("tag", 1).unwrap().is_active());
    }

    #[test]
    fn test_reconcile_store_rolls_back_on_failure() {
        let mut store = store();
        let submitted = vec![
            json!({"name": "fresh"}).as_object().cloned().unwrap(),
            json!({"id": 1, "color": "red"}).as_object().cloned().unwrap(),
        ];

        let err = reconcile_store(&mut store, "tag", &submitted, &ReconcileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ShapeError::PartialReconciliation { index: 1, applied: 1, .. }));
        assert!(store.record("tag", 2).is_none());
    }
}
