use std::collections::HashSet;

use super::path::field_value;
use crate::errors::{Result, ShapeError};
use crate::model::{Record, Value};
use crate::ops::RecordResolver;

/// Parent relation name used when a schema does not declare one
pub const DEFAULT_PARENT_FIELD: &str = "parent";

/// Walk parent pointers from `record` up to the root
///
/// Returns the records in record-to-root order, `record` first. A null or
/// dangling parent reference ends the walk.
///
/// # Errors
///
/// * `CycleDetected` - If the walk revisits a key
pub fn walk<'r>(
    resolver: &'r dyn RecordResolver,
    record: &'r Record,
    parent_field: &str,
) -> Result<Vec<&'r Record>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut current = Some(record);

    while let Some(node) = current {
        if !visited.insert(node.key) {
            return Err(ShapeError::CycleDetected {
                entity: node.entity.clone(),
                key: node.key,
            });
        }
        path.push(node);

        current = node
            .get(parent_field)
            .and_then(Value::as_record_ref)
            .and_then(|parent| resolver.resolve(parent));
    }

    Ok(path)
}

/// Ordered root-to-record sequence of `field` values; empty for `None`
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn chain(
    resolver: &dyn RecordResolver,
    record: Option<&Record>,
    field: &str,
    parent_field: &str,
) -> Result<Vec<Value>> {
    let Some(record) = record else {
        return Ok(Vec::new());
    };
    let mut path = walk(resolver, record, parent_field)?;
    path.reverse();
    Ok(path
        .into_iter()
        .map(|r| field_value(resolver, r, field))
        .collect())
}

/// The parent relation token repeated once per hop from `record` to the root
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn relation_path(
    resolver: &dyn RecordResolver,
    record: &Record,
    parent_field: &str,
) -> Result<Vec<String>> {
    let hops = walk(resolver, record, parent_field)?.len().saturating_sub(1);
    Ok(vec![parent_field.to_string(); hops])
}

/// Parent relation name declared for the record's entity
pub fn parent_field_of(resolver: &dyn RecordResolver, record: &Record) -> String {
    resolver
        .schema(&record.entity)
        .map(|s| s.parent_field_name().to_string())
        .unwrap_or_else(|| DEFAULT_PARENT_FIELD.to_string())
}

/// Primary-key name declared for the record's entity
pub fn primary_key_of(resolver: &dyn RecordResolver, record: &Record) -> String {
    resolver
        .schema(&record.entity)
        .map(|s| s.primary_key.clone())
        .unwrap_or_else(|| crate::model::DEFAULT_PRIMARY_KEY.to_string())
}

/// Nearest parent of a record, if it resolves
pub fn parent<'r>(resolver: &'r dyn RecordResolver, record: &'r Record) -> Option<&'r Record> {
    let parent_field = parent_field_of(resolver, record);
    record
        .get(&parent_field)
        .and_then(Value::as_record_ref)
        .and_then(|r| resolver.resolve(r))
}

/// Breadcrumb keys: the primary-key chain of the record's parent
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn cascader(resolver: &dyn RecordResolver, record: &Record) -> Result<Vec<Value>> {
    let pk = primary_key_of(resolver, record);
    cascader_of(resolver, record, &pk)
}

/// Like [`cascader`], collecting `field` instead of the primary key
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn cascader_of(
    resolver: &dyn RecordResolver,
    record: &Record,
    field: &str,
) -> Result<Vec<Value>> {
    let parent_field = parent_field_of(resolver, record);
    chain(resolver, parent(resolver, record), field, &parent_field)
}

/// The ancestor `depth` steps above the nearest parent (`0` is the parent)
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn recursive<'r>(
    resolver: &'r dyn RecordResolver,
    record: &'r Record,
    depth: usize,
) -> Result<Option<&'r Record>> {
    ancestor_at(resolver, record, depth + 1)
}

/// The record `steps` parent hops above `record` (`0` is the record itself)
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn ancestor_at<'r>(
    resolver: &'r dyn RecordResolver,
    record: &'r Record,
    steps: usize,
) -> Result<Option<&'r Record>> {
    let parent_field = parent_field_of(resolver, record);
    let path = walk(resolver, record, &parent_field)?;
    Ok(path.get(steps).copied())
}

/// Lookup path from `record` to its ancestor at `depth`, then `field`
///
/// Takes the relation-path tokens from offset `len - (depth + 1)`, which is
/// exactly `depth + 1` parent hops. `None` when the record has no ancestor at
/// that depth.
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn lookup_path(
    resolver: &dyn RecordResolver,
    record: &Record,
    depth: usize,
    field: &str,
) -> Result<Option<Vec<String>>> {
    hop_path(resolver, record, depth + 1, field)
}

/// `steps` parent tokens followed by `field`; `None` past the root
///
/// # Errors
///
/// * `CycleDetected` - If parent pointers loop
pub fn hop_path(
    resolver: &dyn RecordResolver,
    record: &Record,
    steps: usize,
    field: &str,
) -> Result<Option<Vec<String>>> {
    let parent_field = parent_field_of(resolver, record);
    let tokens = relation_path(resolver, record, &parent_field)?;
    let Some(offset) = tokens.len().checked_sub(steps) else {
        return Ok(None);
    };
    let mut path = tokens[offset..].to_vec();
    path.push(field.to_string());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, RecordRef, RecordSchema};
    use crate::ops::Store;

    fn chain_store() -> Store {
        let mut store = Store::new();
        store.register_schema(
            RecordSchema::new("node")
                .field("name", FieldKind::Text)
                .with_parent("up"),
        );
        store.insert_record(Record::new("node", 1).with("name", "a")).unwrap();
        for key in 2..=4 {
            store
                .insert_record(
                    Record::new("node", key)
                        .with("name", format!("n{}", key))
                        .with("up", RecordRef::new("node", key - 1)),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_chain_and_relation_path_use_declared_parent_field() {
        let store = chain_store();
        let leaf = store.record("node", 4).unwrap();

        let keys = chain(&store, Some(leaf), "id", "up").unwrap();
        assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]);
        assert_eq!(relation_path(&store, leaf, "up").unwrap(), vec!["up"; 3]);
        assert!(chain(&store, None, "id", "up").unwrap().is_empty());
    }

    #[test]
    fn test_lookup_path_depth() {
        let store = chain_store();
        let leaf = store.record("node", 4).unwrap();

        assert_eq!(
            lookup_path(&store, leaf, 1, "name").unwrap(),
            Some(vec!["up".to_string(), "up".to_string(), "name".to_string()])
        );
        assert_eq!(lookup_path(&store, leaf, 3, "name").unwrap(), None);
    }

    #[test]
    fn test_hop_counts_start_at_the_record_itself() {
        let store = chain_store();
        let leaf = store.record("node", 4).unwrap();

        assert_eq!(ancestor_at(&store, leaf, 0).unwrap().map(|r| r.key), Some(4));
        assert_eq!(ancestor_at(&store, leaf, 3).unwrap().map(|r| r.key), Some(1));
        assert!(ancestor_at(&store, leaf, 4).unwrap().is_none());
        assert_eq!(hop_path(&store, leaf, 0, "name").unwrap(), Some(vec!["name".to_string()]));
        assert_eq!(hop_path(&store, leaf, 4, "name").unwrap(), None);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut store = chain_store();
        let mut root = store.record("node", 1).unwrap().clone();
        root.set("up", Value::Ref(RecordRef::new("node", 3)));
        store.insert_record(root).unwrap();

        let leaf = store.record("node", 4).unwrap();
        let err = cascader(&store, leaf).unwrap_err();
        assert!(matches!(err, ShapeError::CycleDetected { ref entity, .. } if entity == "node"));
    }
}
