use crate::model::{Record, Value, DEFAULT_PRIMARY_KEY};
use crate::ops::RecordResolver;

/// Split a dotted source path into segments
pub fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// Value of one field on a record; the primary key reads from `record.key`
pub fn field_value(resolver: &dyn RecordResolver, record: &Record, name: &str) -> Value {
    let is_pk = resolver
        .schema(&record.entity)
        .map(|s| s.is_primary_key(name))
        .unwrap_or(name == DEFAULT_PRIMARY_KEY);
    if is_pk {
        Value::Int(record.key)
    } else {
        record.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// Follow every segment as a foreign hop; `None` on a null or dangling hop
pub fn resolve_record<'r>(
    resolver: &'r dyn RecordResolver,
    record: &'r Record,
    segments: &[String],
) -> Option<&'r Record> {
    let mut current = record;
    for segment in segments {
        let reference = current.get(segment)?.as_record_ref()?;
        current = resolver.resolve(reference)?;
    }
    Some(current)
}

/// Resolve a segment path to a value
///
/// Never fails: unknown fields, non-relation hops, null and dangling
/// references all resolve to `Value::Null`.
pub fn resolve_segments(
    resolver: &dyn RecordResolver,
    record: &Record,
    segments: &[String],
) -> Value {
    let Some((last, hops)) = segments.split_last() else {
        return Value::Null;
    };
    match resolve_record(resolver, record, hops) {
        Some(target) => field_value(resolver, target, last),
        None => Value::Null,
    }
}

/// Resolve a dotted path (`category.parent.label`) to a value
pub fn resolve_path(resolver: &dyn RecordResolver, record: &Record, path: &str) -> Value {
    resolve_segments(resolver, record, &split_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, RecordRef, RecordSchema};
    use crate::ops::Store;

    fn store() -> Store {
        let mut store = Store::new();
        store.register_schema(
            RecordSchema::new("category")
                .field("label", FieldKind::Text)
                .with_parent("parent"),
        );
        store
            .insert_record(Record::new("category", 1).with("label", "Root"))
            .unwrap();
        store
            .insert_record(
                Record::new("category", 2)
                    .with("label", "Child")
                    .with("parent", RecordRef::new("category", 1)),
            )
            .unwrap();
        store
            .insert_record(
                Record::new("category", 3).with("parent", RecordRef::new("category", 99)),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_resolve_through_parent() {
        let store = store();
        let child = store.record("category", 2).unwrap();
        assert_eq!(
            resolve_path(&store, child, "parent.label"),
            Value::from("Root")
        );
        assert_eq!(resolve_path(&store, child, "parent.id"), Value::Int(1));
        assert_eq!(resolve_path(&store, child, "id"), Value::Int(2));
    }

    #[test]
    fn test_malformed_paths_resolve_to_null() {
        let store = store();
        let child = store.record("category", 2).unwrap();
        let dangling = store.record("category", 3).unwrap();

        assert_eq!(resolve_path(&store, child, "label.parent"), Value::Null);
        assert_eq!(resolve_path(&store, child, "nope.deeper"), Value::Null);
        assert_eq!(resolve_path(&store, child, ""), Value::Null);
        assert_eq!(resolve_path(&store, dangling, "parent.label"), Value::Null);
    }
}
