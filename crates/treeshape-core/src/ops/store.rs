use std::collections::BTreeMap;

use super::collection::RecordSet;
use super::resolver::RecordResolver;
use super::writer::EntityWriter;
use crate::errors::{Result, ShapeError};
use crate::model::{RawData, Record, RecordRef, RecordSchema, Value};

/// Reserved dataset key carrying a record's status
pub const STATUS_KEY: &str = "_status";

/// In-memory store of schemas and records, keyed by entity then primary key
///
/// Single-threaded reference collaborator. Records are never removed; soft
/// deletion only flips their status.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) schemas: BTreeMap<String, RecordSchema>,
    pub(crate) tables: BTreeMap<String, BTreeMap<i64, Record>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the schema for an entity
    pub fn register_schema(&mut self, schema: RecordSchema) {
        self.tables.entry(schema.entity.clone()).or_default();
        self.schemas.insert(schema.entity.clone(), schema);
    }

    /// # Errors
    ///
    /// Returns `UnknownEntity` if no schema is registered.
    pub fn get_schema(&self, entity: &str) -> Result<&RecordSchema> {
        self.schemas
            .get(entity)
            .ok_or_else(|| ShapeError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Mutable schema access, e.g. to register handlers on a loaded dataset
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if no schema is registered.
    pub fn schema_mut(&mut self, entity: &str) -> Result<&mut RecordSchema> {
        self.schemas
            .get_mut(entity)
            .ok_or_else(|| ShapeError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Get a record by key, whatever its status
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` or `RecordNotFound`.
    pub fn get_record(&self, entity: &str, key: i64) -> Result<&Record> {
        self.get_schema(entity)?;
        self.record(entity, key)
            .ok_or_else(|| ShapeError::RecordNotFound {
                entity: entity.to_string(),
                key,
            })
    }

    pub(crate) fn get_record_mut(&mut self, entity: &str, key: i64) -> Result<&mut Record> {
        self.tables
            .get_mut(entity)
            .and_then(|table| table.get_mut(&key))
            .ok_or_else(|| ShapeError::RecordNotFound {
                entity: entity.to_string(),
                key,
            })
    }

    pub fn record(&self, entity: &str, key: i64) -> Option<&Record> {
        self.tables.get(entity).and_then(|table| table.get(&key))
    }

    /// Insert a record, replacing any record with the same key
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if the record's entity has no schema.
    pub fn insert_record(&mut self, record: Record) -> Result<()> {
        self.get_schema(&record.entity)?;
        self.tables
            .entry(record.entity.clone())
            .or_default()
            .insert(record.key, record);
        Ok(())
    }

    /// Active records of an entity in key order
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if no schema is registered.
    pub fn collection(&self, entity: &str) -> Result<RecordSet<'_>> {
        self.get_schema(entity)?;
        let keys = self
            .table(entity)
            .filter(|r| r.is_active())
            .map(|r| r.key)
            .collect();
        Ok(RecordSet::new(self, entity, keys))
    }

    /// Every record of an entity, soft-deleted ones included
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if no schema is registered.
    pub fn unfiltered_collection(&self, entity: &str) -> Result<RecordSet<'_>> {
        self.get_schema(entity)?;
        let keys = self.table(entity).map(|r| r.key).collect();
        Ok(RecordSet::new(self, entity, keys))
    }

    fn table(&self, entity: &str) -> impl Iterator<Item = &Record> {
        self.tables.get(entity).into_iter().flat_map(|t| t.values())
    }

    /// Storage writer bound to one entity
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` if no schema is registered.
    pub fn writer(&mut self, entity: &str) -> Result<EntityWriter<'_>> {
        self.get_schema(entity)?;
        Ok(EntityWriter::new(self, entity))
    }

    /// Run `f` against a copy of the store and commit only if it succeeds
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns; the store is left untouched in that case.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<T>,
    {
        let mut working = self.clone();
        let out = f(&mut working)?;
        *self = working;
        Ok(out)
    }

    /// Decode raw submitted data into attribute values
    ///
    /// The primary key and the reserved status key are skipped.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for undeclared names and `InvalidValue` for
    /// values that do not fit the field's kind.
    pub fn decode(&self, entity: &str, data: &RawData) -> Result<BTreeMap<String, Value>> {
        let schema = self.get_schema(entity)?;
        let mut attrs = BTreeMap::new();
        for (name, raw) in data {
            if schema.is_primary_key(name) || name == STATUS_KEY {
                continue;
            }
            let kind = schema
                .kind_of(name)
                .ok_or_else(|| ShapeError::UnknownField {
                    entity: entity.to_string(),
                    field: name.clone(),
                })?;
            let value = kind.decode(raw).map_err(|reason| ShapeError::InvalidValue {
                entity: entity.to_string(),
                field: name.clone(),
                reason,
            })?;
            attrs.insert(name.clone(), value);
        }
        Ok(attrs)
    }

    /// Next free primary key for an entity
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` on the primary key once the largest key is
    /// `i64::MAX`.
    pub fn next_key(&self, entity: &str) -> Result<i64> {
        let Some(last) = self.tables.get(entity).and_then(|t| t.keys().next_back()) else {
            return Ok(1);
        };
        match last.checked_add(1) {
            Some(key) => Ok(key.max(1)),
            None => Err(ShapeError::InvalidValue {
                entity: entity.to_string(),
                field: self.get_schema(entity)?.primary_key.clone(),
                reason: "primary key space exhausted".to_string(),
            }),
        }
    }
}

impl RecordResolver for Store {
    fn schema(&self, entity: &str) -> Option<&RecordSchema> {
        self.schemas.get(entity)
    }

    fn resolve(&self, reference: &RecordRef) -> Option<&Record> {
        self.record(&reference.entity, reference.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use crate::ops::QueryableCollection;
    use serde_json::json;

    fn store() -> Store {
        let mut store = Store::new();
        store.register_schema(RecordSchema::new("tag").field("name", FieldKind::Text));
        store
    }

    #[test]
    fn test_collection_excludes_soft_deleted() {
        let mut store = store();
        store.insert_record(Record::new("tag", 1).with("name", "a")).unwrap();
        let mut gone = Record::new("tag", 2).with("name", "b");
        gone.status = crate::model::Status::SoftDeleted;
        store.insert_record(gone).unwrap();

        assert_eq!(store.collection("tag").unwrap().count(), 1);
        assert_eq!(store.unfiltered_collection("tag").unwrap().count(), 2);
        assert_eq!(store.next_key("tag").unwrap(), 3);
    }

    #[test]
    fn test_unknown_entity_errors() {
        let store = store();
        assert!(matches!(
            store.collection("nope"),
            Err(ShapeError::UnknownEntity { .. })
        ));
        assert!(matches!(
            store.get_record("tag", 9),
            Err(ShapeError::RecordNotFound { key: 9, .. })
        ));
    }

    #[test]
    fn test_decode_reports_field_errors() {
        let store = store();
        let data = json!({"id": 4, "color": "red"});
        let err = store.decode("tag", data.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ShapeError::UnknownField { ref field, .. } if field == "color"));

        let data = json!({"name": [1, 2]});
        let err = store.decode("tag", data.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidValue { .. }));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut store = store();
        let result: Result<()> = store.transaction(|tx| {
            tx.insert_record(Record::new("tag", 1))?;
            Err(ShapeError::configuration("test", "abort"))
        });

        assert!(result.is_err());
        assert!(store.record("tag", 1).is_none());

        store
            .transaction(|tx| tx.insert_record(Record::new("tag", 1)))
            .unwrap();
        assert!(store.record("tag", 1).is_some());
    }
}
