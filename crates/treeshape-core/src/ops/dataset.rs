use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::store::{Store, STATUS_KEY};
use crate::errors::{Result, ShapeError};
use crate::model::{RawData, Record, RecordSchema, Status};

/// Serialized form of a [`Store`]
///
/// ```json
/// { "schemas": [ {"entity": "category", "fields": [...]} ],
///   "records": { "category": [ {"id": 1, "label": "Root"} ] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub schemas: Vec<RecordSchema>,
    #[serde(default)]
    pub records: BTreeMap<String, Vec<RawData>>,
}

impl Dataset {
    /// # Errors
    ///
    /// Returns `Serialization` on malformed JSON.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Store {
    /// Build a store from a dataset; every row needs an integer primary key
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntity` for rows of unregistered entities and
    /// `InvalidValue`/`UnknownField` for rows that do not decode.
    pub fn from_dataset(dataset: &Dataset) -> Result<Store> {
        let mut store = Store::new();
        for schema in &dataset.schemas {
            store.register_schema(schema.clone());
        }

        for (entity, rows) in &dataset.records {
            let pk = store.get_schema(entity)?.primary_key.clone();
            for row in rows {
                let key = row.get(&pk).and_then(|v| v.as_i64()).ok_or_else(|| {
                    ShapeError::InvalidValue {
                        entity: entity.clone(),
                        field: pk.clone(),
                        reason: "dataset rows need an integer primary key".to_string(),
                    }
                })?;
                let status = match row.get(STATUS_KEY) {
                    Some(raw) => serde_json::from_value::<Status>(raw.clone()).map_err(|e| {
                        ShapeError::InvalidValue {
                            entity: entity.clone(),
                            field: STATUS_KEY.to_string(),
                            reason: e.to_string(),
                        }
                    })?,
                    None => Status::Active,
                };

                let mut record = Record::new(entity.clone(), key);
                record.status = status;
                record.attrs = store.decode(entity, row)?;
                store.insert_record(record)?;
            }
        }
        Ok(store)
    }

    /// Snapshot the store; rows carry declared fields in schema order
    pub fn to_dataset(&self) -> Dataset {
        let schemas = self.schemas.values().cloned().collect();
        let mut records = BTreeMap::new();

        for (entity, schema) in &self.schemas {
            let rows = self
                .tables
                .get(entity)
                .into_iter()
                .flat_map(|t| t.values())
                .map(|record| {
                    let mut row = RawData::new();
                    row.insert(schema.primary_key.clone(), record.key.into());
                    for def in schema.base_fields().iter().skip(1) {
                        if let Some(value) = record.get(&def.name) {
                            row.insert(def.name.clone(), value.to_json());
                        }
                    }
                    for (name, value) in &record.attrs {
                        if !row.contains_key(name) {
                            row.insert(name.clone(), value.to_json());
                        }
                    }
                    if record.status == Status::SoftDeleted {
                        row.insert(
                            STATUS_KEY.to_string(),
                            serde_json::Value::String("soft_deleted".to_string()),
                        );
                    }
                    row
                })
                .collect::<Vec<_>>();
            records.insert(entity.clone(), rows);
        }

        Dataset { schemas, records }
    }
}
