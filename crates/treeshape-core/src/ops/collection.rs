use chrono::NaiveDate;
use std::cmp::Ordering;

use super::resolver::RecordResolver;
use super::store::Store;
use crate::model::{FieldKind, Record, RecordRef, Value};
use crate::query::expr::{Lookup, LookupModifier, OrderKey, QueryRejected};
use crate::traversal::path::resolve_segments;

/// Already-materialized, queryable collection of records of one entity
///
/// `filter` and `order_by` return a new collection and leave `self` usable,
/// so a caller can fall back to the input when an expression is rejected.
pub trait QueryableCollection: Sized {
    fn entity(&self) -> &str;

    /// # Errors
    ///
    /// Returns `QueryRejected` when the path or value cannot be evaluated.
    fn filter(&self, lookup: &Lookup) -> Result<Self, QueryRejected>;

    /// Single multi-key ordering; earlier keys take precedence
    ///
    /// # Errors
    ///
    /// Returns `QueryRejected` when a key path cannot be evaluated.
    fn order_by(&self, keys: &[OrderKey]) -> Result<Self, QueryRejected>;

    fn first(&self) -> Option<&Record>;

    fn count(&self) -> usize;

    fn slice(&self, offset: usize, count: usize) -> Self;

    fn records(&self) -> Vec<&Record>;

    fn resolver(&self) -> &dyn RecordResolver;
}

/// Key-list view over one entity table of an in-memory [`Store`]
#[derive(Debug, Clone)]
pub struct RecordSet<'s> {
    store: &'s Store,
    entity: String,
    keys: Vec<i64>,
}

impl<'s> RecordSet<'s> {
    pub(crate) fn new(store: &'s Store, entity: impl Into<String>, keys: Vec<i64>) -> Self {
        Self {
            store,
            entity: entity.into(),
            keys,
        }
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    fn with_keys(&self, keys: Vec<i64>) -> Self {
        Self {
            store: self.store,
            entity: self.entity.clone(),
            keys,
        }
    }

    fn get(&self, key: i64) -> Option<&'s Record> {
        self.store.record(&self.entity, key)
    }

    /// Walk the path through schemas and return the kind of its final field
    fn validate_path(&self, path: &[String]) -> Result<FieldKind, String> {
        if path.is_empty() {
            return Err("empty path".to_string());
        }
        let mut entity = self.entity.clone();
        for (i, segment) in path.iter().enumerate() {
            let schema = self
                .store
                .schema(&entity)
                .ok_or_else(|| format!("unknown entity `{}`", entity))?;
            let kind = schema
                .kind_of(segment)
                .ok_or_else(|| format!("`{}` is not a field of {}", segment, entity))?;
            if i + 1 == path.len() {
                return Ok(kind);
            }
            match kind {
                FieldKind::Relation { entity: target } => entity = target,
                _ => return Err(format!("`{}` on {} is not a relation", segment, entity)),
            }
        }
        Err("empty path".to_string())
    }

    fn value_at(&self, record: &Record, path: &[String]) -> Value {
        resolve_segments(self.store, record, path)
    }
}

enum Matcher {
    Equals(Value),
    Contains(String),
    OnDate(NaiveDate),
}

impl Matcher {
    fn build(kind: &FieldKind, lookup: &Lookup) -> Result<Self, String> {
        let raw = lookup.value.trim();
        match lookup.modifier {
            LookupModifier::IContains => Ok(Matcher::Contains(lookup.value.to_lowercase())),
            LookupModifier::Date => {
                if *kind != FieldKind::DateTime {
                    return Err("date lookup on a non-datetime field".to_string());
                }
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(Matcher::OnDate)
                    .map_err(|_| format!("`{}` is not a YYYY-MM-DD date", raw))
            }
            LookupModifier::Exact => {
                let bad = || format!("`{}` does not match field kind {:?}", raw, kind);
                let target = match kind {
                    FieldKind::Int => Value::Int(raw.parse().map_err(|_| bad())?),
                    FieldKind::Float => Value::Float(raw.parse().map_err(|_| bad())?),
                    FieldKind::Bool => Value::Bool(Value::from(raw).as_bool().ok_or_else(bad)?),
                    FieldKind::Text => Value::Text(lookup.value.clone()),
                    FieldKind::DateTime => Value::DateTime(
                        crate::model::schema::parse_datetime(raw).ok_or_else(bad)?,
                    ),
                    FieldKind::Relation { entity } => {
                        Value::Ref(RecordRef::new(entity.clone(), raw.parse().map_err(|_| bad())?))
                    }
                };
                Ok(Matcher::Equals(target))
            }
        }
    }

    fn matches(&self, candidate: &Value) -> bool {
        match self {
            Matcher::Equals(target) => {
                !candidate.is_null() && candidate.sort_cmp(target) == Ordering::Equal
            }
            Matcher::Contains(needle) => candidate
                .display_text()
                .map(|text| text.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            Matcher::OnDate(date) => match candidate {
                Value::DateTime(dt) => dt.date_naive() == *date,
                _ => false,
            },
        }
    }
}

impl<'s> QueryableCollection for RecordSet<'s> {
    fn entity(&self) -> &str {
        &self.entity
    }

    fn filter(&self, lookup: &Lookup) -> Result<Self, QueryRejected> {
        let kind = self
            .validate_path(&lookup.path)
            .map_err(|reason| QueryRejected::new(lookup, reason))?;
        let matcher =
            Matcher::build(&kind, lookup).map_err(|reason| QueryRejected::new(lookup, reason))?;

        let keys = self
            .keys
            .iter()
            .copied()
            .filter(|key| {
                self.get(*key)
                    .map(|record| matcher.matches(&self.value_at(record, &lookup.path)))
                    .unwrap_or(false)
            })
            .collect();
        Ok(self.with_keys(keys))
    }

    fn order_by(&self, keys: &[OrderKey]) -> Result<Self, QueryRejected> {
        for key in keys {
            self.validate_path(&key.path)
                .map_err(|reason| QueryRejected::new(key, reason))?;
        }

        let mut rows: Vec<(i64, Vec<Value>)> = self
            .keys
            .iter()
            .filter_map(|k| self.get(*k))
            .map(|record| {
                let values = keys
                    .iter()
                    .map(|key| self.value_at(record, &key.path))
                    .collect();
                (record.key, values)
            })
            .collect();

        // Stable: ties keep their current relative order
        rows.sort_by(|(_, a), (_, b)| {
            for (i, key) in keys.iter().enumerate() {
                let ord = a[i].sort_cmp(&b[i]);
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(self.with_keys(rows.into_iter().map(|(k, _)| k).collect()))
    }

    fn first(&self) -> Option<&Record> {
        self.keys.first().and_then(|k| self.get(*k))
    }

    fn count(&self) -> usize {
        self.keys.len()
    }

    fn slice(&self, offset: usize, count: usize) -> Self {
        let keys = self.keys.iter().skip(offset).take(count).copied().collect();
        self.with_keys(keys)
    }

    fn records(&self) -> Vec<&Record> {
        self.keys.iter().filter_map(|k| self.get(*k)).collect()
    }

    fn resolver(&self) -> &dyn RecordResolver {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordSchema;

    fn store() -> Store {
        let mut store = Store::new();
        store.register_schema(
            RecordSchema::new("category")
                .field("label", FieldKind::Text)
                .field("rank", FieldKind::Int)
                .with_parent("parent"),
        );
        let rows = [(1, "Root", 3, None), (2, "Shoes", 1, Some(1)), (3, "Boots", 2, Some(2))];
        for (key, label, rank, parent) in rows {
            let mut record = Record::new("category", key)
                .with("label", label)
                .with("rank", rank as i64);
            if let Some(p) = parent {
                record = record.with("parent", RecordRef::new("category", p));
            }
            store.insert_record(record).unwrap();
        }
        store
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_filter_icontains_through_parent() {
        let store = store();
        let set = store.collection("category").unwrap();
        let lookup = Lookup::new(path(&["parent", "label"]), LookupModifier::IContains, "sho");

        let filtered = set.filter(&lookup).unwrap();
        assert_eq!(filtered.keys(), &[3]);
    }

    #[test]
    fn test_filter_rejects_unknown_path_and_bad_number() {
        let store = store();
        let set = store.collection("category").unwrap();

        let unknown = Lookup::new(path(&["nope"]), LookupModifier::Exact, "1");
        assert!(set.filter(&unknown).is_err());

        let bad = Lookup::new(path(&["rank"]), LookupModifier::Exact, "abc");
        assert!(set.filter(&bad).is_err());

        let through_text = Lookup::new(path(&["label", "id"]), LookupModifier::Exact, "1");
        assert!(set.filter(&through_text).is_err());
    }

    #[test]
    fn test_order_by_multi_key_is_stable() {
        let store = store();
        let set = store.collection("category").unwrap();

        let sorted = set.order_by(&[OrderKey::asc(path(&["rank"]))]).unwrap();
        assert_eq!(sorted.keys(), &[2, 3, 1]);

        // Root has no parent; nulls come first when descending
        let sorted = set
            .order_by(&[OrderKey::desc(path(&["parent", "id"]))])
            .unwrap();
        assert_eq!(sorted.keys(), &[1, 3, 2]);
    }

    #[test]
    fn test_slice_and_first() {
        let store = store();
        let set = store.collection("category").unwrap();
        let page = set.slice(1, 5);
        assert_eq!(page.count(), 2);
        assert_eq!(page.first().map(|r| r.key), Some(2));
    }
}
