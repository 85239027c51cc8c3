use serde::{Deserialize, Serialize};

use super::fields::{FieldOrigin, ProjectedField, Projection};
use crate::errors::Result;
use crate::model::{Record, Value};
use crate::ops::RecordResolver;
use crate::shape::Representation;
use crate::traversal::ancestors::{
    ancestor_at, cascader_of, chain, hop_path, parent_field_of, primary_key_of,
};
use crate::traversal::path::{field_value, resolve_record};

/// Replace a projected field with the breadcrumb chain above its anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascaderSpec {
    pub name: String,
    /// Ancestor field to collect; the primary key when unset
    #[serde(default)]
    pub field: Option<String>,
}

impl CascaderSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
        }
    }

    pub fn collecting(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Replace a projected field with one ancestor of its anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveSpec {
    pub name: String,
    /// Steps above the nearest parent; `0` is the parent itself
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub field: Option<String>,
}

impl RecursiveSpec {
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            depth,
            field: None,
        }
    }

    pub fn collecting(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Record an ancestor walk starts from for a decorated field
#[derive(Debug, Clone)]
pub struct Anchor<'r> {
    pub record: &'r Record,
    /// Relation hops leading from the decorated record to `record`
    pub hops: Vec<String>,
    /// Reached through a reference; the referenced record then heads its
    /// own chain instead of standing in for the decorated record
    pub referenced: bool,
}

impl<'r> Anchor<'r> {
    /// Parent hops from the anchor to the ancestor at `depth`
    fn steps(&self, depth: usize) -> usize {
        if self.referenced {
            depth
        } else {
            depth + 1
        }
    }

    /// Root-first breadcrumb of `field` values ending at the nearest parent
    ///
    /// # Errors
    ///
    /// * `CycleDetected` - If parent pointers loop
    pub fn chain(&self, resolver: &dyn RecordResolver, field: &str) -> Result<Vec<Value>> {
        if self.referenced {
            let parent_field = parent_field_of(resolver, self.record);
            chain(resolver, Some(self.record), field, &parent_field)
        } else {
            cascader_of(resolver, self.record, field)
        }
    }

    /// The ancestor at `depth`, where `0` is the nearest parent
    ///
    /// # Errors
    ///
    /// * `CycleDetected` - If parent pointers loop
    pub fn ancestor(
        &self,
        resolver: &'r dyn RecordResolver,
        depth: usize,
    ) -> Result<Option<&'r Record>> {
        ancestor_at(resolver, self.record, self.steps(depth))
    }

    /// Path from the decorated record to `field` on the ancestor at `depth`
    ///
    /// # Errors
    ///
    /// * `CycleDetected` - If parent pointers loop
    pub fn lookup_path(
        &self,
        resolver: &dyn RecordResolver,
        depth: usize,
        field: &str,
    ) -> Result<Option<Vec<String>>> {
        let Some(tail) = hop_path(resolver, self.record, self.steps(depth), field)? else {
            return Ok(None);
        };
        let mut path = self.hops.clone();
        path.extend(tail);
        Ok(Some(path))
    }
}

/// Resolve the anchor of a decorated field
///
/// The record itself for its primary key and for computed fields, the
/// holder for paths ending at a related primary key, the referenced record
/// for relations and paths ending in a reference.
pub fn resolve_anchor<'r>(
    resolver: &'r dyn RecordResolver,
    record: &'r Record,
    field: &ProjectedField,
) -> Option<Anchor<'r>> {
    if matches!(field.origin, FieldOrigin::Computed(_)) {
        return Some(Anchor {
            record,
            hops: Vec::new(),
            referenced: false,
        });
    }

    let segments = field.source_path();
    let (last, hops) = segments.split_last()?;
    let holder = resolve_record(resolver, record, hops)?;

    if primary_key_of(resolver, holder) == *last {
        return Some(Anchor {
            record: holder,
            hops: hops.to_vec(),
            referenced: false,
        });
    }

    let target = holder
        .get(last)
        .and_then(|v| v.as_record_ref())
        .and_then(|r| resolver.resolve(r))?;
    Some(Anchor {
        record: target,
        hops: segments.clone(),
        referenced: true,
    })
}

/// Apply cascader and recursive decorations to a rendered record
///
/// Only fields present in the projection are touched. A cascader without an
/// anchor renders `[]`; a recursive field without an ancestor renders null.
///
/// # Errors
///
/// * `CycleDetected` - If an anchor's parent pointers loop
pub fn apply_ancestry(
    resolver: &dyn RecordResolver,
    record: &Record,
    projection: &Projection,
    cascaders: &[CascaderSpec],
    recursives: &[RecursiveSpec],
    out: &mut Representation,
) -> Result<()> {
    for spec in cascaders {
        let Some(field) = projection.get(&spec.name) else {
            continue;
        };
        let chain = match resolve_anchor(resolver, record, field) {
            Some(anchor) => {
                let collect = spec
                    .field
                    .clone()
                    .unwrap_or_else(|| primary_key_of(resolver, anchor.record));
                anchor.chain(resolver, &collect)?
            }
            None => Vec::new(),
        };
        out.insert(
            spec.name.clone(),
            serde_json::Value::Array(chain.iter().map(|v| v.to_json()).collect()),
        );
    }

    for spec in recursives {
        let Some(field) = projection.get(&spec.name) else {
            continue;
        };
        let value = match resolve_anchor(resolver, record, field) {
            Some(anchor) => match anchor.ancestor(resolver, spec.depth)? {
                Some(ancestor) => {
                    let collect = spec
                        .field
                        .clone()
                        .unwrap_or_else(|| primary_key_of(resolver, ancestor));
                    field_value(resolver, ancestor, &collect).to_json()
                }
                None => serde_json::Value::Null,
            },
            None => serde_json::Value::Null,
        };
        out.insert(spec.name.clone(), value);
    }

    Ok(())
}
