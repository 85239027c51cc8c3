use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::{Result, ShapeError};
use crate::model::{FieldKind, Record, RecordSchema, ValueType};
use crate::ops::RecordResolver;
use crate::traversal::split_path;

type ComputeFnInner = dyn Fn(&dyn RecordResolver, &Record) -> serde_json::Value + Send + Sync;

/// Function backing a computed field
#[derive(Clone)]
pub struct ComputeFn(Arc<ComputeFnInner>);

impl ComputeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn RecordResolver, &Record) -> serde_json::Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, resolver: &dyn RecordResolver, record: &Record) -> serde_json::Value {
        (self.0)(resolver, record)
    }
}

impl std::fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ComputeFn(..)")
    }
}

/// Where a declared field's value comes from
#[derive(Debug, Clone)]
pub enum FieldSource {
    /// Dotted path, possibly through foreign hops
    Path(String),
    Computed(ComputeFn),
}

/// An extra output field declared on top of the schema's base fields
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub source: FieldSource,
    pub value_type: Option<ValueType>,
    pub read_only: bool,
}

impl FieldSpec {
    /// Named field sourced from a dotted path
    pub fn path(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FieldSource::Path(source.into()),
            value_type: None,
            read_only: true,
        }
    }

    /// Field named after its dotted path, with `.` replaced by `_`
    pub fn dotted(source: impl Into<String>) -> Self {
        let source = source.into();
        Self::path(source.replace('.', "_"), source)
    }

    pub fn computed<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn RecordResolver, &Record) -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: FieldSource::Computed(ComputeFn::new(f)),
            value_type: None,
            read_only: true,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Explicit type, else `int` when the path ends at a primary key, else `str`
    pub fn resolved_type(&self, resolver: &dyn RecordResolver, schema: &RecordSchema) -> ValueType {
        if let Some(t) = self.value_type {
            return t;
        }
        match &self.source {
            FieldSource::Path(path) if ends_at_primary_key(resolver, schema, &split_path(path)) => {
                ValueType::Int
            }
            _ => ValueType::Str,
        }
    }
}

/// Follow relation hops through schemas and test the final segment
fn ends_at_primary_key(
    resolver: &dyn RecordResolver,
    schema: &RecordSchema,
    segments: &[String],
) -> bool {
    let Some((last, hops)) = segments.split_last() else {
        return false;
    };
    let mut current = schema;
    for hop in hops {
        let next = current
            .kind_of(hop)
            .and_then(|k| k.relation_target().map(str::to_string))
            .and_then(|entity| resolver.schema(&entity));
        match next {
            Some(s) => current = s,
            None => return false,
        }
    }
    current.is_primary_key(last)
}

/// How a projected field produces its value
#[derive(Debug, Clone)]
pub enum FieldOrigin {
    Base(FieldKind),
    Declared {
        source: Vec<String>,
        value_type: ValueType,
    },
    Computed(ComputeFn),
}

#[derive(Debug, Clone)]
pub struct ProjectedField {
    pub name: String,
    pub origin: FieldOrigin,
    pub read_only: bool,
}

impl ProjectedField {
    pub fn is_computed(&self) -> bool {
        matches!(self.origin, FieldOrigin::Computed(_))
    }

    /// Source segments; empty for computed fields
    pub fn source_path(&self) -> Vec<String> {
        match &self.origin {
            FieldOrigin::Base(_) => vec![self.name.clone()],
            FieldOrigin::Declared { source, .. } => source.clone(),
            FieldOrigin::Computed(_) => Vec::new(),
        }
    }
}

/// Ordered output field set: base fields in schema order, then declared fields
#[derive(Debug, Clone)]
pub struct Projection {
    entity: String,
    fields: Vec<ProjectedField>,
}

impl Projection {
    /// Build the projection for `schema`
    ///
    /// Allow/deny names that match no field are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for empty or duplicate field names and empty
    /// path sources.
    pub fn build(
        resolver: &dyn RecordResolver,
        schema: &RecordSchema,
        specs: &[FieldSpec],
        allow: Option<&[String]>,
        deny: &[String],
    ) -> Result<Self> {
        let base = schema.base_fields();
        let mut seen: BTreeSet<&str> = base.iter().map(|f| f.name.as_str()).collect();

        for spec in specs {
            if spec.name.is_empty() {
                return Err(ShapeError::configuration(
                    "field_specs",
                    "field name must not be empty",
                ));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ShapeError::configuration(
                    spec.name.clone(),
                    "duplicate field name",
                ));
            }
            if let FieldSource::Path(path) = &spec.source {
                if path.trim().is_empty() {
                    return Err(ShapeError::configuration(
                        spec.name.clone(),
                        "source path must not be empty",
                    ));
                }
            }
        }

        for name in allow.into_iter().flatten().chain(deny.iter()) {
            if !seen.contains(name.as_str()) {
                tracing::debug!(
                    entity = %schema.entity,
                    field = %name,
                    "ignoring allow/deny name that matches no field"
                );
            }
        }

        let keep = |name: &str| {
            allow.map_or(true, |a| a.iter().any(|n| n == name)) && !deny.iter().any(|n| n == name)
        };

        let mut fields: Vec<ProjectedField> = base
            .into_iter()
            .filter(|f| keep(&f.name))
            .map(|f| ProjectedField {
                read_only: schema.is_primary_key(&f.name),
                name: f.name,
                origin: FieldOrigin::Base(f.kind),
            })
            .collect();

        fields.extend(specs.iter().filter(|s| keep(&s.name)).map(|spec| {
            let origin = match &spec.source {
                FieldSource::Path(path) => FieldOrigin::Declared {
                    source: split_path(path),
                    value_type: spec.resolved_type(resolver, schema),
                },
                FieldSource::Computed(f) => FieldOrigin::Computed(f.clone()),
            };
            ProjectedField {
                name: spec.name.clone(),
                origin,
                read_only: spec.read_only,
            }
        }));

        Ok(Self {
            entity: schema.entity.clone(),
            fields,
        })
    }

    /// Narrow to an ad-hoc allow-list, keeping the current order
    pub fn restrict(&self, allow: &[String]) -> Projection {
        Projection {
            entity: self.entity.clone(),
            fields: self
                .fields
                .iter()
                .filter(|f| allow.iter().any(|n| *n == f.name))
                .cloned()
                .collect(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn fields(&self) -> &[ProjectedField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&ProjectedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Store;

    fn store() -> Store {
        let mut store = Store::new();
        store.register_schema(
            RecordSchema::new("category")
                .field("label", FieldKind::Text)
                .with_parent("parent"),
        );
        store.register_schema(
            RecordSchema::new("product")
                .field("a", FieldKind::Text)
                .field("b", FieldKind::Int)
                .field("category", FieldKind::Relation {
                    entity: "category".to_string(),
                }),
        );
        store
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_order_ignores_allow_list_order() {
        let store = store();
        let schema = store.get_schema("product").unwrap();
        let specs = vec![
            FieldSpec::path("c", "category.label"),
            FieldSpec::path("d", "category.parent.id"),
        ];
        let allow = names(&["d", "c", "b", "a", "ghost"]);

        let projection =
            Projection::build(&store, schema, &specs, Some(allow.as_slice()), &[]).unwrap();
        assert_eq!(projection.names(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_default_type_follows_primary_key() {
        let store = store();
        let schema = store.get_schema("product").unwrap();

        assert_eq!(
            FieldSpec::path("d", "category.parent.id").resolved_type(&store, schema),
            ValueType::Int
        );
        assert_eq!(
            FieldSpec::dotted("category.label").resolved_type(&store, schema),
            ValueType::Str
        );
        assert_eq!(FieldSpec::dotted("category.label").name, "category_label");
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let store = store();
        let schema = store.get_schema("product").unwrap();
        let specs = vec![FieldSpec::path("a", "category.label")];

        let err = Projection::build(&store, schema, &specs, None, &[]).unwrap_err();
        assert_eq!(err, ShapeError::configuration("a", "duplicate field name"));
    }

    #[test]
    fn test_deny_and_restrict() {
        let store = store();
        let schema = store.get_schema("product").unwrap();
        let projection =
            Projection::build(&store, schema, &[], None, &names(&["b", "nope"])).unwrap();
        assert_eq!(projection.names(), vec!["id", "a", "category"]);

        let narrowed = projection.restrict(&names(&["category", "id"]));
        assert_eq!(narrowed.names(), vec!["id", "category"]);
    }
}
