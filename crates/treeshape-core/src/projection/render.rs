use super::fields::{FieldOrigin, Projection};
use crate::model::{FieldKind, Record, Value};
use crate::ops::RecordResolver;
use crate::shape::Representation;
use crate::traversal::path::{field_value, resolve_segments};

/// Render the projected fields of one record, in projection order
///
/// With `nest`, relation base fields render as an object of the referenced
/// record's base fields (one level deep) instead of the bare key.
pub fn render_fields(
    resolver: &dyn RecordResolver,
    record: &Record,
    projection: &Projection,
    nest: bool,
) -> Representation {
    let mut out = Representation::new();
    for field in projection.fields() {
        let value = match &field.origin {
            FieldOrigin::Base(FieldKind::Relation { .. }) if nest => {
                render_nested(resolver, &field_value(resolver, record, &field.name))
            }
            FieldOrigin::Base(_) => field_value(resolver, record, &field.name).to_json(),
            FieldOrigin::Declared { source, value_type } => {
                value_type.coerce(&resolve_segments(resolver, record, source))
            }
            FieldOrigin::Computed(f) => f.call(resolver, record),
        };
        out.insert(field.name.clone(), value);
    }
    out
}

fn render_nested(resolver: &dyn RecordResolver, value: &Value) -> serde_json::Value {
    let Some(target) = value.as_record_ref().and_then(|r| resolver.resolve(r)) else {
        return value.to_json();
    };
    let Some(schema) = resolver.schema(&target.entity) else {
        return value.to_json();
    };

    let mut nested = Representation::new();
    for def in schema.base_fields() {
        nested.insert(
            def.name.clone(),
            field_value(resolver, target, &def.name).to_json(),
        );
    }
    serde_json::Value::Object(nested)
}
