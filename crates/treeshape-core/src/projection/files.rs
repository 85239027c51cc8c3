use serde::{Deserialize, Serialize};

use super::fields::Projection;
use crate::model::Record;
use crate::ops::RecordResolver;
use crate::shape::Representation;
use crate::traversal::path::{field_value, resolve_record, split_path};

pub const DEFAULT_URL_FIELD: &str = "file";

fn default_url_field() -> String {
    DEFAULT_URL_FIELD.to_string()
}

/// Output field rendered as `{url, id}` of a referenced file record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub name: String,
    /// Dotted reference path; the field name when unset
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default = "default_url_field")]
    pub url_field: String,
}

impl FileSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            url_field: default_url_field(),
        }
    }

    pub fn through(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_url_field(mut self, url_field: impl Into<String>) -> Self {
        self.url_field = url_field.into();
        self
    }

    fn reference_path(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }
}

/// `{url, id}` for the referenced record, or null when it does not resolve
pub fn format_file(
    resolver: &dyn RecordResolver,
    record: &Record,
    spec: &FileSpec,
) -> serde_json::Value {
    let segments = split_path(spec.reference_path());
    match resolve_record(resolver, record, &segments) {
        Some(target) => serde_json::json!({
            "url": field_value(resolver, target, &spec.url_field).to_json(),
            "id": target.key,
        }),
        None => serde_json::Value::Null,
    }
}

/// Format every file field present in the projection
pub fn apply_files(
    resolver: &dyn RecordResolver,
    record: &Record,
    projection: &Projection,
    specs: &[FileSpec],
    out: &mut Representation,
) {
    for spec in specs.iter().filter(|s| projection.contains(&s.name)) {
        out.insert(spec.name.clone(), format_file(resolver, record, spec));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, RecordRef, RecordSchema};
    use crate::ops::Store;
    use serde_json::json;

    #[test]
    fn test_format_file_direct_and_missing() {
        let mut store = Store::new();
        store.register_schema(RecordSchema::new("upload").field("file", FieldKind::Text));
        store.register_schema(RecordSchema::new("doc").field(
            "attachment",
            FieldKind::Relation {
                entity: "upload".to_string(),
            },
        ));
        store
            .insert_record(Record::new("upload", 5).with("file", "/media/a.pdf"))
            .unwrap();
        store
            .insert_record(Record::new("doc", 1).with("attachment", RecordRef::new("upload", 5)))
            .unwrap();
        store.insert_record(Record::new("doc", 2)).unwrap();

        let spec = FileSpec::new("attachment");
        let with_file = store.record("doc", 1).unwrap();
        assert_eq!(
            format_file(&store, with_file, &spec),
            json!({"url": "/media/a.pdf", "id": 5})
        );

        let without = store.record("doc", 2).unwrap();
        assert_eq!(format_file(&store, without, &spec), json!(null));
    }
}
