use treeshape_core::{FieldKind, RawData, Record, RecordRef, RecordSchema, Store};

/// Category schema: `label`, `created` and a self-referencing `parent`
#[allow(dead_code)]
pub fn category_schema() -> RecordSchema {
    RecordSchema::new("category")
        .field("label", FieldKind::Text)
        .field("created", FieldKind::DateTime)
        .with_parent("parent")
}

/// Store holding the chain N1 -> N2 -> N3 -> N4 (keys 1..=4)
#[allow(dead_code)]
pub fn category_store() -> Store {
    let mut store = Store::new();
    store.register_schema(category_schema());
    let labels = ["Electronics", "Computers", "Laptops", "Gaming Laptops"];
    for (i, label) in labels.iter().enumerate() {
        let key = i as i64 + 1;
        let mut record = Record::new("category", key).with("label", *label);
        if key > 1 {
            record = record.with("parent", RecordRef::new("category", key - 1));
        }
        store.insert_record(record).unwrap();
    }
    store
}

/// Category tree plus products (one per category) and their uploads
///
/// Product `k` sits in category `k`; products 1 and 3 have an image.
#[allow(dead_code)]
pub fn catalog_store() -> Store {
    let mut store = category_store();
    store.register_schema(RecordSchema::new("upload").field("file", FieldKind::Text));
    store.register_schema(
        RecordSchema::new("product")
            .field("title", FieldKind::Text)
            .field("price", FieldKind::Float)
            .field(
                "category",
                FieldKind::Relation {
                    entity: "category".to_string(),
                },
            )
            .field(
                "image",
                FieldKind::Relation {
                    entity: "upload".to_string(),
                },
            ),
    );

    store
        .insert_record(Record::new("upload", 10).with("file", "/media/tv.png"))
        .unwrap();
    store
        .insert_record(Record::new("upload", 30).with("file", "/media/laptop.png"))
        .unwrap();

    let titles = ["Television", "Desktop", "Ultrabook", "Gaming Rig"];
    for (i, title) in titles.iter().enumerate() {
        let key = i as i64 + 1;
        let mut record = Record::new("product", key)
            .with("title", *title)
            .with("price", 100.0 * key as f64)
            .with("category", RecordRef::new("category", key));
        if key % 2 == 1 {
            record = record.with("image", RecordRef::new("upload", key * 10));
        }
        store.insert_record(record).unwrap();
    }
    store
}

/// Store with `n` tags named `tag-001`.. keyed 1..=n
#[allow(dead_code)]
pub fn tag_store(n: i64) -> Store {
    let mut store = Store::new();
    store.register_schema(RecordSchema::new("tag").field("name", FieldKind::Text));
    for key in 1..=n {
        store
            .insert_record(Record::new("tag", key).with("name", format!("tag-{:03}", key)))
            .unwrap();
    }
    store
}

/// Convert a JSON object literal into raw record data
#[allow(dead_code)]
pub fn raw(value: serde_json::Value) -> RawData {
    value.as_object().cloned().unwrap()
}
