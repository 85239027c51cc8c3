mod common;

use common::{catalog_store, category_store};
use serde_json::json;
use treeshape_core::projection::{CascaderSpec, FieldSpec, RecursiveSpec};
use treeshape_core::traversal::{cascader, chain, lookup_path, recursive, relation_path};
use treeshape_core::{shape_record, RecordRef, ShapeError, ShapePlan, Value};

// ===== ANCESTOR RESOLVER =====

#[test]
fn test_cascader_of_leaf_is_root_to_parent() {
    let store = category_store();
    let n4 = store.get_record("category", 4).unwrap();

    let keys = cascader(&store, n4).unwrap();

    assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_cascader_of_root_is_empty() {
    let store = category_store();
    let n1 = store.get_record("category", 1).unwrap();

    assert!(cascader(&store, n1).unwrap().is_empty());
}

#[test]
fn test_recursive_depth_zero_is_nearest_parent() {
    let store = category_store();
    let n4 = store.get_record("category", 4).unwrap();

    assert_eq!(recursive(&store, n4, 0).unwrap().map(|r| r.key), Some(3));
    assert_eq!(recursive(&store, n4, 2).unwrap().map(|r| r.key), Some(1));
    assert!(recursive(&store, n4, 3).unwrap().is_none());
}

#[test]
fn test_chain_collects_any_field() {
    let store = category_store();
    let n3 = store.get_record("category", 3).unwrap();

    let labels = chain(&store, Some(n3), "label", "parent").unwrap();

    assert_eq!(
        labels,
        vec![
            Value::from("Electronics"),
            Value::from("Computers"),
            Value::from("Laptops")
        ]
    );
}

#[test]
fn test_relation_path_has_one_token_per_hop() {
    let store = category_store();
    let n4 = store.get_record("category", 4).unwrap();
    let n1 = store.get_record("category", 1).unwrap();

    assert_eq!(relation_path(&store, n4, "parent").unwrap().len(), 3);
    assert!(relation_path(&store, n1, "parent").unwrap().is_empty());
}

#[test]
fn test_lookup_path_needs_an_ancestor_at_depth() {
    let store = category_store();
    let n2 = store.get_record("category", 2).unwrap();

    assert_eq!(
        lookup_path(&store, n2, 0, "label").unwrap(),
        Some(vec!["parent".to_string(), "label".to_string()])
    );
    assert_eq!(lookup_path(&store, n2, 1, "label").unwrap(), None);
}

#[test]
fn test_dangling_parent_ends_chain() {
    let mut store = category_store();
    let mut n2 = store.get_record("category", 2).unwrap().clone();
    n2.set("parent", Value::Ref(RecordRef::new("category", 404)));
    store.insert_record(n2).unwrap();

    let n4 = store.get_record("category", 4).unwrap();
    assert_eq!(cascader(&store, n4).unwrap(), vec![Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_cyclic_parents_fail_fast() {
    let mut store = category_store();
    let mut n1 = store.get_record("category", 1).unwrap().clone();
    n1.set("parent", Value::Ref(RecordRef::new("category", 4)));
    store.insert_record(n1).unwrap();

    let n4 = store.get_record("category", 4).unwrap();
    let err = cascader(&store, n4).unwrap_err();

    assert!(matches!(err, ShapeError::CycleDetected { ref entity, .. } if entity == "category"));
}

// ===== DECORATED FIELDS =====

#[test]
fn test_cascader_on_computed_field_anchors_at_record() {
    let store = category_store();
    let plan = ShapePlan::builder(&store, "category")
        .field_spec(FieldSpec::computed("breadcrumbs", |_, _| json!(null)))
        .field_spec(FieldSpec::computed("trail", |_, _| json!(null)))
        .cascader(CascaderSpec::new("breadcrumbs"))
        .cascader(CascaderSpec::new("trail").collecting("label"))
        .build()
        .unwrap();

    let n4 = store.get_record("category", 4).unwrap();
    let out = shape_record(&store, n4, &plan).unwrap();

    assert_eq!(out["breadcrumbs"], json!([1, 2, 3]));
    assert_eq!(out["trail"], json!(["Electronics", "Computers", "Laptops"]));
}

#[test]
fn test_relation_field_anchors_at_referenced_record() {
    let store = catalog_store();
    let plan = ShapePlan::builder(&store, "product")
        .field_spec(FieldSpec::path("parent_category", "category.id"))
        .cascader(CascaderSpec::new("category"))
        .recursive(RecursiveSpec::new("parent_category", 0).collecting("label"))
        .build()
        .unwrap();

    let gaming = store.get_record("product", 4).unwrap();
    let out = shape_record(&store, gaming, &plan).unwrap();
    assert_eq!(out["category"], json!([1, 2, 3, 4]));
    assert_eq!(out["parent_category"], json!("Laptops"));

    let television = store.get_record("product", 1).unwrap();
    let out = shape_record(&store, television, &plan).unwrap();
    assert_eq!(out["category"], json!([1]));
    assert_eq!(out["parent_category"], json!(null));
}

#[test]
fn test_cascader_on_parent_field_ends_at_parent() {
    let store = category_store();
    let plan = ShapePlan::builder(&store, "category")
        .field_spec(FieldSpec::path("trail", "parent"))
        .cascader(CascaderSpec::new("parent"))
        .cascader(CascaderSpec::new("trail").collecting("label"))
        .build()
        .unwrap();

    let expected = [
        (1, json!([]), json!([])),
        (2, json!([1]), json!(["Electronics"])),
        (4, json!([1, 2, 3]), json!(["Electronics", "Computers", "Laptops"])),
    ];
    for (key, keys, labels) in expected {
        let record = store.get_record("category", key).unwrap();
        let out = shape_record(&store, record, &plan).unwrap();
        assert_eq!(out["parent"], keys, "category {}", key);
        assert_eq!(out["trail"], labels, "category {}", key);
    }
}

#[test]
fn test_cascader_on_parent_field_matches_record_breadcrumb() {
    let store = category_store();
    let plan = ShapePlan::builder(&store, "category")
        .cascader(CascaderSpec::new("parent"))
        .build()
        .unwrap();

    for key in 1..=4 {
        let record = store.get_record("category", key).unwrap();
        let out = shape_record(&store, record, &plan).unwrap();
        let breadcrumb: Vec<serde_json::Value> = cascader(&store, record)
            .unwrap()
            .iter()
            .map(Value::to_json)
            .collect();
        assert_eq!(out["parent"], json!(breadcrumb), "category {}", key);
    }
}

#[test]
fn test_recursive_on_parent_field_counts_from_parent() {
    let store = category_store();
    let n1 = store.get_record("category", 1).unwrap();
    let n2 = store.get_record("category", 2).unwrap();
    let n4 = store.get_record("category", 4).unwrap();

    let nearest = ShapePlan::builder(&store, "category")
        .recursive(RecursiveSpec::new("parent", 0))
        .build()
        .unwrap();
    assert_eq!(shape_record(&store, n4, &nearest).unwrap()["parent"], json!(3));
    assert_eq!(shape_record(&store, n2, &nearest).unwrap()["parent"], json!(1));
    assert_eq!(shape_record(&store, n1, &nearest).unwrap()["parent"], json!(null));

    let grandparent = ShapePlan::builder(&store, "category")
        .recursive(RecursiveSpec::new("parent", 1))
        .build()
        .unwrap();
    assert_eq!(shape_record(&store, n4, &grandparent).unwrap()["parent"], json!(2));
    assert_eq!(shape_record(&store, n2, &grandparent).unwrap()["parent"], json!(null));

    let label = ShapePlan::builder(&store, "category")
        .recursive(RecursiveSpec::new("parent", 0).collecting("label"))
        .build()
        .unwrap();
    assert_eq!(shape_record(&store, n4, &label).unwrap()["parent"], json!("Laptops"));
}

#[test]
fn test_decoration_skips_fields_outside_projection() {
    let store = category_store();
    let plan = ShapePlan::builder(&store, "category")
        .fields(vec!["id".to_string(), "label".to_string()])
        .cascader(CascaderSpec::new("parent"))
        .build()
        .unwrap();

    let n4 = store.get_record("category", 4).unwrap();
    let out = shape_record(&store, n4, &plan).unwrap();

    assert!(!out.contains_key("parent"));
}
