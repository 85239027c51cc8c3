mod common;

use std::sync::{Arc, Mutex};

use common::tag_store;
use treeshape_core::pagination::{paginate, PageNumber, PageRequest, PaginationConfig};
use treeshape_core::{
    shape_collection, ExError, ExErrorKind, QueryParams, QueryableCollection, ShapeError,
    ShapePlan,
};

fn names(response: &treeshape_core::PaginatedResponse) -> Vec<String> {
    response
        .data
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_page_beyond_end_clamps_to_last_page() {
    let store = tag_store(25);
    let collection = store.collection("tag").unwrap();

    let page = paginate(&collection, PageRequest::new(10, 99), &PaginationConfig::new()).unwrap();

    assert_eq!(page.count, 25);
    assert_eq!(page.window.number, 3);
    assert_eq!(page.items.count(), 5);
    assert_eq!(page.items.keys(), &[21, 22, 23, 24, 25]);
}

#[test]
fn test_last_page_keyword() {
    let store = tag_store(25);
    let plan = ShapePlan::builder(&store, "tag").build().unwrap();
    let params = QueryParams::new().with("limit", "10").with("page", "last");

    let response =
        shape_collection(store.collection("tag").unwrap(), &plan, Some(&params)).unwrap();

    assert_eq!(response.count, 25);
    assert_eq!(names(&response).first().map(String::as_str), Some("tag-021"));
}

#[test]
fn test_page_request_defaults_and_caps() {
    let request = PageRequest::from_params(None, None, 10, None);
    assert_eq!(request, PageRequest::new(10, 1));

    let request = PageRequest::from_params(Some("500"), Some("two"), 10, Some(50));
    assert_eq!(request.size, 50);
    assert_eq!(request.number, PageNumber::Number(1));

    let request = PageRequest::from_params(Some("0"), Some(" last "), 7, None);
    assert_eq!(request, PageRequest::last(7));
}

#[test]
fn test_max_page_size_from_plan() {
    let store = tag_store(30);
    let plan = ShapePlan::builder(&store, "tag")
        .page_size(5)
        .max_page_size(8)
        .build()
        .unwrap();

    let defaulted = shape_collection(store.collection("tag").unwrap(), &plan, None).unwrap();
    assert_eq!(defaulted.data.len(), 5);

    let params = QueryParams::new().with("limit", "100");
    let capped = shape_collection(store.collection("tag").unwrap(), &plan, Some(&params)).unwrap();
    assert_eq!(capped.data.len(), 8);
    assert_eq!(capped.count, 30);
}

#[test]
fn test_hooks_see_full_collection_then_page() {
    let store = tag_store(12);
    let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::default();

    let before = Arc::clone(&seen);
    let after = Arc::clone(&seen);
    let config = PaginationConfig::new()
        .with_before(move |records| before.lock().unwrap().push(("before".into(), records.len())))
        .with_after(move |records| after.lock().unwrap().push(("after".into(), records.len())));

    let collection = store.collection("tag").unwrap();
    paginate(&collection, PageRequest::new(5, 3), &config).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("before".to_string(), 12), ("after".to_string(), 2)]
    );
}

#[test]
fn test_plan_hooks_run_during_shaping() {
    let store = tag_store(3);
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let plan = ShapePlan::builder(&store, "tag")
        .after_page(move |_| *counter.lock().unwrap() += 1)
        .build()
        .unwrap();

    shape_collection(store.collection("tag").unwrap(), &plan, None).unwrap();
    shape_collection(store.collection("tag").unwrap(), &plan, None).unwrap();

    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn test_zero_page_size_is_configuration_error() {
    let store = tag_store(3);
    let collection = store.collection("tag").unwrap();

    let err = paginate(&collection, PageRequest::new(0, 1), &PaginationConfig::new()).unwrap_err();

    assert!(matches!(err, ShapeError::Configuration { ref key, .. } if key == "page_size"));
    assert_eq!(ExError::from(err).kind(), ExErrorKind::Configuration);
}

#[test]
fn test_empty_collection_has_one_empty_page() {
    let store = tag_store(0);
    let plan = ShapePlan::builder(&store, "tag").build().unwrap();
    let params = QueryParams::new().with("page", "4");

    let response =
        shape_collection(store.collection("tag").unwrap(), &plan, Some(&params)).unwrap();

    assert_eq!(response.count, 0);
    assert!(response.data.is_empty());
}
