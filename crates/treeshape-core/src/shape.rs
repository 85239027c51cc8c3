//! Shaping entry points
//!
//! Read path for one request: projection selects fields, search and sort
//! narrow and order the collection, pagination slices it, and every record
//! on the page is rendered and decorated (ancestry, file references).

use serde::Serialize;
use std::time::Instant;

use crate::config::{QueryParams, ShapePlan};
use crate::errors::{Result, ShapeError};
use crate::model::Record;
use crate::ops::{QueryableCollection, RecordResolver};
use crate::pagination::paginate;
use crate::projection::{apply_ancestry, apply_files, render_fields};
use crate::query::{self, parse_sort_tokens, Columns};
use crate::{log_op_end, log_op_error, log_op_start};

/// Insertion-ordered output object for one record
pub type Representation = serde_json::Map<String, serde_json::Value>;

/// `{data, count, columns}` response for a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse {
    pub data: Vec<Representation>,
    /// Size of the full filtered collection, not of the page
    pub count: usize,
    pub columns: Columns,
}

/// Output of [`shape`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Shaped {
    Record(Representation),
    Page(PaginatedResponse),
}

/// Input of [`shape`]
pub enum ShapeTarget<'a, C> {
    Record {
        resolver: &'a dyn RecordResolver,
        record: &'a Record,
    },
    Collection(C),
}

/// Render one record through the plan
///
/// # Errors
///
/// * `CycleDetected` - If an ancestry decoration walks a looping chain
pub fn shape_record(
    resolver: &dyn RecordResolver,
    record: &Record,
    plan: &ShapePlan,
) -> Result<Representation> {
    let projection = plan.projection();
    let mut out = render_fields(resolver, record, projection, plan.nest());
    apply_ancestry(
        resolver,
        record,
        projection,
        plan.cascaders(),
        plan.recursive(),
        &mut out,
    )?;
    apply_files(resolver, record, projection, plan.files(), &mut out);
    Ok(out)
}

/// Search, sort, paginate and render a collection
///
/// # Errors
///
/// * `Configuration` - If search or sort is enabled without request
///   parameters, or the collection does not match the plan's entity
/// * `CycleDetected` - If an ancestry decoration walks a looping chain
pub fn shape_collection<C: QueryableCollection>(
    collection: C,
    plan: &ShapePlan,
    params: Option<&QueryParams>,
) -> Result<PaginatedResponse> {
    let start = Instant::now();
    log_op_start!("shape_collection", entity = plan.entity());

    match shape_collection_inner(collection, plan, params) {
        Ok(response) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            log_op_end!(
                "shape_collection",
                duration_ms = duration_ms,
                count = response.count,
                page_len = response.data.len()
            );
            Ok(response)
        }
        Err(err) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            log_op_error!("shape_collection", err.clone(), duration_ms = duration_ms);
            Err(err)
        }
    }
}

fn shape_collection_inner<C: QueryableCollection>(
    collection: C,
    plan: &ShapePlan,
    params: Option<&QueryParams>,
) -> Result<PaginatedResponse> {
    if collection.entity() != plan.entity() {
        return Err(ShapeError::configuration(
            "entity",
            format!(
                "plan is for {}, collection holds {}",
                plan.entity(),
                collection.entity()
            ),
        ));
    }
    if (plan.search_enabled() || plan.sort_enabled()) && params.is_none() {
        return Err(ShapeError::configuration(
            "request",
            "request parameters are required when search or sort is enabled",
        ));
    }

    let empty = QueryParams::new();
    let params = params.unwrap_or(&empty);
    let names = plan.params();
    let ctx = plan.query_context();
    let mut collection = collection;

    if plan.search_enabled() {
        let field = params.get(&names.search_field).unwrap_or_default();
        let text = params.get(&names.search_query).unwrap_or_default();
        if !field.is_empty() && !text.is_empty() {
            collection = query::search(collection, &ctx, field, text).into_inner();
        }
    }
    if plan.sort_enabled() {
        let tokens = parse_sort_tokens(params.get(&names.sort).unwrap_or_default());
        if !tokens.is_empty() {
            collection = query::sort(collection, &ctx, &tokens).into_inner();
        }
    }

    let page = paginate(&collection, plan.page_request(params), plan.hooks())?;
    let resolver = page.items.resolver();
    let data = page
        .items
        .records()
        .into_iter()
        .map(|record| shape_record(resolver, record, plan))
        .collect::<Result<Vec<_>>>()?;

    Ok(PaginatedResponse {
        data,
        count: page.count,
        columns: plan.columns().clone(),
    })
}

/// Shape either a single record or a collection
///
/// # Errors
///
/// See [`shape_record`] and [`shape_collection`].
pub fn shape<C: QueryableCollection>(
    target: ShapeTarget<'_, C>,
    plan: &ShapePlan,
    params: Option<&QueryParams>,
) -> Result<Shaped> {
    match target {
        ShapeTarget::Record { resolver, record } => {
            let start = Instant::now();
            log_op_start!("shape_record", entity = plan.entity(), record_key = record.key);
            match shape_record(resolver, record, plan) {
                Ok(out) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    log_op_end!("shape_record", duration_ms = duration_ms);
                    Ok(Shaped::Record(out))
                }
                Err(err) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    log_op_error!("shape_record", err.clone(), duration_ms = duration_ms);
                    Err(err)
                }
            }
        }
        ShapeTarget::Collection(collection) => {
            shape_collection(collection, plan, params).map(Shaped::Page)
        }
    }
}
