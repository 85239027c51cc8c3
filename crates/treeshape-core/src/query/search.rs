use super::expr::{Lookup, LookupModifier};
use super::outcome::{FallbackReason, QueryOutcome};
use super::{log_fallback, QueryContext};
use crate::model::{FieldKind, ValueType};
use crate::ops::QueryableCollection;
use crate::projection::{resolve_anchor, FieldOrigin, ProjectedField};
use crate::traversal::ancestors::primary_key_of;

const OP: &str = "search";

fn fell_back<C>(collection: C, column: &str, reason: FallbackReason) -> QueryOutcome<C> {
    log_fallback(OP, column, &reason);
    QueryOutcome::FellBack { collection, reason }
}

/// Filter `collection` on one searchable column
///
/// Leaves the collection untouched when the input is empty, the column is
/// not searchable, a tree-relative path cannot be built, or the collection
/// rejects the expression.
pub fn search<C: QueryableCollection>(
    collection: C,
    ctx: &QueryContext<'_>,
    field: &str,
    query: &str,
) -> QueryOutcome<C> {
    let query = query.trim();
    let field = field.trim();
    if field.is_empty() || query.is_empty() {
        return fell_back(collection, field, FallbackReason::EmptyInput);
    }

    let projected = match ctx.projection.get(field) {
        Some(p) if ctx.columns.is_searchable(field) => p,
        _ => {
            let reason = FallbackReason::NotSearchable {
                column: field.to_string(),
            };
            return fell_back(collection, field, reason);
        }
    };

    let lookups = if projected.is_computed() {
        match ctx.schema.handlers.search(field) {
            Some(handler) => handler(query),
            None => Vec::new(),
        }
    } else {
        match lookup_segments(&collection, ctx, projected) {
            Ok(path) => vec![Lookup::new(path, modifier_for(&projected.origin), query)],
            Err(reason) => return fell_back(collection, field, reason),
        }
    };
    if lookups.is_empty() {
        return fell_back(collection, field, FallbackReason::EmptyExpression);
    }

    let mut filtered: Option<C> = None;
    for lookup in &lookups {
        let step = filtered.as_ref().unwrap_or(&collection).filter(lookup);
        match step {
            Ok(next) => filtered = Some(next),
            Err(rejected) => {
                return fell_back(collection, field, FallbackReason::Rejected(rejected));
            }
        }
    }
    match filtered {
        Some(c) => QueryOutcome::Applied(c),
        None => fell_back(collection, field, FallbackReason::EmptyExpression),
    }
}

fn modifier_for(origin: &FieldOrigin) -> LookupModifier {
    match origin {
        FieldOrigin::Base(FieldKind::Text) => LookupModifier::IContains,
        FieldOrigin::Base(FieldKind::DateTime) => LookupModifier::Date,
        FieldOrigin::Declared {
            value_type: ValueType::Str,
            ..
        } => LookupModifier::IContains,
        _ => LookupModifier::Exact,
    }
}

/// Lookup path for a non-computed column
///
/// Recursive columns are composed through the ancestor chain of the first
/// record in the collection; everything else uses its source path.
pub(crate) fn lookup_segments<C: QueryableCollection>(
    collection: &C,
    ctx: &QueryContext<'_>,
    field: &ProjectedField,
) -> Result<Vec<String>, FallbackReason> {
    let Some(spec) = ctx.recursive.iter().find(|s| s.name == field.name) else {
        return Ok(field.source_path());
    };

    let sample = collection.first().ok_or(FallbackReason::EmptyCollection)?;
    let resolver = collection.resolver();
    let anchor =
        resolve_anchor(resolver, sample, field).ok_or_else(|| FallbackReason::NoAnchor {
            column: field.name.clone(),
        })?;
    let collect = spec
        .field
        .clone()
        .unwrap_or_else(|| primary_key_of(resolver, anchor.record));

    let path = anchor
        .lookup_path(resolver, spec.depth, &collect)
        .map_err(|e| FallbackReason::Ancestry {
            message: e.to_string(),
        })?
        .ok_or_else(|| FallbackReason::NoAncestorAtDepth {
            column: field.name.clone(),
            depth: spec.depth,
        })?;
    Ok(path)
}
