//! Search and sort shaping restricted to whitelisted columns

pub mod expr;
pub mod outcome;
pub mod search;
pub mod sort;

use serde::Serialize;

use crate::model::RecordSchema;
use crate::projection::{Projection, RecursiveSpec};

pub use expr::{Lookup, LookupModifier, OrderKey, QueryRejected};
pub use outcome::{FallbackReason, QueryOutcome};
pub use search::search;
pub use sort::{parse_sort_tokens, sort};

/// Columns a client may search and sort on
///
/// Every projected field qualifies, except computed fields without a
/// registered handler for the operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Columns {
    pub searchable: Vec<String>,
    pub sortable: Vec<String>,
}

impl Columns {
    pub fn compute(projection: &Projection, schema: &RecordSchema) -> Self {
        let mut columns = Columns::default();
        for field in projection.fields() {
            let caps = schema.handlers.capabilities(&field.name);
            if !field.is_computed() || caps.search {
                columns.searchable.push(field.name.clone());
            }
            if !field.is_computed() || caps.sort {
                columns.sortable.push(field.name.clone());
            }
        }
        columns
    }

    pub fn is_searchable(&self, name: &str) -> bool {
        self.searchable.iter().any(|c| c == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.sortable.iter().any(|c| c == name)
    }
}

/// Everything search and sort need to know about the projected entity
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub schema: &'a RecordSchema,
    pub projection: &'a Projection,
    pub recursive: &'a [RecursiveSpec],
    pub columns: &'a Columns,
}

pub(crate) fn log_fallback(op: &str, column: &str, reason: &FallbackReason) {
    use treeshape_core_types::schema::EVENT_FALLBACK;

    if *reason == FallbackReason::EmptyInput {
        tracing::debug!(
            component = module_path!(),
            op = op,
            event = EVENT_FALLBACK,
            column = column,
            reason = %reason
        );
    } else {
        tracing::warn!(
            component = module_path!(),
            op = op,
            event = EVENT_FALLBACK,
            column = column,
            reason = %reason
        );
    }
}
