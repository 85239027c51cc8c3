use super::expr::OrderKey;
use super::outcome::{FallbackReason, QueryOutcome};
use super::search::lookup_segments;
use super::{log_fallback, QueryContext};
use crate::ops::QueryableCollection;

const OP: &str = "sort";

/// Split a raw `sort` parameter (`-created,label`) into tokens
pub fn parse_sort_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Order `collection` by the given tokens as one multi-key ordering
///
/// A leading `-` sorts descending. Tokens naming non-sortable columns are
/// dropped; computed columns contribute their handler's keys.
pub fn sort<C: QueryableCollection>(
    collection: C,
    ctx: &QueryContext<'_>,
    tokens: &[String],
) -> QueryOutcome<C> {
    let mut keys = Vec::new();

    for token in tokens {
        let (name, descending) = match token.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (token.as_str(), false),
        };
        let Some(field) = ctx
            .projection
            .get(name)
            .filter(|_| ctx.columns.is_sortable(name))
        else {
            tracing::debug!(op = OP, column = name, "dropping unsortable token");
            continue;
        };

        if field.is_computed() {
            if let Some(handler) = ctx.schema.handlers.sort(name) {
                keys.extend(handler(descending));
            }
            continue;
        }

        match lookup_segments(&collection, ctx, field) {
            Ok(path) => keys.push(OrderKey { path, descending }),
            Err(reason) => {
                log_fallback(OP, name, &reason);
            }
        }
    }

    if keys.is_empty() {
        log_fallback(OP, "", &FallbackReason::EmptyInput);
        return QueryOutcome::FellBack {
            collection,
            reason: FallbackReason::EmptyInput,
        };
    }

    match collection.order_by(&keys) {
        Ok(sorted) => QueryOutcome::Applied(sorted),
        Err(rejected) => {
            let reason = FallbackReason::Rejected(rejected);
            log_fallback(OP, "", &reason);
            QueryOutcome::FellBack { collection, reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_tokens() {
        assert_eq!(parse_sort_tokens("-a, b,,"), vec!["-a", "b"]);
        assert!(parse_sort_tokens("").is_empty());
    }
}
