use std::collections::BTreeMap;
use std::sync::Arc;

use crate::query::expr::{Lookup, OrderKey};

/// Builds filter expressions for a computed field from the query text
pub type SearchHandler = Arc<dyn Fn(&str) -> Vec<Lookup> + Send + Sync>;

/// Builds ordering keys for a computed field; the flag is `descending`
pub type SortHandler = Arc<dyn Fn(bool) -> Vec<OrderKey> + Send + Sync>;

/// What the registry can do for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub search: bool,
    pub sort: bool,
}

/// Typed search/sort handlers keyed by field name
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    search: BTreeMap<String, SearchHandler>,
    sort: BTreeMap<String, SortHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_search<F>(&mut self, field: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> Vec<Lookup> + Send + Sync + 'static,
    {
        self.search.insert(field.into(), Arc::new(handler));
    }

    pub fn register_sort<F>(&mut self, field: impl Into<String>, handler: F)
    where
        F: Fn(bool) -> Vec<OrderKey> + Send + Sync + 'static,
    {
        self.sort.insert(field.into(), Arc::new(handler));
    }

    pub fn search(&self, field: &str) -> Option<&SearchHandler> {
        self.search.get(field)
    }

    pub fn sort(&self, field: &str) -> Option<&SortHandler> {
        self.sort.get(field)
    }

    pub fn capabilities(&self, field: &str) -> Capabilities {
        Capabilities {
            search: self.search.contains_key(field),
            sort: self.sort.contains_key(field),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.sort.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("search", &self.search.keys().collect::<Vec<_>>())
            .field("sort", &self.sort.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::LookupModifier;

    #[test]
    fn test_capabilities_reflect_registrations() {
        let mut registry = HandlerRegistry::new();
        registry.register_search("full_name", |q| {
            vec![Lookup::new(
                vec!["label".to_string()],
                LookupModifier::IContains,
                q,
            )]
        });

        assert_eq!(
            registry.capabilities("full_name"),
            Capabilities {
                search: true,
                sort: false
            }
        );
        assert_eq!(registry.capabilities("other"), Capabilities::default());

        let handler = registry.search("full_name").unwrap();
        let lookups = handler("abc");
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].value, "abc");
    }
}
