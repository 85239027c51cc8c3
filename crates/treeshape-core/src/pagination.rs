//! Page slicing with pre/post hooks

use std::sync::Arc;

use crate::errors::{Result, ShapeError};
use crate::model::Record;
use crate::ops::QueryableCollection;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page parameter value selecting the last page
pub const LAST_PAGE: &str = "last";

/// Callback run over a set of records around pagination
pub type PageHook = Arc<dyn Fn(&[&Record]) + Send + Sync>;

/// Optional hooks run before (full collection) and after (page) slicing
#[derive(Clone, Default)]
pub struct PaginationConfig {
    pub before: Option<PageHook>,
    pub after: Option<PageHook>,
}

impl PaginationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[&Record]) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn with_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[&Record]) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl std::fmt::Debug for PaginationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationConfig")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(usize),
    Last,
}

/// Requested page size and number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub number: PageNumber,
}

impl PageRequest {
    pub fn new(size: usize, number: usize) -> Self {
        Self {
            size,
            number: PageNumber::Number(number),
        }
    }

    pub fn last(size: usize) -> Self {
        Self {
            size,
            number: PageNumber::Last,
        }
    }

    /// Read raw request values, falling back to defaults
    ///
    /// A missing, unparsable or zero size uses `default_size`; `max_size`
    /// caps it. A missing or unparsable number means page 1.
    pub fn from_params(
        size: Option<&str>,
        number: Option<&str>,
        default_size: usize,
        max_size: Option<usize>,
    ) -> Self {
        let size = size
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(default_size);
        let size = max_size.map_or(size, |max| size.min(max));

        let number = match number.map(str::trim) {
            Some(LAST_PAGE) => PageNumber::Last,
            Some(raw) => PageNumber::Number(raw.parse().unwrap_or(1)),
            None => PageNumber::Number(1),
        };
        Self { size, number }
    }
}

/// Resolved page position within a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub size: usize,
    pub num_pages: usize,
    pub offset: usize,
}

/// Clamp the requested page into `1..=max(1, ceil(count / size))`
///
/// # Errors
///
/// Returns `Configuration` (key `page_size`) when `size` is zero.
pub fn page_window(count: usize, size: usize, number: PageNumber) -> Result<PageWindow> {
    if size == 0 {
        return Err(ShapeError::configuration(
            "page_size",
            "page size must be positive",
        ));
    }
    let num_pages = count.div_ceil(size).max(1);
    let number = match number {
        PageNumber::Last => num_pages,
        PageNumber::Number(n) => n.clamp(1, num_pages),
    };
    Ok(PageWindow {
        number,
        size,
        num_pages,
        offset: (number - 1) * size,
    })
}

/// One page of a collection plus the full collection's count
#[derive(Debug)]
pub struct Page<C> {
    pub items: C,
    pub count: usize,
    pub window: PageWindow,
}

/// Run the pre-hook, count, clamp, slice, then run the post-hook
///
/// # Errors
///
/// Returns `Configuration` when the page size is zero.
pub fn paginate<C: QueryableCollection>(
    collection: &C,
    request: PageRequest,
    config: &PaginationConfig,
) -> Result<Page<C>> {
    if let Some(before) = &config.before {
        before(&collection.records());
    }

    let count = collection.count();
    let window = page_window(count, request.size, request.number)?;
    let items = collection.slice(window.offset, window.size);

    if let Some(after) = &config.after {
        after(&items.records());
    }

    tracing::debug!(
        entity = collection.entity(),
        count = count,
        page = window.number,
        num_pages = window.num_pages,
        "paginated"
    );

    Ok(Page {
        items,
        count,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_clamps() {
        let w = page_window(25, 10, PageNumber::Number(99)).unwrap();
        assert_eq!((w.number, w.offset, w.num_pages), (3, 20, 3));

        let w = page_window(0, 10, PageNumber::Number(5)).unwrap();
        assert_eq!((w.number, w.offset), (1, 0));

        let w = page_window(25, 10, PageNumber::Number(0)).unwrap();
        assert_eq!(w.number, 1);
    }

    #[test]
    fn test_zero_page_size_is_configuration_error() {
        let err = page_window(5, 0, PageNumber::Number(1)).unwrap_err();
        assert!(matches!(err, ShapeError::Configuration { ref key, .. } if key == "page_size"));
    }

    #[test]
    fn test_from_params_defaults_and_caps() {
        let req = PageRequest::from_params(Some("abc"), Some("x"), 10, None);
        assert_eq!(req, PageRequest::new(10, 1));

        let req = PageRequest::from_params(Some("500"), Some("last"), 10, Some(50));
        assert_eq!(req, PageRequest::last(50));

        let req = PageRequest::from_params(Some("0"), None, 7, None);
        assert_eq!(req.size, 7);
    }
}
