//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Pagination and sort parameters for list queries
///
/// # Example
/// ```rust,ignore
/// let params = QueryParams {
///     page: 2,
///     limit: 10,
///     sort: Some("total_price:desc".to_string()),
/// };
/// let page = filter_service.search(&filter, &params).await?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Sort field and direction
    ///
    /// # Format
    /// - `field:asc` or `field` (ascending)
    /// - `field:desc` (descending)
    pub sort: Option<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: None,
        }
    }
}

impl QueryParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, ensuring it doesn't exceed the maximum
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, 100)
    }

    /// Parse the sort parameter into a field name and direction
    ///
    /// Unknown directions are treated as ascending.
    pub fn sort_spec(&self) -> Option<(&str, SortDirection)> {
        let raw = self.sort.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let (field, direction) = match raw.split_once(':') {
            Some((field, dir)) if dir.trim().eq_ignore_ascii_case("desc") => {
                (field, SortDirection::Desc)
            }
            Some((field, _)) => (field, SortDirection::Asc),
            None => (raw, SortDirection::Asc),
        };
        Some((field.trim(), direction))
    }
}

/// Paginated response structure
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    /// Cut one page out of an already filtered and sorted list
    pub fn paginate(items: Vec<T>, params: &QueryParams) -> Self {
        let page = params.page();
        let limit = params.limit();
        let total = items.len();
        let data = items
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Self {
            data,
            pagination: PaginationMeta::new(page, limit, total),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1) * limit;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start + limit < total,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_defaults() {
        let params = QueryParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 20);
        assert!(params.sort_spec().is_none());
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(QueryParams::new(0, 0).limit(), 1);
        assert_eq!(QueryParams::new(0, 0).page(), 1);
        assert_eq!(QueryParams::new(1, 500).limit(), 100);
    }

    #[test]
    fn test_sort_spec() {
        let params = QueryParams::default().with_sort("total_price:desc");
        assert_eq!(params.sort_spec(), Some(("total_price", SortDirection::Desc)));

        let params = QueryParams::default().with_sort("delivery_datetime");
        assert_eq!(params.sort_spec(), Some(("delivery_datetime", SortDirection::Asc)));

        let params = QueryParams::default().with_sort("created_at:sideways");
        assert_eq!(params.sort_spec(), Some(("created_at", SortDirection::Asc)));
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(1, 20, 145);
        assert_eq!(meta.total, 145);
        assert_eq!(meta.total_pages, 8);
        assert!(!meta.has_prev);
        assert!(meta.has_next);
    }

    #[test]
    fn test_paginate_last_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = PaginatedResponse::paginate(items, &QueryParams::new(3, 10));
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
        assert_eq!(page.pagination.total_pages, 3);
    }
}
