//! Paginator
//!
//! An immutable view over one page of results. Full mode knows the total and
//! last page; simple mode carries `total = None` and an explicit has-more
//! flag derived from the one-extra-row fetch.

use serde::Serialize;
use serde_json::Value;

use crate::collection::ModelCollection;

/// Pagination metadata for responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total: Option<u64>,
    pub last_page: Option<u64>,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of models plus navigation metadata.
#[derive(Debug, Clone)]
pub struct Paginator {
    items: ModelCollection,
    total: Option<u64>,
    per_page: u64,
    current_page: u64,
    last_page: Option<u64>,
    has_more: bool,
    page_name: String,
    path: String,
    query: Vec<(String, String)>,
}

impl Paginator {
    /// Full mode: the total is known, the last page derives from it, and the
    /// current page is clamped into `[1, last_page]`.
    pub fn new(items: ModelCollection, total: u64, per_page: u64, current_page: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let current_page = current_page.clamp(1, last_page);
        Self {
            items,
            total: Some(total),
            per_page,
            current_page,
            last_page: Some(last_page),
            has_more: current_page < last_page,
            page_name: "page".to_string(),
            path: String::new(),
            query: Vec::new(),
        }
    }

    /// Simple mode: no COUNT was issued, so the total and last page are
    /// unknown and has-more comes from the extra-row probe.
    pub fn simple(items: ModelCollection, per_page: u64, current_page: u64, has_more: bool) -> Self {
        Self {
            items,
            total: None,
            per_page: per_page.max(1),
            current_page: current_page.max(1),
            last_page: None,
            has_more,
            page_name: "page".to_string(),
            path: String::new(),
            query: Vec::new(),
        }
    }

    pub fn items(&self) -> &ModelCollection {
        &self.items
    }

    pub fn into_items(self) -> ModelCollection {
        self.items
    }

    /// Total matching rows; `None` in simple mode.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Last page number; `None` in simple mode.
    pub fn last_page(&self) -> Option<u64> {
        self.last_page
    }

    pub fn on_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_more
    }

    /// Number of models on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // --- URL generation ---------------------------------------------------

    /// Set the base path used by URL generation.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Rename the page query parameter (defaults to `page`).
    pub fn with_page_name(mut self, name: &str) -> Self {
        self.page_name = name.to_string();
        self
    }

    /// Append an extra query parameter to every generated URL.
    pub fn append_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// URL for a given page number.
    pub fn url(&self, page: u64) -> String {
        let mut url = format!("{}?{}={}", self.path, self.page_name, page.max(1));
        for (key, value) in &self.query {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    pub fn next_page_url(&self) -> Option<String> {
        self.has_more_pages().then(|| self.url(self.current_page + 1))
    }

    pub fn previous_page_url(&self) -> Option<String> {
        (self.current_page > 1).then(|| self.url(self.current_page - 1))
    }

    /// Every page number in order; `None` in simple mode, where the last
    /// page is unknown.
    pub fn page_range(&self) -> Option<Vec<u64>> {
        self.last_page.map(|last| (1..=last).collect())
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            has_next: self.has_more_pages(),
            has_prev: self.current_page > 1,
        }
    }

    /// Serialize as `{ "data": [...], "meta": {...} }`.
    pub fn to_value(&self) -> Value {
        let meta = serde_json::to_value(self.meta()).unwrap_or(Value::Null);
        let mut map = serde_json::Map::new();
        map.insert("data".to_string(), self.items.to_value());
        map.insert("meta".to_string(), meta);
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_derives_last_page_and_clamps() {
        let paginator = Paginator::new(ModelCollection::new(), 5, 3, 9);
        assert_eq!(paginator.last_page(), Some(2));
        assert_eq!(paginator.current_page(), 2);
        assert!(!paginator.has_more_pages());
        assert_eq!(paginator.page_range(), Some(vec![1, 2]));
    }

    #[test]
    fn zero_total_still_has_one_page() {
        let paginator = Paginator::new(ModelCollection::new(), 0, 10, 1);
        assert_eq!(paginator.last_page(), Some(1));
        assert_eq!(paginator.current_page(), 1);
        assert!(!paginator.has_more_pages());
    }

    #[test]
    fn simple_mode_has_no_total_or_range() {
        let paginator = Paginator::simple(ModelCollection::new(), 3, 1, true);
        assert_eq!(paginator.total(), None);
        assert_eq!(paginator.last_page(), None);
        assert_eq!(paginator.page_range(), None);
        assert!(paginator.has_more_pages());
    }

    #[test]
    fn url_generation_appends_page_and_extras() {
        let paginator = Paginator::new(ModelCollection::new(), 10, 2, 2)
            .with_path("/posts")
            .append_query("sort", "title");
        assert_eq!(paginator.url(3), "/posts?page=3&sort=title");
        assert_eq!(paginator.next_page_url(), Some("/posts?page=3&sort=title".to_string()));
        assert_eq!(
            paginator.previous_page_url(),
            Some("/posts?page=1&sort=title".to_string())
        );
    }
}
