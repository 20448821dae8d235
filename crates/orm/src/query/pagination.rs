//! Query Builder pagination operations
//!
//! Full pagination issues a COUNT query and clamps the requested page into
//! range; simple pagination skips the COUNT and fetches one extra row to
//! learn whether more pages exist.

use crate::collection::ModelCollection;
use crate::error::OrmResult;
use crate::loading::load_related;
use crate::pagination::Paginator;
use crate::query::builder::ModelQuery;

impl ModelQuery {
    /// Fetch one page plus the total row count.
    pub fn paginate(self, page: u64, per_page: u64) -> OrmResult<Paginator> {
        let query = self.prepare();
        let per_page = per_page.max(1);
        let total = query.clone().count()?;
        let last_page = total.div_ceil(per_page).max(1);
        let page = page.clamp(1, last_page);
        let items = query
            .limit(per_page)
            .offset((page - 1) * per_page)
            .get()?;
        Ok(Paginator::new(items, total, per_page, page))
    }

    /// Fetch one page without a COUNT query: `per_page + 1` rows are
    /// requested and the extra row's presence becomes the has-more flag.
    pub fn simple_paginate(self, page: u64, per_page: u64) -> OrmResult<Paginator> {
        let query = self.prepare();
        let per_page = per_page.max(1);
        let page = page.max(1);

        let eager = query.eager_load.clone();
        let mut fetch = query
            .clone()
            .limit(per_page + 1)
            .offset((page - 1) * per_page);
        // The probe row is discarded before eager loading.
        fetch.eager_load.clear();
        let fetched = fetch.get()?;

        let has_more = fetched.len() as u64 > per_page;
        let mut items: Vec<_> = fetched.into_vec();
        items.truncate(per_page as usize);
        let mut items = ModelCollection::from_vec(items);
        if !eager.is_empty() {
            load_related(&query.database, query.def, items.as_mut_slice(), &eager)?;
        }
        Ok(Paginator::simple(items, per_page, page, has_more))
    }
}
