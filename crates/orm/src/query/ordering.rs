//! Query Builder ordering operations

use crate::query::builder::ModelQuery;
use crate::query::types::OrderDirection;

impl ModelQuery {
    /// Append an ORDER BY clause.
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Newest first, by `created_at`.
    pub fn latest(self) -> Self {
        self.order_by("created_at", OrderDirection::Desc)
    }

    /// Oldest first, by `created_at`.
    pub fn oldest(self) -> Self {
        self.order_by("created_at", OrderDirection::Asc)
    }

    /// Drop any accumulated ordering.
    pub fn reorder(mut self) -> Self {
        self.order_by.clear();
        self
    }
}
