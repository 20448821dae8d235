//! Query Builder
//!
//! Fluent query construction and execution for entity types: WHERE clauses,
//! ordering, scopes, eager-load requests, pagination, and bulk DML.

mod builder;
mod compile;
mod dml;
mod execution;
mod ordering;
mod pagination;
mod scopes;
mod types;
mod where_clause;

pub use builder::ModelQuery;
pub use execution::ModelCursor;
pub use types::{Connective, OrderDirection, QueryOperator, WhereCondition};
