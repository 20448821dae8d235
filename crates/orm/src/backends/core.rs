//! Core Database Backend Traits
//!
//! Defines the statement-layer contract the ORM consumes: a fluent
//! [`Statement`] builder with named-parameter binding, and a [`Connection`]
//! that executes statements and reports generated keys and affected rows.
//!
//! WHERE expressions use the statement layer's mini syntax: a bare column name
//! auto-binds to a placeholder of the same name (`status` means
//! `status = :status`), `,` joins fragments with AND, `|` joins with OR (AND
//! binds tighter), and comparison/LIKE/IN/BETWEEN/NULL operators are embedded
//! in the expression string with `:named` placeholders.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::OrmResult;

/// A single result row: ordered column-name to value map.
pub type Row = BTreeMap<String, Value>;

/// Lazy row sequence returned by [`Connection::lazy`]. Finite, one row at a
/// time, not restartable.
pub type RowStream = Box<dyn Iterator<Item = OrmResult<Row>>>;

/// The kind of operation a statement performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Fluent statement builder consumed by [`Connection`] implementations.
///
/// Builder methods mutate and return `self` so call sites read as a single
/// chain; the ORM's query compiler is the main producer.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: String,
    /// SELECT list, or the column list for INSERT/UPDATE.
    pub columns: Vec<String>,
    /// WHERE fragments in the mini syntax; fragments are AND-joined.
    pub wheres: Vec<String>,
    /// ORDER expressions, e.g. `"name ASC"`.
    pub order: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Named parameter bindings referenced by `:name` placeholders.
    pub params: BTreeMap<String, Value>,
}

impl Statement {
    /// Start a statement. The kind defaults to SELECT until one of the
    /// DML entry points reassigns it.
    pub fn prepare() -> Self {
        Self {
            kind: StatementKind::Select,
            table: String::new(),
            columns: Vec::new(),
            wheres: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            params: BTreeMap::new(),
        }
    }

    /// Set the SELECT column list. An empty list means `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = StatementKind::Select;
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source table for a SELECT.
    pub fn from(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Append a WHERE fragment in the mini expression syntax.
    pub fn where_expr(mut self, expr: &str) -> Self {
        if !expr.is_empty() {
            self.wheres.push(expr.to_string());
        }
        self
    }

    /// Append an ORDER expression (`"column ASC"` / `"column DESC"`).
    pub fn order(mut self, expr: &str) -> Self {
        self.order.push(expr.to_string());
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: u64) -> Self {
        self.offset = Some(count);
        self
    }

    /// Turn the statement into an INSERT of the given columns; values come
    /// from same-named parameters bound via [`Statement::assign`].
    pub fn insert<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = StatementKind::Insert;
        self.table = table.to_string();
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Turn the statement into an UPDATE of the given columns; values come
    /// from same-named parameters.
    pub fn update<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = StatementKind::Update;
        self.table = table.to_string();
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Turn the statement into a DELETE constrained by the key map: every
    /// entry becomes a bare-column WHERE fragment bound to its value.
    pub fn delete(mut self, table: &str, keys: BTreeMap<String, Value>) -> Self {
        self.kind = StatementKind::Delete;
        self.table = table.to_string();
        for (column, value) in keys {
            self.wheres.push(column.clone());
            self.params.insert(column, value);
        }
        self
    }

    /// Bind one named parameter.
    pub fn assign<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Bind a map of named parameters.
    pub fn assign_map(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params.extend(params);
        self
    }
}

/// Abstract database connection: the one external collaborator of the ORM.
///
/// All operations block the calling thread; the ORM never holds state inside
/// the connection beyond what the accessor pair below exposes.
pub trait Connection: Send + Sync {
    /// Execute a SELECT and return all rows.
    fn query(&self, statement: &Statement) -> OrmResult<Vec<Row>>;

    /// Execute a SELECT and return rows one at a time.
    fn lazy(&self, statement: &Statement) -> OrmResult<RowStream>;

    /// Execute an INSERT/UPDATE/DELETE and return the affected-row count.
    fn execute(&self, statement: &Statement) -> OrmResult<u64>;

    /// Generated primary key of the most recent INSERT.
    fn last_insert_id(&self) -> OrmResult<Value>;

    /// Affected-row count of the most recent write.
    fn affected_rows(&self) -> u64;
}
