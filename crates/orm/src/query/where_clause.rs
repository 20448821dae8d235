//! Query Builder WHERE clause operations
//!
//! Fragments accumulate with AND by default; the `or_*` variants join with
//! OR against everything accumulated so far, with AND binding tighter than
//! OR when the statement is rendered.

use serde_json::Value;

use crate::query::builder::ModelQuery;
use crate::query::types::{Connective, QueryOperator, WhereCondition};

impl ModelQuery {
    pub(crate) fn push_condition(
        mut self,
        connective: Connective,
        column: &str,
        operator: QueryOperator,
        value: Option<Value>,
        values: Vec<Value>,
    ) -> Self {
        self.conditions.push((
            connective,
            WhereCondition {
                column: column.to_string(),
                operator,
                value,
                values,
            },
        ));
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::Equal,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::NotEqual,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::GreaterThan,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::GreaterThanOrEqual,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::LessThan,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::LessThanOrEqual,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
            Vec::new(),
        )
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::NotLike,
            Some(Value::String(pattern.to_string())),
            Vec::new(),
        )
    }

    /// Add WHERE condition with a custom operator string
    pub fn where_condition<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        let operator = parse_operator(operator);
        self.push_condition(
            Connective::And,
            column,
            operator,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::In,
            None,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::NotIn,
            None,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(Connective::And, column, QueryOperator::IsNull, None, Vec::new())
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::IsNotNull,
            None,
            Vec::new(),
        )
    }

    /// Add WHERE condition with BETWEEN
    pub fn where_between<T: Into<Value>>(self, column: &str, start: T, end: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::Between,
            None,
            vec![start.into(), end.into()],
        )
    }

    /// Add WHERE condition with NOT BETWEEN
    pub fn where_not_between<T: Into<Value>>(self, column: &str, start: T, end: T) -> Self {
        self.push_condition(
            Connective::And,
            column,
            QueryOperator::NotBetween,
            None,
            vec![start.into(), end.into()],
        )
    }

    /// OR-join an equality condition against everything accumulated so far
    pub fn or_where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(
            Connective::Or,
            column,
            QueryOperator::Equal,
            Some(value.into()),
            Vec::new(),
        )
    }

    /// OR-join a condition with a custom operator string
    pub fn or_where<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        let operator = parse_operator(operator);
        self.push_condition(
            Connective::Or,
            column,
            operator,
            Some(value.into()),
            Vec::new(),
        )
    }
}

fn parse_operator(operator: &str) -> QueryOperator {
    match operator {
        "!=" | "<>" => QueryOperator::NotEqual,
        ">" => QueryOperator::GreaterThan,
        ">=" => QueryOperator::GreaterThanOrEqual,
        "<" => QueryOperator::LessThan,
        "<=" => QueryOperator::LessThanOrEqual,
        "LIKE" | "like" => QueryOperator::Like,
        "NOT LIKE" | "not like" => QueryOperator::NotLike,
        // Default fallback, including "="
        _ => QueryOperator::Equal,
    }
}
