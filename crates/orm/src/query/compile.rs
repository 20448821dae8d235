//! Statement Compilation
//!
//! Flattens accumulated builder state into a [`Statement`] for the external
//! statement layer. Conditions render into the mini WHERE syntax — `,` for
//! AND, `|` for OR — with `:wN` placeholders; precedence is the standard
//! infix tie-break (AND binds tighter than OR).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::backends::Statement;
use crate::query::builder::ModelQuery;
use crate::query::types::{Connective, QueryOperator, WhereCondition};

impl ModelQuery {
    /// Compile to a SELECT statement.
    pub(crate) fn to_statement(&self) -> Statement {
        let mut statement = Statement::prepare()
            .select(self.select_columns.clone())
            .from(&self.def.table);
        statement = self.apply_conditions(statement);
        for (column, direction) in &self.order_by {
            statement = statement.order(&format!("{column} {direction}"));
        }
        if let Some(limit) = self.limit_count {
            statement = statement.limit(limit);
        }
        if let Some(offset) = self.offset_count {
            statement = statement.offset(offset);
        }
        statement
    }

    /// Compile to a COUNT statement: same conditions, no ordering or paging.
    pub(crate) fn count_statement(&self) -> Statement {
        let statement = Statement::prepare()
            .select(["COUNT(*)"])
            .from(&self.def.table);
        self.apply_conditions(statement)
    }

    /// Compile to an UPDATE statement over the given columns.
    pub(crate) fn update_statement(&self, values: BTreeMap<String, Value>) -> Statement {
        let columns: Vec<String> = values.keys().cloned().collect();
        let statement = Statement::prepare()
            .update(&self.def.table, columns)
            .assign_map(values);
        self.apply_conditions(statement)
    }

    /// Compile to a DELETE statement.
    pub(crate) fn delete_statement(&self) -> Statement {
        let statement = Statement::prepare().delete(&self.def.table, BTreeMap::new());
        self.apply_conditions(statement)
    }

    /// Caller conditions and scope-added conditions compile into separate
    /// fragments; the statement layer AND-joins fragments, so a caller's OR
    /// cannot escape a global scope's filter.
    fn apply_conditions(&self, mut statement: Statement) -> Statement {
        let boundary = self
            .scope_boundary
            .unwrap_or(self.conditions.len())
            .min(self.conditions.len());
        let (own, scoped) = self.conditions.split_at(boundary);
        for (base, part) in [(0, own), (boundary, scoped)] {
            let (expr, params) = render_conditions(part, base);
            if let Some(expr) = expr {
                statement = statement.where_expr(&expr);
            }
            statement = statement.assign_map(params);
        }
        statement
    }
}

/// Render conditions to one mini-syntax expression plus its bindings.
/// `base_index` offsets placeholder names so fragments never collide.
fn render_conditions(
    conditions: &[(Connective, WhereCondition)],
    base_index: usize,
) -> (Option<String>, BTreeMap<String, Value>) {
    let mut params = BTreeMap::new();
    let mut rendered: Vec<(Connective, String)> = Vec::new();

    for (offset, (connective, condition)) in conditions.iter().enumerate() {
        if let Some(atom) = render_condition(base_index + offset, condition, &mut params) {
            rendered.push((*connective, atom));
        }
    }

    if rendered.is_empty() {
        return (None, params);
    }

    let mut expr = String::new();
    for (position, (connective, atom)) in rendered.into_iter().enumerate() {
        if position > 0 {
            expr.push_str(match connective {
                Connective::And => ", ",
                Connective::Or => " | ",
            });
        }
        expr.push_str(&atom);
    }
    (Some(expr), params)
}

fn render_condition(
    index: usize,
    condition: &WhereCondition,
    params: &mut BTreeMap<String, Value>,
) -> Option<String> {
    let column = &condition.column;
    match condition.operator {
        QueryOperator::Equal
        | QueryOperator::NotEqual
        | QueryOperator::GreaterThan
        | QueryOperator::GreaterThanOrEqual
        | QueryOperator::LessThan
        | QueryOperator::LessThanOrEqual
        | QueryOperator::Like
        | QueryOperator::NotLike => {
            let name = format!("w{index}");
            params.insert(name.clone(), condition.value.clone().unwrap_or(Value::Null));
            Some(format!("{column} {} :{name}", condition.operator))
        }
        QueryOperator::In => {
            if condition.values.is_empty() {
                // IN over nothing matches nothing.
                return Some(format!("{column} IS NULL, {column} IS NOT NULL"));
            }
            Some(render_list(index, column, "IN", &condition.values, params))
        }
        QueryOperator::NotIn => {
            if condition.values.is_empty() {
                // NOT IN over nothing matches everything; no fragment needed.
                return None;
            }
            Some(render_list(index, column, "NOT IN", &condition.values, params))
        }
        QueryOperator::Between | QueryOperator::NotBetween => {
            let low = format!("w{index}_lo");
            let high = format!("w{index}_hi");
            params.insert(
                low.clone(),
                condition.values.first().cloned().unwrap_or(Value::Null),
            );
            params.insert(
                high.clone(),
                condition.values.get(1).cloned().unwrap_or(Value::Null),
            );
            let keyword = if condition.operator == QueryOperator::NotBetween {
                "NOT BETWEEN"
            } else {
                "BETWEEN"
            };
            Some(format!("{column} {keyword} :{low} AND :{high}"))
        }
        QueryOperator::IsNull => Some(format!("{column} IS NULL")),
        QueryOperator::IsNotNull => Some(format!("{column} IS NOT NULL")),
    }
}

fn render_list(
    index: usize,
    column: &str,
    keyword: &str,
    values: &[Value],
    params: &mut BTreeMap<String, Value>,
) -> String {
    let mut placeholders = Vec::with_capacity(values.len());
    for (position, value) in values.iter().enumerate() {
        let name = format!("w{index}_{position}");
        params.insert(name.clone(), value.clone());
        placeholders.push(format!(":{name}"));
    }
    format!("{column} {keyword} ({})", placeholders.join(", "))
}
