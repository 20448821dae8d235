//! In-Memory Backend
//!
//! A reference [`Connection`] implementation backed by plain in-memory tables.
//! It evaluates the statement layer's mini WHERE syntax, assigns auto-increment
//! primary keys on insert, and counts executed statements so tests can assert
//! query budgets. Not intended for production storage.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use serde_json::Value;

use crate::backends::core::{Connection, Row, RowStream, Statement, StatementKind};
use crate::error::{OrmResult, QueryError};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    primary_key: String,
    next_id: i64,
}

impl Table {
    fn new(primary_key: &str) -> Self {
        Self {
            rows: Vec::new(),
            primary_key: primary_key.to_string(),
            next_id: 1,
        }
    }
}

/// In-memory database connection.
pub struct MemoryConnection {
    tables: Mutex<HashMap<String, Table>>,
    last_insert_id: Mutex<Value>,
    affected_rows: AtomicU64,
    statements_executed: AtomicUsize,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            last_insert_id: Mutex::new(Value::Null),
            affected_rows: AtomicU64::new(0),
            statements_executed: AtomicUsize::new(0),
        }
    }

    /// Override the auto-increment column for a table (defaults to `id`).
    pub fn set_primary_key(&self, table: &str, column: &str) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_insert_with(|| Table::new(column))
            .primary_key = column.to_string();
    }

    /// Insert rows directly, maintaining the auto-increment counter.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .entry(table.to_string())
            .or_insert_with(|| Table::new("id"));
        for mut row in rows {
            bump_auto_increment(table, &mut row);
            table.rows.push(row);
        }
    }

    /// Number of statements executed since construction or the last reset.
    pub fn statements_executed(&self) -> usize {
        self.statements_executed.load(AtomicOrdering::SeqCst)
    }

    pub fn reset_statement_count(&self) {
        self.statements_executed.store(0, AtomicOrdering::SeqCst);
    }

    fn record_statement(&self) {
        self.statements_executed.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn select_rows(&self, statement: &Statement) -> OrmResult<Vec<Row>> {
        let predicate = parse_wheres(&statement.wheres)?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Row> = match tables.get(&statement.table) {
            Some(table) => {
                let mut matched = Vec::new();
                for row in &table.rows {
                    if predicate.matches(row, &statement.params)? {
                        matched.push(row.clone());
                    }
                }
                matched
            }
            None => Vec::new(),
        };
        drop(tables);

        sort_rows(&mut rows, &statement.order)?;

        let offset = statement.offset.unwrap_or(0) as usize;
        let rows: Vec<Row> = rows.into_iter().skip(offset).collect();
        let rows: Vec<Row> = match statement.limit {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        };

        Ok(project(rows, &statement.columns))
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    fn query(&self, statement: &Statement) -> OrmResult<Vec<Row>> {
        self.record_statement();
        tracing::debug!(table = %statement.table, "memory backend select");
        self.select_rows(statement)
    }

    fn lazy(&self, statement: &Statement) -> OrmResult<RowStream> {
        self.record_statement();
        let rows = self.select_rows(statement)?;
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn execute(&self, statement: &Statement) -> OrmResult<u64> {
        self.record_statement();
        tracing::debug!(table = %statement.table, kind = ?statement.kind, "memory backend write");
        let affected = match statement.kind {
            StatementKind::Insert => {
                let mut tables = self.tables.lock().unwrap();
                let table = tables
                    .entry(statement.table.clone())
                    .or_insert_with(|| Table::new("id"));
                let mut row = Row::new();
                for column in &statement.columns {
                    let value = statement.params.get(column).cloned().unwrap_or(Value::Null);
                    row.insert(column.clone(), value);
                }
                bump_auto_increment(table, &mut row);
                let id = row.get(&table.primary_key).cloned().unwrap_or(Value::Null);
                table.rows.push(row);
                *self.last_insert_id.lock().unwrap() = id;
                1
            }
            StatementKind::Update => {
                let predicate = parse_wheres(&statement.wheres)?;
                let mut tables = self.tables.lock().unwrap();
                let mut affected = 0;
                if let Some(table) = tables.get_mut(&statement.table) {
                    for row in table.rows.iter_mut() {
                        if predicate.matches(row, &statement.params)? {
                            for column in &statement.columns {
                                let value =
                                    statement.params.get(column).cloned().unwrap_or(Value::Null);
                                row.insert(column.clone(), value);
                            }
                            affected += 1;
                        }
                    }
                }
                affected
            }
            StatementKind::Delete => {
                let predicate = parse_wheres(&statement.wheres)?;
                let mut tables = self.tables.lock().unwrap();
                let mut affected = 0;
                if let Some(table) = tables.get_mut(&statement.table) {
                    let mut kept = Vec::with_capacity(table.rows.len());
                    for row in table.rows.drain(..) {
                        if predicate.matches(&row, &statement.params)? {
                            affected += 1;
                        } else {
                            kept.push(row);
                        }
                    }
                    table.rows = kept;
                }
                affected
            }
            StatementKind::Select => {
                return Err(
                    QueryError::UnsupportedOperation("execute() on a SELECT".to_string()).into(),
                )
            }
        };
        self.affected_rows.store(affected, AtomicOrdering::SeqCst);
        Ok(affected)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(self.last_insert_id.lock().unwrap().clone())
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows.load(AtomicOrdering::SeqCst)
    }
}

fn bump_auto_increment(table: &mut Table, row: &mut Row) {
    let pk = table.primary_key.clone();
    match row.get(&pk) {
        None | Some(Value::Null) => {
            row.insert(pk, Value::from(table.next_id));
            table.next_id += 1;
        }
        Some(Value::Number(n)) => {
            if let Some(id) = n.as_i64() {
                table.next_id = table.next_id.max(id + 1);
            }
        }
        _ => {}
    }
}

fn project(rows: Vec<Row>, columns: &[String]) -> Vec<Row> {
    if columns.len() == 1 && columns[0].eq_ignore_ascii_case("COUNT(*)") {
        let mut row = Row::new();
        row.insert("COUNT(*)".to_string(), Value::from(rows.len() as u64));
        return vec![row];
    }
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return rows;
    }
    rows.into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

fn sort_rows(rows: &mut [Row], order: &[String]) -> OrmResult<()> {
    // Later keys first so earlier keys dominate under stable sorting.
    for expr in order.iter().rev() {
        let (column, descending) = parse_order(expr)?;
        rows.sort_by(|a, b| {
            let ord = compare_sort_values(
                a.get(&column).unwrap_or(&Value::Null),
                b.get(&column).unwrap_or(&Value::Null),
            );
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
    Ok(())
}

fn parse_order(expr: &str) -> OrmResult<(String, bool)> {
    let mut parts = expr.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| QueryError::InvalidExpression(format!("empty order '{expr}'")))?;
    let descending = match parts.next() {
        None => false,
        Some(dir) if dir.eq_ignore_ascii_case("ASC") => false,
        Some(dir) if dir.eq_ignore_ascii_case("DESC") => true,
        Some(dir) => {
            return Err(QueryError::InvalidExpression(format!("order direction '{dir}'")).into())
        }
    };
    Ok((column.to_string(), descending))
}

fn compare_sort_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ---------------------------------------------------------------------------
// WHERE mini-syntax evaluation
// ---------------------------------------------------------------------------

/// Parsed predicate: OR over AND over atoms. Fragment lists are AND-joined.
struct Predicate {
    groups: Vec<Vec<Vec<Atom>>>,
}

enum Atom {
    Compare {
        column: String,
        op: CompareOp,
        param: String,
    },
    In {
        column: String,
        params: Vec<String>,
        negated: bool,
    },
    Between {
        column: String,
        low: String,
        high: String,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
}

#[derive(Clone, Copy)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

fn parse_wheres(wheres: &[String]) -> OrmResult<Predicate> {
    let mut groups = Vec::new();
    for fragment in wheres {
        let mut or_groups = Vec::new();
        for or_part in split_top_level(fragment, '|') {
            let mut atoms = Vec::new();
            for and_part in split_top_level(&or_part, ',') {
                atoms.push(parse_atom(and_part.trim())?);
            }
            or_groups.push(atoms);
        }
        groups.push(or_groups);
    }
    Ok(Predicate { groups })
}

/// Split on a separator, ignoring separators inside parentheses.
fn split_top_level(expr: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in expr.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c == separator && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn parse_atom(atom: &str) -> OrmResult<Atom> {
    if atom.is_empty() {
        return Err(QueryError::InvalidExpression("empty atom".to_string()).into());
    }

    if let Some(open) = atom.find('(') {
        // col IN (...) / col NOT IN (...)
        let head: Vec<&str> = atom[..open].split_whitespace().collect();
        let close = atom
            .rfind(')')
            .ok_or_else(|| QueryError::InvalidExpression(format!("unclosed list in '{atom}'")))?;
        let params: Vec<String> = atom[open + 1..close]
            .split(',')
            .map(|p| placeholder_name(p.trim()))
            .collect::<Result<_, _>>()?;
        return match head.as_slice() {
            [column, keyword] if keyword.eq_ignore_ascii_case("IN") => Ok(Atom::In {
                column: (*column).to_string(),
                params,
                negated: false,
            }),
            [column, not, keyword]
                if not.eq_ignore_ascii_case("NOT") && keyword.eq_ignore_ascii_case("IN") =>
            {
                Ok(Atom::In {
                    column: (*column).to_string(),
                    params,
                    negated: true,
                })
            }
            _ => Err(QueryError::InvalidExpression(format!("bad list atom '{atom}'")).into()),
        };
    }

    let tokens: Vec<&str> = atom.split_whitespace().collect();
    match tokens.as_slice() {
        // Bare column auto-binds to a same-named placeholder.
        [column] => Ok(Atom::Compare {
            column: (*column).to_string(),
            op: CompareOp::Eq,
            param: (*column).to_string(),
        }),
        [column, is, null]
            if is.eq_ignore_ascii_case("IS") && null.eq_ignore_ascii_case("NULL") =>
        {
            Ok(Atom::Null {
                column: (*column).to_string(),
                negated: false,
            })
        }
        [column, is, not, null]
            if is.eq_ignore_ascii_case("IS")
                && not.eq_ignore_ascii_case("NOT")
                && null.eq_ignore_ascii_case("NULL") =>
        {
            Ok(Atom::Null {
                column: (*column).to_string(),
                negated: true,
            })
        }
        [column, between, low, and, high]
            if between.eq_ignore_ascii_case("BETWEEN") && and.eq_ignore_ascii_case("AND") =>
        {
            Ok(Atom::Between {
                column: (*column).to_string(),
                low: placeholder_name(low)?,
                high: placeholder_name(high)?,
                negated: false,
            })
        }
        [column, not, between, low, and, high]
            if not.eq_ignore_ascii_case("NOT")
                && between.eq_ignore_ascii_case("BETWEEN")
                && and.eq_ignore_ascii_case("AND") =>
        {
            Ok(Atom::Between {
                column: (*column).to_string(),
                low: placeholder_name(low)?,
                high: placeholder_name(high)?,
                negated: true,
            })
        }
        [column, not, like, param]
            if not.eq_ignore_ascii_case("NOT") && like.eq_ignore_ascii_case("LIKE") =>
        {
            Ok(Atom::Compare {
                column: (*column).to_string(),
                op: CompareOp::NotLike,
                param: placeholder_name(param)?,
            })
        }
        [column, op, param] => {
            let op = match *op {
                "=" => CompareOp::Eq,
                "!=" | "<>" => CompareOp::Ne,
                ">" => CompareOp::Gt,
                ">=" => CompareOp::Gte,
                "<" => CompareOp::Lt,
                "<=" => CompareOp::Lte,
                other if other.eq_ignore_ascii_case("LIKE") => CompareOp::Like,
                other => {
                    return Err(
                        QueryError::InvalidExpression(format!("operator '{other}'")).into(),
                    )
                }
            };
            Ok(Atom::Compare {
                column: (*column).to_string(),
                op,
                param: placeholder_name(param)?,
            })
        }
        _ => Err(QueryError::InvalidExpression(format!("bad atom '{atom}'")).into()),
    }
}

fn placeholder_name(token: &str) -> Result<String, QueryError> {
    token
        .strip_prefix(':')
        .map(str::to_string)
        .ok_or_else(|| QueryError::InvalidExpression(format!("expected placeholder, got '{token}'")))
}

impl Predicate {
    fn matches(&self, row: &Row, params: &BindMap) -> OrmResult<bool> {
        for fragment in &self.groups {
            let mut fragment_ok = false;
            for and_group in fragment {
                let mut group_ok = true;
                for atom in and_group {
                    if !atom.matches(row, params)? {
                        group_ok = false;
                        break;
                    }
                }
                if group_ok {
                    fragment_ok = true;
                    break;
                }
            }
            if !fragment_ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

type BindMap = std::collections::BTreeMap<String, Value>;

fn bound<'a>(params: &'a BindMap, name: &str) -> OrmResult<&'a Value> {
    params
        .get(name)
        .ok_or_else(|| QueryError::MissingParameter(name.to_string()).into())
}

impl Atom {
    fn matches(&self, row: &Row, params: &BindMap) -> OrmResult<bool> {
        match self {
            Atom::Compare { column, op, param } => {
                let actual = row.get(column).unwrap_or(&Value::Null);
                let expected = bound(params, param)?;
                Ok(compare(actual, *op, expected))
            }
            Atom::In {
                column,
                params: names,
                negated,
            } => {
                let actual = row.get(column).unwrap_or(&Value::Null);
                if actual.is_null() {
                    return Ok(false);
                }
                let mut found = false;
                for name in names {
                    if values_equal(actual, bound(params, name)?) {
                        found = true;
                        break;
                    }
                }
                Ok(found != *negated)
            }
            Atom::Between {
                column,
                low,
                high,
                negated,
            } => {
                let actual = row.get(column).unwrap_or(&Value::Null);
                if actual.is_null() {
                    return Ok(false);
                }
                let low = bound(params, low)?;
                let high = bound(params, high)?;
                let inside = matches!(
                    order_values(actual, low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    order_values(actual, high),
                    Some(Ordering::Less | Ordering::Equal)
                );
                Ok(inside != *negated)
            }
            Atom::Null { column, negated } => {
                let is_null = row.get(column).map(Value::is_null).unwrap_or(true);
                Ok(is_null != *negated)
            }
        }
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::Ne => !actual.is_null() && !values_equal(actual, expected),
        CompareOp::Gt => matches!(order_values(actual, expected), Some(Ordering::Greater)),
        CompareOp::Gte => matches!(
            order_values(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lt => matches!(order_values(actual, expected), Some(Ordering::Less)),
        CompareOp::Lte => matches!(
            order_values(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Like => like_match(actual, expected),
        CompareOp::NotLike => {
            !actual.is_null() && !expected.is_null() && !like_match(actual, expected)
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn order_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn like_match(actual: &Value, pattern: &Value) -> bool {
    let (Value::String(text), Value::String(pattern)) = (actual, pattern) else {
        return false;
    };
    fn matches(text: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => {
                (0..=text.len()).any(|skip| matches(&text[skip..], rest))
            }
            Some(('_', rest)) => !text.is_empty() && matches(&text[1..], rest),
            Some((ch, rest)) => text.first() == Some(ch) && matches(&text[1..], rest),
        }
    }
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    matches(&text, &pattern)
}
