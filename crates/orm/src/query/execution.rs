//! Query Builder execution
//!
//! Terminal operations: they apply global scopes, compile, execute through
//! the statement layer, and hydrate rows into models. Requested eager loads
//! run after the root query.

use serde_json::Value;

use crate::backends::RowStream;
use crate::collection::ModelCollection;
use crate::database::Database;
use crate::error::{ModelError, OrmResult};
use crate::loading::load_related;
use crate::model::{EntityDef, Model};
use crate::query::builder::ModelQuery;

impl ModelQuery {
    /// Execute and return all matching models.
    pub fn get(self) -> OrmResult<ModelCollection> {
        let query = self.prepare();
        let statement = query.to_statement();
        tracing::debug!(entity = %query.def.name, "executing select");
        let rows = query.database.connection().query(&statement)?;
        let mut collection: ModelCollection = rows
            .into_iter()
            .map(|row| Model::hydrate(query.def, &query.database, row))
            .collect();
        if !query.eager_load.is_empty() {
            load_related(
                &query.database,
                query.def,
                collection.as_mut_slice(),
                &query.eager_load,
            )?;
        }
        Ok(collection)
    }

    /// Execute and return the first matching model.
    pub fn first(self) -> OrmResult<Option<Model>> {
        Ok(self.limit(1).get()?.into_iter().next())
    }

    /// Execute and return the first matching model, or a typed not-found
    /// error.
    pub fn first_or_fail(self) -> OrmResult<Model> {
        let table = self.def.table.clone();
        self.first()?.ok_or(ModelError::NotFound(table))
    }

    /// Look up by primary key.
    pub fn find<V: Into<Value>>(self, id: V) -> OrmResult<Option<Model>> {
        let primary_key = self.def.primary_key.clone();
        self.where_eq(&primary_key, id.into()).first()
    }

    /// Look up by primary key, or a typed not-found error.
    pub fn find_or_fail<V: Into<Value>>(self, id: V) -> OrmResult<Model> {
        let table = self.def.table.clone();
        self.find(id)?.ok_or(ModelError::NotFound(table))
    }

    /// Count matching rows.
    pub fn count(self) -> OrmResult<u64> {
        let query = self.prepare();
        let statement = query.count_statement();
        let rows = query.database.connection().query(&statement)?;
        let count = rows
            .first()
            .and_then(|row| row.get("COUNT(*)"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(count)
    }

    /// Whether any row matches.
    pub fn exists(self) -> OrmResult<bool> {
        Ok(self.count()? > 0)
    }

    /// First matching row's value for one column, bypassing hydration.
    pub fn value(self, column: &str) -> OrmResult<Option<Value>> {
        let query = self.select([column]).limit(1).prepare();
        let statement = query.to_statement();
        let rows = query.database.connection().query(&statement)?;
        Ok(rows.first().and_then(|row| row.get(column)).cloned())
    }

    /// One column from every matching row, in query order.
    pub fn pluck(self, column: &str) -> OrmResult<Vec<Value>> {
        let query = self.select([column]).prepare();
        let statement = query.to_statement();
        let rows = query.database.connection().query(&statement)?;
        Ok(rows
            .into_iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Fetch in LIMIT/OFFSET batches. The callback returns `false` to stop
    /// early.
    pub fn chunk<F>(self, size: u64, mut callback: F) -> OrmResult<()>
    where
        F: FnMut(ModelCollection) -> OrmResult<bool>,
    {
        if size == 0 {
            return Err(ModelError::Query("chunk size must be positive".to_string()));
        }
        let query = self.prepare();
        let mut offset = query.offset_count.unwrap_or(0);
        loop {
            let batch = query.clone().limit(size).offset(offset).get()?;
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len() as u64;
            if !callback(batch)? {
                break;
            }
            if batch_len < size {
                break;
            }
            offset += size;
        }
        Ok(())
    }

    /// Lazy one-row-at-a-time iteration. Finite, not restartable; eager
    /// loads do not apply.
    pub fn cursor(self) -> OrmResult<ModelCursor> {
        let query = self.prepare();
        let statement = query.to_statement();
        let stream = query.database.connection().lazy(&statement)?;
        Ok(ModelCursor {
            def: query.def,
            database: query.database,
            stream,
        })
    }
}

/// Iterator over lazily-fetched models.
pub struct ModelCursor {
    def: &'static EntityDef,
    database: Database,
    stream: RowStream,
}

impl Iterator for ModelCursor {
    type Item = OrmResult<Model>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.stream.next()?;
        Some(row.map(|row| Model::hydrate(self.def, &self.database, row)))
    }
}
