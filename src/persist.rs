// used for persistence
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use std::path::Path;
use tracing::trace;

use crate::sql::QueryBuf;

// ------------- Persistence -------------
/// Thin synchronous wrapper around one SQLite connection.
///
/// Errors are returned as raw `rusqlite` errors so the caller can decide how
/// to classify them (integrity failure, missing row, other driver error).
pub struct Persistor {
    connection: Connection,
}

impl Persistor {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        Ok(Self::new(Connection::open(path)?))
    }
    pub fn in_memory() -> rusqlite::Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
    /// Runs a statement and returns the number of affected rows.
    pub fn execute(&self, query: &QueryBuf) -> rusqlite::Result<usize> {
        trace!(sql = %query.sql, params = query.params.len(), "execute");
        let mut statement = self.connection.prepare_cached(&query.sql)?;
        statement.execute(params_from_iter(&query.params))
    }
    /// Runs an insert and returns the identity SQLite assigned to the new row.
    pub fn insert(&self, query: &QueryBuf) -> rusqlite::Result<i64> {
        self.execute(query)?;
        Ok(self.connection.last_insert_rowid())
    }
    pub fn fetch_all(&self, query: &QueryBuf) -> rusqlite::Result<Vec<Vec<SqlValue>>> {
        trace!(sql = %query.sql, params = query.params.len(), "fetch all");
        let mut statement = self.connection.prepare_cached(&query.sql)?;
        let width = statement.column_count();
        let rows = statement.query_map(params_from_iter(&query.params), |row| {
            (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;
        rows.collect()
    }
    pub fn fetch_one(&self, query: &QueryBuf) -> rusqlite::Result<Option<Vec<SqlValue>>> {
        trace!(sql = %query.sql, params = query.params.len(), "fetch one");
        let mut statement = self.connection.prepare_cached(&query.sql)?;
        let width = statement.column_count();
        statement
            .query_row(params_from_iter(&query.params), |row| {
                (0..width)
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .optional()
    }
    /// User tables as recorded in the SQLite catalog, sorted by name.
    pub fn table_names(&self) -> rusqlite::Result<Vec<String>> {
        let mut statement = self.connection.prepare_cached(
            "
            select name
                from sqlite_master
                where type = 'table'
                and substr(name, 1, 7) <> 'sqlite_'
                order by name
            ",
        )?;
        let names = statement.query_map([], |row| row.get::<_, String>(0))?;
        names.collect()
    }
}
