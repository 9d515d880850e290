use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;

use crate::datatype::Value;
use crate::entity::Instance;
use crate::error::{OrmError, Result};
use crate::observe::{Sink, TracingSink};
use crate::persist::Persistor;
use crate::schema::Schema;
use crate::settings::{IN_MEMORY, Settings};
use crate::sql::{self, QueryBuf};

// ------------- Database -------------
/// The ORM engine: owns one SQLite connection and runs generated SQL on it.
///
/// The connection sits behind a mutex, so a `Database` can be shared between
/// threads through an `Arc`; calls are serialized and each one commits on its
/// own. Nothing spans several statements, so saving a referencing instance
/// fails with [`OrmError::UnsavedReference`] until the instance it points to
/// has been saved (and has an id).
pub struct Database {
    path: String,
    persistor: Mutex<Persistor>,
    sink: Arc<dyn Sink>,
    log_statements: bool,
}

impl Database {
    pub fn new(path: &str, persistor: Persistor, sink: Arc<dyn Sink>) -> Self {
        Self {
            path: path.to_string(),
            persistor: Mutex::new(persistor),
            sink,
            log_statements: true,
        }
    }
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(
            &path.to_string_lossy(),
            Persistor::open(path)?,
            Arc::new(TracingSink),
        ))
    }
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(
            IN_MEMORY,
            Persistor::in_memory()?,
            Arc::new(TracingSink),
        ))
    }
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::from_settings_with_sink(settings, Arc::new(TracingSink))
    }
    pub fn from_settings_with_sink(settings: &Settings, sink: Arc<dyn Sink>) -> Result<Self> {
        let path = &settings.database.path;
        let persistor = if path == IN_MEMORY {
            Persistor::in_memory()?
        } else {
            Persistor::open(path)?
        };
        let mut database = Self::new(path, persistor, sink);
        database.log_statements = settings.database.log_statements;
        Ok(database)
    }
    pub fn path(&self) -> &str {
        &self.path
    }

    fn persistor(&self) -> Result<MutexGuard<'_, Persistor>> {
        self.persistor
            .lock()
            .map_err(|e| OrmError::Lock(e.to_string()))
    }
    fn statement(&self, query: &QueryBuf) {
        if self.log_statements {
            self.sink.info(&query.sql);
        }
    }
    fn report(&self, error: OrmError) -> OrmError {
        self.sink.error(&error.to_string());
        error
    }
    fn integrity(&self, query: &QueryBuf, error: rusqlite::Error) -> OrmError {
        self.report(OrmError::Integrity {
            sql: query.sql.clone(),
            params: query.params.clone(),
            message: error.to_string(),
        })
    }
    fn driver(&self, error: rusqlite::Error) -> OrmError {
        self.report(error.into())
    }

    /// Creates the table for `schema` unless it already exists.
    pub fn create(&self, schema: &Schema) -> Result<()> {
        let query = sql::create_table(schema);
        self.statement(&query);
        self.persistor()?
            .execute(&query)
            .map_err(|e| self.driver(e))?;
        Ok(())
    }

    /// Inserts the instance and writes the assigned identity back into it.
    /// The id stays unset when the insert fails.
    pub fn save(&self, instance: &mut Instance) -> Result<i64> {
        if let Some(id) = instance.id() {
            return Err(self.report(OrmError::AlreadyPersisted {
                table: instance.schema().table_name().to_string(),
                id,
            }));
        }
        let query = sql::insert(instance).map_err(|e| self.report(e))?;
        self.statement(&query);
        let id = self
            .persistor()?
            .insert(&query)
            .map_err(|e| self.integrity(&query, e))?;
        instance.assign_id(id);
        Ok(id)
    }

    /// Every row of the table. Foreign keys are left as raw ids.
    pub fn all(&self, schema: &Arc<Schema>) -> Result<Vec<Instance>> {
        let query = sql::select_all(schema);
        self.statement(&query);
        let rows = self
            .persistor()?
            .fetch_all(&query)
            .map_err(|e| self.driver(e))?;
        rows.into_iter().map(|row| hydrate(schema, row)).collect()
    }

    /// The row with the given id, with its foreign keys resolved one hop deep.
    pub fn get(&self, schema: &Arc<Schema>, id: i64) -> Result<Instance> {
        let persistor = self.persistor()?;
        let mut instance = self.load(&persistor, schema, id)?;
        for (name, foreign_key) in schema.foreign_keys() {
            let referenced = match instance.get(name) {
                Some(Value::Integer(referenced)) => *referenced,
                _ => continue,
            };
            let related = self.load(&persistor, foreign_key.references(), referenced)?;
            instance.set(name, related)?;
        }
        Ok(instance)
    }

    fn load(&self, persistor: &Persistor, schema: &Arc<Schema>, id: i64) -> Result<Instance> {
        let query = sql::select_by_id(schema, id);
        self.statement(&query);
        let row = persistor
            .fetch_one(&query)
            .map_err(|e| self.driver(e))?
            .ok_or_else(|| {
                self.report(OrmError::NotFound {
                    table: schema.table_name().to_string(),
                    id,
                })
            })?;
        hydrate(schema, row)
    }

    /// Overwrites the stored row with every current field value.
    pub fn update(&self, instance: &Instance) -> Result<()> {
        let query = sql::update(instance).map_err(|e| self.report(e))?;
        self.statement(&query);
        let changed = self
            .persistor()?
            .execute(&query)
            .map_err(|e| self.integrity(&query, e))?;
        self.require_row(instance, changed)
    }

    pub fn delete(&self, instance: &Instance) -> Result<()> {
        let query = sql::delete(instance).map_err(|e| self.report(e))?;
        self.statement(&query);
        let removed = self
            .persistor()?
            .execute(&query)
            .map_err(|e| self.driver(e))?;
        self.require_row(instance, removed)
    }

    fn require_row(&self, instance: &Instance, affected: usize) -> Result<()> {
        match (affected, instance.id()) {
            (0, Some(id)) => Err(self.report(OrmError::NotFound {
                table: instance.schema().table_name().to_string(),
                id,
            })),
            _ => Ok(()),
        }
    }

    /// Table names as the SQLite catalog reports them right now.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.persistor()?
            .table_names()
            .map_err(|e| self.driver(e))
    }
}

/// Builds an instance from a row laid out as `id, <columns>`.
fn hydrate(schema: &Arc<Schema>, row: Vec<SqlValue>) -> Result<Instance> {
    let mut values = row.into_iter();
    let id = match values.next() {
        Some(SqlValue::Integer(id)) => id,
        other => {
            return Err(OrmError::Persistence(format!(
                "expected an integer id for '{}', got {other:?}",
                schema.table_name()
            )));
        }
    };
    let mut instance = Instance::new(schema);
    for ((name, field), value) in schema.fields().zip(values) {
        instance.set(name, Value::from_sql(value, field.scalar_type()))?;
    }
    instance.assign_id(id);
    Ok(instance)
}
