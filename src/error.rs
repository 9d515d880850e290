use rusqlite::types::Value as SqlValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("No row in '{table}' with id {id}")]
    NotFound { table: String, id: i64 },
    #[error("Integrity error: {message} (sql: {sql}, params: {params:?})")]
    Integrity {
        sql: String,
        params: Vec<SqlValue>,
        message: String,
    },
    #[error("Field '{field}' references an unsaved '{table}' instance")]
    UnsavedReference { field: String, table: String },
    #[error("Cannot {operation} a '{table}' instance that has no id")]
    MissingIdentity {
        table: String,
        operation: &'static str,
    },
    #[error("Instance of '{table}' was already saved with id {id}")]
    AlreadyPersisted { table: String, id: i64 },
    #[error("'{table}' declares no field named '{field}'")]
    UnknownField { table: String, field: String },
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, OrmError>;

// Helper conversions
impl From<rusqlite::Error> for OrmError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<config::ConfigError> for OrmError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
