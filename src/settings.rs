//! Engine settings: built-in defaults, then an optional settings file, then
//! `VRAXION_*` environment variables (`__` separates nesting levels, e.g.
//! `VRAXION_DATABASE__PATH=/tmp/app.db`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

pub const DEFAULT_PATH: &str = "vraxion.db";
/// Database path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    pub path: String,
    /// Report every executed statement through the sink's `info`.
    pub log_statements: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            log_statements: true,
        }
    }
}

impl Settings {
    /// Loads settings, reading `file` when given and present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database.path", DEFAULT_PATH)?
            .set_default("database.log_statements", true)?;
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("VRAXION")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseSettings {
                path: IN_MEMORY.to_string(),
                ..DatabaseSettings::default()
            },
        }
    }
}
