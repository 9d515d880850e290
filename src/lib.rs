//! Vraxion – a minimal object-relational mapper bound to SQLite.
//!
//! Entity types are declared as data, not discovered at runtime:
//! * A [`schema::Schema`] names a type and holds its field descriptors.
//! * A [`schema::Column`] declares a scalar field of one [`datatype::ScalarType`].
//! * A [`schema::ForeignKey`] declares a relation to another schema and is stored
//!   in a `<field>_id INTEGER` column.
//! * Every table also carries the implicit identity `id INTEGER PRIMARY KEY AUTOINCREMENT`.
//!
//! Fields are kept sorted by name, and that single order is used by every
//! statement the crate generates, so values can be zipped positionally against
//! column lists.
//!
//! ## Modules
//! * [`datatype`] – scalar kinds and the [`datatype::Value`] held by instances.
//! * [`schema`] – field descriptors, [`schema::Schema`] and its builder.
//! * [`entity`] – [`entity::Instance`], one row's worth of field values.
//! * [`sql`] – pure builders of parameterized CREATE/INSERT/SELECT/UPDATE/DELETE.
//! * [`persist`] – the [`persist::Persistor`] wrapping the rusqlite connection.
//! * [`database`] – the [`database::Database`] engine tying it all together.
//! * [`observe`] – the [`observe::Sink`] the engine reports through.
//! * [`settings`] – file and environment configuration.
//!
//! ## Quick Start
//! ```
//! use vraxion::{Database, Instance, ScalarType, Schema};
//! let author = Schema::builder("Author")
//!     .column("name", ScalarType::Text)
//!     .column("age", ScalarType::Integer)
//!     .build()
//!     .unwrap();
//! let db = Database::open_in_memory().unwrap();
//! db.create(&author).unwrap();
//! let mut michael = Instance::new(&author)
//!     .with("name", "Michael").unwrap()
//!     .with("age", 31).unwrap();
//! assert_eq!(db.save(&mut michael).unwrap(), 1);
//! let loaded = db.get(&author, 1).unwrap();
//! assert_eq!(loaded.get("name"), michael.get("name"));
//! assert_eq!(db.tables().unwrap(), vec!["author"]);
//! ```
//!
//! ## Relations
//! [`database::Database::get`] resolves each foreign key by loading the
//! referenced row, exactly one hop deep. [`database::Database::all`] leaves
//! foreign keys as raw ids so bulk scans issue a single query.

pub mod database;
pub mod datatype;
pub mod entity;
pub mod error;
pub mod observe;
pub mod persist;
pub mod schema;
pub mod settings;
pub mod sql;

pub use database::Database;
pub use datatype::{ScalarType, Value};
pub use entity::Instance;
pub use error::{OrmError, Result};
pub use schema::{Column, Field, ForeignKey, Schema, SchemaBuilder};
pub use settings::Settings;
