//! Declared entity types and their field descriptors.
//!
//! A [`Schema`] is built once through a [`SchemaBuilder`] and shared as an
//! `Arc<Schema>`. Fields are kept in a `BTreeMap`, so every statement kind
//! (CREATE, INSERT, SELECT, UPDATE) walks them in the same order: sorted by
//! field name, scalar and foreign-key fields interleaved.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::datatype::ScalarType;
use crate::error::{OrmError, Result};

/// Name of the implicit identity column present on every table.
pub const IDENTITY: &str = "id";
/// Suffix appended to a foreign-key field to form its storage column.
pub const FOREIGN_KEY_SUFFIX: &str = "_id";
const IDENTITY_CLAUSE: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT";

/// SQLite reserves table names with this prefix for its own catalog.
const INTERNAL_PREFIX: &str = "sqlite_";

// Names are written into SQL unquoted, so none of them may be an SQLite keyword.
const KEYWORDS: &[&str] = &[
    "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as", "asc",
    "attach", "autoincrement", "before", "begin", "between", "by", "cascade", "case", "cast",
    "check", "collate", "column", "commit", "conflict", "constraint", "create", "cross",
    "current", "current_date", "current_time", "current_timestamp", "database", "default",
    "deferrable", "deferred", "delete", "desc", "detach", "distinct", "do", "drop", "each",
    "else", "end", "escape", "except", "exclude", "exclusive", "exists", "explain", "fail",
    "filter", "first", "following", "for", "foreign", "from", "full", "generated", "glob",
    "group", "groups", "having", "if", "ignore", "immediate", "in", "index", "indexed",
    "initially", "inner", "insert", "instead", "intersect", "into", "is", "isnull", "join",
    "key", "last", "left", "like", "limit", "match", "materialized", "natural", "no", "not",
    "nothing", "notnull", "null", "nulls", "of", "offset", "on", "or", "order", "others",
    "outer", "over", "partition", "plan", "pragma", "preceding", "primary", "query", "raise",
    "range", "recursive", "references", "regexp", "reindex", "release", "rename", "replace",
    "restrict", "returning", "right", "rollback", "row", "rows", "savepoint", "select", "set",
    "table", "temp", "temporary", "then", "ties", "to", "transaction", "trigger", "unbounded",
    "union", "unique", "update", "using", "vacuum", "values", "view", "virtual", "when",
    "where", "window", "with", "without",
];

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref RESERVED: HashSet<&'static str> = KEYWORDS.iter().copied().collect();
}

fn is_keyword(name: &str) -> bool {
    RESERVED.contains(name.to_ascii_lowercase().as_str())
}

// ------------- Field Descriptors -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    scalar: ScalarType,
}

impl Column {
    pub fn new(scalar: ScalarType) -> Self {
        Self { scalar }
    }
    /// Builds a column from a type name such as `"text"` or `"bool"`.
    pub fn parse(scalar: &str) -> Result<Self> {
        Ok(Self::new(scalar.parse()?))
    }
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar
    }
    pub fn sql_type(&self) -> &'static str {
        self.scalar.sql_type()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    references: Arc<Schema>,
}

impl ForeignKey {
    pub fn new(references: &Arc<Schema>) -> Self {
        Self {
            references: Arc::clone(references),
        }
    }
    pub fn references(&self) -> &Arc<Schema> {
        &self.references
    }
    pub fn sql_type(&self) -> &'static str {
        "INTEGER"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Column(Column),
    ForeignKey(ForeignKey),
}

impl Field {
    /// The storage column this field occupies when declared under `name`.
    pub fn column_name(&self, name: &str) -> String {
        match self {
            Field::Column(_) => name.to_string(),
            Field::ForeignKey(_) => format!("{name}{FOREIGN_KEY_SUFFIX}"),
        }
    }
    pub fn sql_type(&self) -> &'static str {
        match self {
            Field::Column(column) => column.sql_type(),
            Field::ForeignKey(foreign_key) => foreign_key.sql_type(),
        }
    }
    /// The scalar type values of this field are read back as.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Field::Column(column) => column.scalar_type(),
            Field::ForeignKey(_) => ScalarType::Integer,
        }
    }
    pub fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match self {
            Field::ForeignKey(foreign_key) => Some(foreign_key),
            Field::Column(_) => None,
        }
    }
}

impl From<Column> for Field {
    fn from(column: Column) -> Self {
        Field::Column(column)
    }
}

impl From<ForeignKey> for Field {
    fn from(foreign_key: ForeignKey) -> Self {
        Field::ForeignKey(foreign_key)
    }
}

// ------------- Schema -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    table: String,
    fields: BTreeMap<String, Field>,
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The type name lower-cased.
    pub fn table_name(&self) -> &str {
        &self.table
    }
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&str, &ForeignKey)> {
        self.fields()
            .filter_map(|(name, field)| field.as_foreign_key().map(|fk| (name, fk)))
    }
    /// Names of the declared fields that are not relations.
    pub fn scalar_fields(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, field)| matches!(field, Field::Column(_)))
            .map(|(name, _)| name)
            .collect()
    }
    /// Storage column names of every declared field, identity excluded.
    pub fn columns(&self) -> Vec<String> {
        self.fields()
            .map(|(name, field)| field.column_name(name))
            .collect()
    }
    /// Column clauses of the CREATE statement, identity first.
    pub fn create_columns(&self) -> Vec<String> {
        let mut clauses = vec![IDENTITY_CLAUSE.to_string()];
        clauses.extend(
            self.fields()
                .map(|(name, field)| format!("{} {}", field.column_name(name), field.sql_type())),
        );
        clauses
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields()
            .map(|(name, field)| match field {
                Field::Column(column) => format!("{name}: {}", column.scalar_type()),
                Field::ForeignKey(fk) => format!("{name}: -> {}", fk.references().name()),
            })
            .collect();
        write!(f, "{} {{{}}}", self.name, fields.join(", "))
    }
}

/// Collects field declarations and checks them once in [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: BTreeMap<String, Field>,
    error: Option<OrmError>,
}

impl SchemaBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: BTreeMap::new(),
            error: None,
        }
    }
    pub fn column(self, name: &str, scalar: ScalarType) -> Self {
        self.field(name, Column::new(scalar))
    }
    pub fn foreign_key(self, name: &str, references: &Arc<Schema>) -> Self {
        self.field(name, ForeignKey::new(references))
    }
    pub fn field(mut self, name: &str, field: impl Into<Field>) -> Self {
        if self.error.is_none() && self.fields.insert(name.to_string(), field.into()).is_some() {
            self.error = Some(OrmError::Schema(format!(
                "field '{name}' is declared twice on '{}'",
                self.name
            )));
        }
        self
    }
    pub fn build(self) -> Result<Arc<Schema>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !IDENTIFIER.is_match(&self.name) {
            return Err(OrmError::Schema(format!(
                "'{}' is not a valid type name",
                self.name
            )));
        }
        let table = self.name.to_lowercase();
        if is_keyword(&table) || table.starts_with(INTERNAL_PREFIX) {
            return Err(OrmError::Schema(format!(
                "'{}' cannot be used as a table name",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for (name, field) in &self.fields {
            if !IDENTIFIER.is_match(name) {
                return Err(OrmError::Schema(format!(
                    "'{name}' is not a valid field name on '{}'",
                    self.name
                )));
            }
            let column = field.column_name(name);
            if is_keyword(&column) {
                return Err(OrmError::Schema(format!(
                    "'{column}' is an SQL keyword and cannot name a column on '{}'",
                    self.name
                )));
            }
            if name == IDENTITY || column == IDENTITY {
                return Err(OrmError::Schema(format!(
                    "'{}' cannot declare '{IDENTITY}', it is the implicit identity",
                    self.name
                )));
            }
            if !seen.insert(column.clone()) {
                return Err(OrmError::Schema(format!(
                    "column '{column}' is produced by more than one field on '{}'",
                    self.name
                )));
            }
        }
        Ok(Arc::new(Schema {
            table,
            name: self.name,
            fields: self.fields,
        }))
    }
}
