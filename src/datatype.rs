// used for persistence
use rusqlite::types::Value as SqlValue;

// used when parsing a scalar type from its declared name
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;

use crate::entity::Instance;
use crate::error::OrmError;

// ------------- Scalar Types --------------
/// The fixed set of scalar kinds a [`Column`](crate::schema::Column) may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

impl ScalarType {
    /// The SQLite storage type used for columns of this kind.
    ///
    /// Booleans have no storage type of their own and are kept as 0/1 integers.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ScalarType::Integer => "INTEGER",
            ScalarType::Real => "REAL",
            ScalarType::Text => "TEXT",
            ScalarType::Blob => "BLOB",
            ScalarType::Boolean => "INTEGER",
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Integer => "integer",
            ScalarType::Real => "real",
            ScalarType::Text => "text",
            ScalarType::Blob => "blob",
            ScalarType::Boolean => "boolean",
        }
    }
}

impl FromStr for ScalarType {
    type Err = OrmError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(ScalarType::Integer),
            "real" | "float" => Ok(ScalarType::Real),
            "text" | "str" => Ok(ScalarType::Text),
            "blob" | "bytes" => Ok(ScalarType::Blob),
            "boolean" | "bool" => Ok(ScalarType::Boolean),
            _ => Err(OrmError::Schema(format!("unknown scalar type '{s}'"))),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- Values --------------
/// A field value held by an [`Instance`].
///
/// Foreign-key fields hold either a [`Value::Reference`] to the related
/// instance or, when loaded without resolution, its raw [`Value::Integer`] id.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
    Reference(Box<Instance>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Reference(instance) => Some(instance),
            _ => None,
        }
    }

    /// Lowers a scalar value into something SQLite can bind.
    /// References have no scalar form and yield `None`.
    pub(crate) fn to_sql(&self) -> Option<SqlValue> {
        Some(match self {
            Value::Null => SqlValue::Null,
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::Real(r) => SqlValue::Real(*r),
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Blob(b) => SqlValue::Blob(b.clone()),
            Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
            Value::Reference(_) => return None,
        })
    }

    /// Lifts a stored value back using the declared scalar type of its column.
    /// Values stored under a different affinity are passed through as they are.
    pub(crate) fn from_sql(value: SqlValue, scalar: ScalarType) -> Self {
        match (scalar, value) {
            (_, SqlValue::Null) => Value::Null,
            (ScalarType::Boolean, SqlValue::Integer(i)) => Value::Boolean(i != 0),
            (ScalarType::Real, SqlValue::Integer(i)) => Value::Real(i as f64),
            (_, SqlValue::Integer(i)) => Value::Integer(i),
            (_, SqlValue::Real(r)) => Value::Real(r),
            (_, SqlValue::Text(s)) => Value::Text(s),
            (_, SqlValue::Blob(b)) => Value::Blob(b),
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Value::from(*r),
            Value::Text(s) => serde_json::Value::from(s.as_str()),
            Value::Blob(b) => serde_json::Value::from(b.clone()),
            Value::Boolean(b) => serde_json::Value::from(*b),
            Value::Reference(instance) => instance.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Reference(instance) => write!(f, "{instance}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}
impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Reference(Box::new(v))
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types_map_to_storage_types() {
        assert_eq!(ScalarType::Integer.sql_type(), "INTEGER");
        assert_eq!(ScalarType::Real.sql_type(), "REAL");
        assert_eq!(ScalarType::Text.sql_type(), "TEXT");
        assert_eq!(ScalarType::Blob.sql_type(), "BLOB");
        assert_eq!(ScalarType::Boolean.sql_type(), "INTEGER");
    }

    #[test]
    fn unknown_scalar_name_is_a_schema_error() {
        assert_eq!("Bool".parse::<ScalarType>().unwrap(), ScalarType::Boolean);
        let err = "decimal".parse::<ScalarType>().unwrap_err();
        assert!(matches!(err, OrmError::Schema(_)));
    }

    #[test]
    fn booleans_lower_to_integers_and_lift_back() {
        assert_eq!(Value::from(true).to_sql(), Some(SqlValue::Integer(1)));
        assert_eq!(
            Value::from_sql(SqlValue::Integer(0), ScalarType::Boolean),
            Value::Boolean(false)
        );
        assert_eq!(
            Value::from_sql(SqlValue::Integer(3), ScalarType::Real),
            Value::Real(3.0)
        );
    }
}
