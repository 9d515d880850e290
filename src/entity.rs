use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::datatype::Value;
use crate::error::{OrmError, Result};
use crate::schema::{IDENTITY, Schema};

// ------------- Instance -------------
/// One row's worth of values for a declared [`Schema`].
///
/// Only declared fields can be written, and the identity is assigned by the
/// [`Database`](crate::database::Database) on the first successful save.
/// Values are not checked against the declared scalar types.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    schema: Arc<Schema>,
    id: Option<i64>,
    values: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            id: None,
            values: BTreeMap::new(),
        }
    }
    /// Builds an instance with exactly the given fields initialized.
    pub fn from_values<I, K, V>(schema: &Arc<Schema>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut instance = Self::new(schema);
        for (field, value) in values {
            instance.set(field.as_ref(), value)?;
        }
        Ok(instance)
    }
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        if self.schema.field(field).is_none() {
            return Err(OrmError::UnknownField {
                table: self.schema.table_name().to_string(),
                field: field.to_string(),
            });
        }
        self.values.insert(field.to_string(), value.into());
        Ok(())
    }
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
    /// The related instance behind a resolved foreign key.
    pub fn reference(&self, field: &str) -> Option<&Instance> {
        self.get(field).and_then(Value::as_instance)
    }
    pub fn id(&self) -> Option<i64> {
        self.id
    }
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(IDENTITY.to_string(), serde_json::Value::from(self.id));
        for (name, value) in self.values() {
            object.insert(name.to_string(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self
            .values()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        match self.id {
            Some(id) => write!(f, "{}#{id}({})", self.schema.name(), values.join(", ")),
            None => write!(f, "{}#?({})", self.schema.name(), values.join(", ")),
        }
    }
}
