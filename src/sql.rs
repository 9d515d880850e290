//! Parameterized SQL built from schemas and instances.
//!
//! Only table and column names, which come from [`Schema`] declarations, are
//! written into the SQL text. Every value travels as a positional `?` parameter.

use rusqlite::types::Value as SqlValue;
use std::sync::Arc;

use crate::datatype::Value;
use crate::entity::Instance;
use crate::error::{OrmError, Result};
use crate::schema::{Field, IDENTITY, Schema};

/// SQL text with the parameters to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
    fn with_params(sql: String, params: Vec<SqlValue>) -> Self {
        Self { sql, params }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn select_list(schema: &Schema) -> String {
    let mut columns = vec![IDENTITY.to_string()];
    columns.extend(schema.columns());
    columns.join(", ")
}

/// Lowers every declared field of the instance, in column order.
fn field_params(instance: &Instance) -> Result<Vec<SqlValue>> {
    instance
        .schema()
        .fields()
        .map(|(name, field)| bind_field(instance, name, field))
        .collect()
}

fn bind_field(instance: &Instance, name: &str, field: &Field) -> Result<SqlValue> {
    let value = match instance.get(name) {
        None => return Ok(SqlValue::Null),
        Some(value) => value,
    };
    match (field, value) {
        (_, Value::Null) => Ok(SqlValue::Null),
        (Field::ForeignKey(fk), Value::Reference(target)) => {
            let expected = fk.references().table_name();
            let same_type = Arc::ptr_eq(target.schema(), fk.references())
                || target.schema() == fk.references();
            if !same_type {
                return Err(OrmError::InvalidValue {
                    field: name.to_string(),
                    message: format!(
                        "expected a '{expected}' instance, got '{}'",
                        target.schema().table_name()
                    ),
                });
            }
            target
                .id()
                .map(SqlValue::Integer)
                .ok_or_else(|| OrmError::UnsavedReference {
                    field: name.to_string(),
                    table: expected.to_string(),
                })
        }
        (Field::ForeignKey(_), Value::Integer(id)) => Ok(SqlValue::Integer(*id)),
        (Field::ForeignKey(_), other) => Err(OrmError::InvalidValue {
            field: name.to_string(),
            message: format!("a foreign key holds an instance or an id, not {other}"),
        }),
        (Field::Column(_), other) => other.to_sql().ok_or_else(|| OrmError::InvalidValue {
            field: name.to_string(),
            message: "a scalar column cannot hold an instance".to_string(),
        }),
    }
}

fn require_id(instance: &Instance, operation: &'static str) -> Result<i64> {
    instance.id().ok_or_else(|| OrmError::MissingIdentity {
        table: instance.schema().table_name().to_string(),
        operation,
    })
}

pub fn create_table(schema: &Schema) -> QueryBuf {
    QueryBuf::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        schema.table_name(),
        schema.create_columns().join(", ")
    ))
}

/// Fails with [`OrmError::UnsavedReference`] before any SQL exists when a
/// foreign key points at an instance without id.
pub fn insert(instance: &Instance) -> Result<QueryBuf> {
    let schema = instance.schema();
    if schema.is_empty() {
        return Ok(QueryBuf::new(format!(
            "INSERT INTO {} DEFAULT VALUES;",
            schema.table_name()
        )));
    }
    let params = field_params(instance)?;
    Ok(QueryBuf::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            schema.table_name(),
            schema.columns().join(", "),
            placeholders(params.len())
        ),
        params,
    ))
}

pub fn select_all(schema: &Schema) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {};",
        select_list(schema),
        schema.table_name()
    ))
}

pub fn select_by_id(schema: &Schema, id: i64) -> QueryBuf {
    QueryBuf::with_params(
        format!(
            "SELECT {} FROM {} WHERE (id=?);",
            select_list(schema),
            schema.table_name()
        ),
        vec![SqlValue::Integer(id)],
    )
}

/// Overwrites every declared field, not only the changed ones.
pub fn update(instance: &Instance) -> Result<QueryBuf> {
    let id = require_id(instance, "update")?;
    let schema = instance.schema();
    let mut params = field_params(instance)?;
    let assignments = if schema.is_empty() {
        format!("{IDENTITY}={IDENTITY}")
    } else {
        schema
            .columns()
            .iter()
            .map(|column| format!("{column}=?"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    params.push(SqlValue::Integer(id));
    Ok(QueryBuf::with_params(
        format!(
            "UPDATE {} SET {} WHERE id = ?;",
            schema.table_name(),
            assignments
        ),
        params,
    ))
}

pub fn delete(instance: &Instance) -> Result<QueryBuf> {
    let id = require_id(instance, "delete")?;
    Ok(QueryBuf::with_params(
        format!("DELETE FROM {} WHERE id = ?;", instance.schema().table_name()),
        vec![SqlValue::Integer(id)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::ScalarType;

    fn author() -> Arc<Schema> {
        Schema::builder("Author")
            .column("name", ScalarType::Text)
            .column("age", ScalarType::Integer)
            .build()
            .unwrap()
    }

    fn book(author: &Arc<Schema>) -> Arc<Schema> {
        Schema::builder("Book")
            .column("title", ScalarType::Text)
            .column("published", ScalarType::Boolean)
            .foreign_key("author", author)
            .build()
            .unwrap()
    }

    fn michael() -> Instance {
        Instance::new(&author())
            .with("name", "Michael")
            .unwrap()
            .with("age", 31)
            .unwrap()
    }

    #[test]
    fn create_statement_lists_identity_first() {
        let author = author();
        assert_eq!(
            create_table(&book(&author)).sql,
            "CREATE TABLE IF NOT EXISTS book (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             author_id INTEGER, published INTEGER, title TEXT);"
        );
    }

    #[test]
    fn insert_binds_values_in_column_order() {
        let query = insert(&michael()).unwrap();
        assert_eq!(query.sql, "INSERT INTO author (age, name) VALUES (?, ?);");
        assert_eq!(
            query.params,
            vec![SqlValue::Integer(31), SqlValue::Text("Michael".to_string())]
        );
    }

    #[test]
    fn insert_binds_null_for_missing_fields() {
        let query = insert(&Instance::new(&author()).with("age", 5).unwrap()).unwrap();
        assert_eq!(query.params, vec![SqlValue::Integer(5), SqlValue::Null]);
    }

    #[test]
    fn insert_lowers_references_to_their_id() {
        let author = author();
        let mut michael = michael();
        let draft = Instance::new(&book(&author))
            .with("title", "Rust")
            .unwrap()
            .with("published", false)
            .unwrap()
            .with("author", michael.clone())
            .unwrap();
        let err = insert(&draft).unwrap_err();
        assert!(matches!(err, OrmError::UnsavedReference { ref field, .. } if field == "author"));

        michael.assign_id(1);
        let saved = draft.with("author", michael).unwrap();
        let query = insert(&saved).unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO book (author_id, published, title) VALUES (?, ?, ?);"
        );
        assert_eq!(
            query.params,
            vec![
                SqlValue::Integer(1),
                SqlValue::Integer(0),
                SqlValue::Text("Rust".to_string())
            ]
        );
    }

    #[test]
    fn foreign_keys_reject_wrong_values() {
        let author = author();
        let book = book(&author);
        let text = Instance::new(&book).with("author", "Michael").unwrap();
        assert!(matches!(insert(&text), Err(OrmError::InvalidValue { .. })));

        let mut other = Instance::new(&book);
        other.assign_id(3);
        let wrong_type = Instance::new(&book).with("author", other).unwrap();
        assert!(matches!(insert(&wrong_type), Err(OrmError::InvalidValue { .. })));
    }

    #[test]
    fn foreign_keys_compare_the_whole_referenced_type() {
        let author = author();
        let book = book(&author);
        let lookalike = Schema::builder("Author")
            .column("pen_name", ScalarType::Text)
            .build()
            .unwrap();
        let mut impostor = Instance::new(&lookalike);
        impostor.assign_id(1);
        let draft = Instance::new(&book).with("author", impostor).unwrap();
        assert!(matches!(
            insert(&draft),
            Err(OrmError::InvalidValue { ref field, .. }) if field == "author"
        ));

        // an equal schema built separately is the same type
        let twin = Schema::builder("Author")
            .column("name", ScalarType::Text)
            .column("age", ScalarType::Integer)
            .build()
            .unwrap();
        let mut michael = Instance::new(&twin);
        michael.assign_id(7);
        let accepted = Instance::new(&book).with("author", michael).unwrap();
        assert_eq!(insert(&accepted).unwrap().params[0], SqlValue::Integer(7));
    }

    #[test]
    fn selects_use_the_same_column_order() {
        let author = author();
        assert_eq!(select_all(&author).sql, "SELECT id, age, name FROM author;");
        let query = select_by_id(&author, 2);
        assert_eq!(query.sql, "SELECT id, age, name FROM author WHERE (id=?);");
        assert_eq!(query.params, vec![SqlValue::Integer(2)]);
    }

    #[test]
    fn update_and_delete_require_an_id() {
        let mut michael = michael();
        assert!(matches!(
            update(&michael),
            Err(OrmError::MissingIdentity { operation: "update", .. })
        ));
        assert!(matches!(
            delete(&michael),
            Err(OrmError::MissingIdentity { operation: "delete", .. })
        ));

        michael.assign_id(7);
        let query = update(&michael).unwrap();
        assert_eq!(query.sql, "UPDATE author SET age=?, name=? WHERE id = ?;");
        assert_eq!(
            query.params,
            vec![
                SqlValue::Integer(31),
                SqlValue::Text("Michael".to_string()),
                SqlValue::Integer(7)
            ]
        );
        let query = delete(&michael).unwrap();
        assert_eq!(query.sql, "DELETE FROM author WHERE id = ?;");
        assert_eq!(query.params, vec![SqlValue::Integer(7)]);
    }

    #[test]
    fn schemas_without_fields_still_produce_valid_sql() {
        let marker = Schema::builder("Marker").build().unwrap();
        let mut instance = Instance::new(&marker);
        assert_eq!(
            insert(&instance).unwrap().sql,
            "INSERT INTO marker DEFAULT VALUES;"
        );
        assert_eq!(select_all(&marker).sql, "SELECT id FROM marker;");
        instance.assign_id(1);
        assert_eq!(
            update(&instance).unwrap().sql,
            "UPDATE marker SET id=id WHERE id = ?;"
        );
    }
}
