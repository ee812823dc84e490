//! # Column Values
//!
//! Dynamically typed values for generic statements.
//!
//! Models hand their columns to the CRUD layer as `(name, SqlValue)` pairs;
//! the layer binds them positionally to `?` placeholders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use uuid::Uuid;

/// A bindable SQLite value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Zero values are left out of model-derived WHERE clauses, so an empty
    /// model matches every row.
    pub fn is_zero(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Integer(i) => *i == 0,
            SqlValue::Real(f) => *f == 0.0,
            SqlValue::Text(s) => s.is_empty(),
            SqlValue::Bool(b) => !b,
            SqlValue::Timestamp(_) => false,
        }
    }

    /// Integer view of the value, used for keys.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

macro_rules! sql_value_from {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value.into())
                }
            }
        )+
    };
}

sql_value_from!(Integer => i64, i32, i16, i8, u32, u16, u8);
sql_value_from!(Real => f64, f32);
sql_value_from!(Text => String, &str);
sql_value_from!(Bool => bool);
sql_value_from!(Timestamp => DateTime<Utc>);

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Binds one value to a query.
pub(crate) fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Timestamp(t) => query.bind(*t),
    }
}

/// Binds values in placeholder order.
pub(crate) fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}

// =============================================================================
// Unit Tests
// =============================================================================
