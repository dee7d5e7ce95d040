//! Dynamic bind values for routed statements.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// One bind value for a routed statement.
///
/// The double-write pool forwards the same statement to both stores, so bind
/// values travel as owned data rather than borrowed generics. Each variant
/// carries an `Option` so NULLs stay typed on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    I64(Option<i64>),
    I32(Option<i32>),
    F64(Option<f64>),
    Bool(Option<bool>),
    Text(Option<String>),
    Bytes(Option<Vec<u8>>),
    Timestamp(Option<DateTime<Utc>>),
}

impl From<i64> for SqlArg {
    fn from(value: i64) -> Self {
        Self::I64(Some(value))
    }
}

impl From<i32> for SqlArg {
    fn from(value: i32) -> Self {
        Self::I32(Some(value))
    }
}

impl From<f64> for SqlArg {
    fn from(value: f64) -> Self {
        Self::F64(Some(value))
    }
}

impl From<bool> for SqlArg {
    fn from(value: bool) -> Self {
        Self::Bool(Some(value))
    }
}

impl From<String> for SqlArg {
    fn from(value: String) -> Self {
        Self::Text(Some(value))
    }
}

impl From<&str> for SqlArg {
    fn from(value: &str) -> Self {
        Self::Text(Some(value.to_owned()))
    }
}

impl From<Vec<u8>> for SqlArg {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Some(value))
    }
}

impl From<DateTime<Utc>> for SqlArg {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(Some(value))
    }
}

/// Bind `args` onto `query` in order.
pub(crate) fn bind_args<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &'q [SqlArg],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::I64(v) => query.bind(*v),
            SqlArg::I32(v) => query.bind(*v),
            SqlArg::F64(v) => query.bind(*v),
            SqlArg::Bool(v) => query.bind(*v),
            SqlArg::Text(v) => query.bind(v.as_deref()),
            SqlArg::Bytes(v) => query.bind(v.as_deref()),
            SqlArg::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
