//! Recording fakes and sample rows shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::postgres::PgRow;

use crate::connpool::{ConnPool, SqlArg, TxHandle};
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};

/// Minimal migrated row used across the unit tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRow {
    pub id: i64,
    pub email: String,
    pub utime: i64,
}

impl Entity for TestRow {
    const TABLE: &'static str = "test_rows";

    fn id(&self) -> i64 {
        self.id
    }

    fn utime(&self) -> i64 {
        self.utime
    }

    fn columns() -> &'static [&'static str] {
        &["id", "email", "utime"]
    }

    fn args(&self) -> Vec<SqlArg> {
        vec![
            SqlArg::from(self.id),
            SqlArg::from(self.email.clone()),
            SqlArg::from(self.utime),
        ]
    }
}

pub fn sample_row(id: i64, email: &str) -> TestRow {
    sample_row_at(id, email, id * 10)
}

pub fn sample_row_at(id: i64, email: &str, utime: i64) -> TestRow {
    TestRow { id, email: email.to_owned(), utime }
}

/// Widen a concrete store into the trait object the components take.
pub fn dyn_store<S>(store: Arc<S>) -> Arc<dyn crate::store::EntityStore<TestRow>>
where
    S: crate::store::EntityStore<TestRow> + 'static,
{
    store
}

/// Append-only call log shared between fakes and assertions.
#[derive(Default)]
pub struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A [`ConnPool`] that records every call instead of talking to a store.
pub struct RecordingPool {
    pub name: &'static str,
    pub log: Arc<CallLog>,
    pub fail_execute: bool,
    pub fail_begin: bool,
}

impl RecordingPool {
    pub fn new(name: &'static str, log: Arc<CallLog>) -> Self {
        Self { name, log, fail_execute: false, fail_begin: false }
    }

    pub fn failing_execute(name: &'static str, log: Arc<CallLog>) -> Self {
        Self { fail_execute: true, ..Self::new(name, log) }
    }

    pub fn failing_begin(name: &'static str, log: Arc<CallLog>) -> Self {
        Self { fail_begin: true, ..Self::new(name, log) }
    }
}

#[async_trait]
impl ConnPool for RecordingPool {
    async fn execute(&self, sql: &str, _args: &[SqlArg]) -> CoreResult<u64> {
        self.log.push(format!("{}:execute:{sql}", self.name));
        if self.fail_execute {
            return Err(CoreError::Store(format!("{} unavailable", self.name)));
        }
        Ok(1)
    }

    async fn fetch_all(&self, sql: &str, _args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        self.log.push(format!("{}:fetch_all:{sql}", self.name));
        Ok(Vec::new())
    }

    async fn fetch_optional(&self, sql: &str, _args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        self.log.push(format!("{}:fetch_optional:{sql}", self.name));
        Ok(None)
    }

    async fn begin(&self) -> CoreResult<Box<dyn TxHandle>> {
        self.log.push(format!("{}:begin", self.name));
        if self.fail_begin {
            return Err(CoreError::Store(format!("{} unavailable", self.name)));
        }
        Ok(Box::new(RecordingTx { name: self.name, log: self.log.clone() }))
    }
}

pub struct RecordingTx {
    name: &'static str,
    log: Arc<CallLog>,
}

#[async_trait]
impl TxHandle for RecordingTx {
    async fn execute(&mut self, sql: &str, _args: &[SqlArg]) -> CoreResult<u64> {
        self.log.push(format!("{}:tx-execute:{sql}", self.name));
        Ok(1)
    }

    async fn fetch_all(&mut self, sql: &str, _args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        self.log.push(format!("{}:tx-fetch_all:{sql}", self.name));
        Ok(Vec::new())
    }

    async fn fetch_optional(&mut self, sql: &str, _args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        self.log.push(format!("{}:tx-fetch_optional:{sql}", self.name));
        Ok(None)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        self.log.push(format!("{}:commit", self.name));
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        self.log.push(format!("{}:rollback", self.name));
        Ok(())
    }
}
