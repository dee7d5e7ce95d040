//! State construction over in-memory backends.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use switchover_core::{
    ConnPool, CoreError, CoreResult, DoubleWritePool, EntityStore, LogProducer, MemEventLog,
    MemStore, Scheduler, SqlArg, TxHandle,
};
use switchover_types::AccessPattern;

use crate::profile::Profile;
use crate::state::AppState;

pub const TEST_TOPIC: &str = "switchover_test";

/// The control surface never executes business SQL in these tests, so the
/// double-write pool can sit on sides that reject everything.
struct UnreachablePool;

#[async_trait]
impl ConnPool for UnreachablePool {
    async fn execute(&self, _sql: &str, _args: &[SqlArg]) -> CoreResult<u64> {
        Err(CoreError::Store("no backing store in tests".into()))
    }

    async fn fetch_all(&self, _sql: &str, _args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        Err(CoreError::Store("no backing store in tests".into()))
    }

    async fn fetch_optional(&self, _sql: &str, _args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        Err(CoreError::Store("no backing store in tests".into()))
    }

    async fn begin(&self) -> CoreResult<Box<dyn TxHandle>> {
        Err(CoreError::Store("no backing store in tests".into()))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub src: Arc<MemStore<Profile>>,
    pub dst: Arc<MemStore<Profile>>,
    pub log: Arc<MemEventLog>,
}

pub fn test_context() -> TestContext {
    let src = Arc::new(MemStore::new());
    let dst = Arc::new(MemStore::new());
    let log = Arc::new(MemEventLog::new(1));
    let producer = Arc::new(LogProducer::new(log.clone(), TEST_TOPIC));
    let pool = Arc::new(DoubleWritePool::new(
        Arc::new(UnreachablePool),
        Arc::new(UnreachablePool),
        AccessPattern::SrcOnly,
    ));
    let src_store: Arc<dyn EntityStore<Profile>> = src.clone();
    let dst_store: Arc<dyn EntityStore<Profile>> = dst.clone();
    let scheduler = Arc::new(Scheduler::new(src_store, dst_store, pool, producer));
    TestContext { state: AppState::new(scheduler), src, dst, log }
}

pub fn profile(id: i64, email: &str) -> Profile {
    Profile {
        id,
        email: email.to_owned(),
        nickname: format!("user-{id}"),
        ctime: 1_700_000_000,
        utime: id * 10,
    }
}
