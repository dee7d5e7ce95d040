use std::sync::Arc;

use switchover_types::AccessPattern;

use super::{ConnPool, DoubleWritePool, TxHandle};
use crate::error::CoreError;
use crate::test_support::{CallLog, RecordingPool};

fn pool_with(pattern: AccessPattern) -> (DoubleWritePool, Arc<CallLog>) {
    let log = Arc::new(CallLog::default());
    let src = Arc::new(RecordingPool::new("src", log.clone()));
    let dst = Arc::new(RecordingPool::new("dst", log.clone()));
    (DoubleWritePool::new(src, dst, pattern), log)
}

#[tokio::test]
async fn src_only_routes_everything_to_source() {
    let (pool, log) = pool_with(AccessPattern::SrcOnly);
    pool.execute("UPDATE t SET a = 1", &[]).await.unwrap();
    pool.fetch_all("SELECT * FROM t", &[]).await.unwrap();
    pool.fetch_optional("SELECT * FROM t WHERE id = $1", &[]).await.unwrap();
    assert_eq!(
        log.entries(),
        vec![
            "src:execute:UPDATE t SET a = 1",
            "src:fetch_all:SELECT * FROM t",
            "src:fetch_optional:SELECT * FROM t WHERE id = $1",
        ]
    );
}

#[tokio::test]
async fn src_first_writes_to_both_and_reads_from_source() {
    let (pool, log) = pool_with(AccessPattern::SrcFirst);
    let affected = pool.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    assert_eq!(affected, 1);
    pool.fetch_all("SELECT * FROM t", &[]).await.unwrap();
    assert_eq!(
        log.entries(),
        vec![
            "src:execute:INSERT INTO t VALUES (1)",
            "dst:execute:INSERT INTO t VALUES (1)",
            "src:fetch_all:SELECT * FROM t",
        ]
    );
}

#[tokio::test]
async fn dst_first_writes_to_both_and_reads_from_target() {
    let (pool, log) = pool_with(AccessPattern::DstFirst);
    pool.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    pool.fetch_optional("SELECT 1", &[]).await.unwrap();
    assert_eq!(
        log.entries(),
        vec![
            "dst:execute:INSERT INTO t VALUES (1)",
            "src:execute:INSERT INTO t VALUES (1)",
            "dst:fetch_optional:SELECT 1",
        ]
    );
}

#[tokio::test]
async fn follower_write_failure_is_swallowed() {
    let log = Arc::new(CallLog::default());
    let src = Arc::new(RecordingPool::new("src", log.clone()));
    let dst = Arc::new(RecordingPool::failing_execute("dst", log.clone()));
    let pool = DoubleWritePool::new(src, dst, AccessPattern::SrcFirst);

    let affected = pool.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    assert_eq!(affected, 1);
    // Both sides were attempted even though the follower failed.
    assert_eq!(log.entries().len(), 2);
}

#[tokio::test]
async fn leader_write_failure_propagates_without_touching_follower() {
    let log = Arc::new(CallLog::default());
    let src = Arc::new(RecordingPool::failing_execute("src", log.clone()));
    let dst = Arc::new(RecordingPool::new("dst", log.clone()));
    let pool = DoubleWritePool::new(src, dst, AccessPattern::SrcFirst);

    let err = pool.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
    assert_eq!(log.entries(), vec!["src:execute:INSERT INTO t VALUES (1)"]);
}

#[tokio::test]
async fn pattern_change_applies_to_the_next_operation() {
    let (pool, log) = pool_with(AccessPattern::SrcOnly);
    pool.execute("UPDATE t SET a = 1", &[]).await.unwrap();
    pool.update_pattern(AccessPattern::DstOnly);
    pool.execute("UPDATE t SET a = 2", &[]).await.unwrap();
    assert_eq!(
        log.entries(),
        vec!["src:execute:UPDATE t SET a = 1", "dst:execute:UPDATE t SET a = 2"]
    );
}

#[tokio::test]
async fn transaction_keeps_the_pattern_it_was_opened_under() {
    let (pool, log) = pool_with(AccessPattern::SrcFirst);
    let mut tx = pool.begin().await.unwrap();

    // A switch mid-transaction must not reroute the open handle.
    pool.update_pattern(AccessPattern::DstOnly);

    tx.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "src:begin",
            "dst:begin",
            "src:tx-execute:INSERT INTO t VALUES (1)",
            "dst:tx-execute:INSERT INTO t VALUES (1)",
            "src:commit",
            "dst:commit",
        ]
    );
}

#[tokio::test]
async fn commit_order_follows_the_opening_pattern() {
    let (pool, log) = pool_with(AccessPattern::DstFirst);
    let tx = pool.begin().await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(log.entries(), vec!["dst:begin", "src:begin", "dst:commit", "src:commit"]);
}

#[tokio::test]
async fn rollback_covers_both_sides() {
    let (pool, log) = pool_with(AccessPattern::SrcFirst);
    let tx = pool.begin().await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(log.entries(), vec!["src:begin", "dst:begin", "src:rollback", "dst:rollback"]);
}

#[tokio::test]
async fn follower_begin_failure_leaves_a_leader_only_transaction() {
    let log = Arc::new(CallLog::default());
    let src = Arc::new(RecordingPool::new("src", log.clone()));
    let dst = Arc::new(RecordingPool::failing_begin("dst", log.clone()));
    let pool = DoubleWritePool::new(src, dst, AccessPattern::SrcFirst);

    let mut tx = pool.begin().await.unwrap();
    tx.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "src:begin",
            "dst:begin",
            "src:tx-execute:INSERT INTO t VALUES (1)",
            "src:commit",
        ]
    );
}

#[tokio::test]
async fn leader_begin_failure_propagates() {
    let log = Arc::new(CallLog::default());
    let src = Arc::new(RecordingPool::failing_begin("src", log.clone()));
    let dst = Arc::new(RecordingPool::new("dst", log.clone()));
    let pool = DoubleWritePool::new(src, dst, AccessPattern::SrcFirst);

    assert!(pool.begin().await.is_err());
    assert_eq!(log.entries(), vec!["src:begin"]);
}

#[tokio::test]
async fn reads_in_a_transaction_only_touch_the_leader() {
    let (pool, log) = pool_with(AccessPattern::DstFirst);
    let mut tx = pool.begin().await.unwrap();
    tx.fetch_optional("SELECT 1", &[]).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(
        log.entries(),
        vec!["dst:begin", "src:begin", "dst:tx-fetch_optional:SELECT 1", "dst:commit", "src:commit"]
    );
}

#[tokio::test]
async fn prepare_is_not_supported() {
    let (pool, _log) = pool_with(AccessPattern::SrcOnly);
    assert!(matches!(pool.prepare("SELECT 1"), Err(CoreError::Unsupported(_))));
}
