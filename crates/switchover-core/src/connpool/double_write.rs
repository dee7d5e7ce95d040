//! Double-write pool: one facade over the source and target stores.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use switchover_types::AccessPattern;
use tracing::warn;

use super::{ConnPool, SqlArg, TxHandle};
use crate::error::{CoreError, CoreResult};
use crate::pattern_cell::PatternCell;

/// Routes every read and write to the source and/or target store according
/// to the current [`AccessPattern`].
///
/// Writes under the `*_FIRST` patterns are leader-authoritative: the leader's
/// outcome is the caller's outcome and a follower failure is only logged.
/// Reads always come from the leader; the follower may lag mid-dual-write.
/// The validator/repair loop reconciles whatever divergence this leaves
/// behind.
pub struct DoubleWritePool {
    src: Arc<dyn ConnPool>,
    dst: Arc<dyn ConnPool>,
    pattern: PatternCell,
}

impl DoubleWritePool {
    pub fn new(src: Arc<dyn ConnPool>, dst: Arc<dyn ConnPool>, pattern: AccessPattern) -> Self {
        Self { src, dst, pattern: PatternCell::new(pattern) }
    }

    /// Switch the traffic pattern. Atomic: concurrent operations observe the
    /// old or the new value, never a torn one, and each operation snapshots
    /// the pattern exactly once.
    pub fn update_pattern(&self, pattern: AccessPattern) {
        self.pattern.store(pattern);
    }

    pub fn pattern(&self) -> AccessPattern {
        self.pattern.load()
    }

    /// Prepared statements cannot be routed across two stores.
    pub fn prepare(&self, _sql: &str) -> CoreResult<()> {
        Err(CoreError::Unsupported(
            "prepared statements are not available on the double-write pool",
        ))
    }
}

#[async_trait]
impl ConnPool for DoubleWritePool {
    async fn execute(&self, sql: &str, args: &[SqlArg]) -> CoreResult<u64> {
        match self.pattern.load() {
            AccessPattern::SrcOnly => self.src.execute(sql, args).await,
            AccessPattern::DstOnly => self.dst.execute(sql, args).await,
            AccessPattern::SrcFirst => {
                let affected = self.src.execute(sql, args).await?;
                if let Err(err) = self.dst.execute(sql, args).await {
                    warn!(error = %err, "double write: target store write failed");
                }
                Ok(affected)
            }
            AccessPattern::DstFirst => {
                let affected = self.dst.execute(sql, args).await?;
                if let Err(err) = self.src.execute(sql, args).await {
                    warn!(error = %err, "double write: source store write failed");
                }
                Ok(affected)
            }
        }
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        match self.pattern.load() {
            AccessPattern::SrcOnly | AccessPattern::SrcFirst => self.src.fetch_all(sql, args).await,
            AccessPattern::DstOnly | AccessPattern::DstFirst => self.dst.fetch_all(sql, args).await,
        }
    }

    async fn fetch_optional(&self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        match self.pattern.load() {
            AccessPattern::SrcOnly | AccessPattern::SrcFirst => {
                self.src.fetch_optional(sql, args).await
            }
            AccessPattern::DstOnly | AccessPattern::DstFirst => {
                self.dst.fetch_optional(sql, args).await
            }
        }
    }

    async fn begin(&self) -> CoreResult<Box<dyn TxHandle>> {
        let pattern = self.pattern.load();
        let tx = match pattern {
            AccessPattern::SrcOnly => DoubleWriteTx {
                leader: self.src.begin().await?,
                follower: None,
                pattern,
            },
            AccessPattern::DstOnly => DoubleWriteTx {
                leader: self.dst.begin().await?,
                follower: None,
                pattern,
            },
            AccessPattern::SrcFirst => {
                let leader = self.src.begin().await?;
                let follower = match self.dst.begin().await {
                    Ok(tx) => Some(tx),
                    Err(err) => {
                        warn!(error = %err, "double write: target store failed to open transaction");
                        None
                    }
                };
                DoubleWriteTx { leader, follower, pattern }
            }
            AccessPattern::DstFirst => {
                let leader = self.dst.begin().await?;
                let follower = match self.src.begin().await {
                    Ok(tx) => Some(tx),
                    Err(err) => {
                        warn!(error = %err, "double write: source store failed to open transaction");
                        None
                    }
                };
                DoubleWriteTx { leader, follower, pattern }
            }
        };
        Ok(Box::new(tx))
    }
}

/// A transaction opened through the pool.
///
/// The pattern observed at `begin` governs this handle for its whole
/// lifetime: scheduler switches between `begin` and `commit` do not reroute
/// it. The leader commits first; the follower commit is best-effort.
pub struct DoubleWriteTx {
    leader: Box<dyn TxHandle>,
    follower: Option<Box<dyn TxHandle>>,
    pattern: AccessPattern,
}

#[async_trait]
impl TxHandle for DoubleWriteTx {
    async fn execute(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<u64> {
        let affected = self.leader.execute(sql, args).await?;
        if let Some(follower) = self.follower.as_mut() {
            if let Err(err) = follower.execute(sql, args).await {
                warn!(error = %err, pattern = %self.pattern, "double write: follower write failed in transaction");
            }
        }
        Ok(affected)
    }

    async fn fetch_all(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Vec<PgRow>> {
        self.leader.fetch_all(sql, args).await
    }

    async fn fetch_optional(&mut self, sql: &str, args: &[SqlArg]) -> CoreResult<Option<PgRow>> {
        self.leader.fetch_optional(sql, args).await
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let this = *self;
        this.leader.commit().await?;
        if let Some(follower) = this.follower {
            if let Err(err) = follower.commit().await {
                warn!(error = %err, pattern = %this.pattern, "double write: follower commit failed");
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        let this = *self;
        this.leader.rollback().await?;
        if let Some(follower) = this.follower {
            if let Err(err) = follower.rollback().await {
                warn!(error = %err, pattern = %this.pattern, "double write: follower rollback failed");
            }
        }
        Ok(())
    }
}
