//! switchover - control plane for zero-downtime store migration.
//!
//! Wires the double-write pool, the validators and the repair consumer over
//! two Postgres stores and exposes the operator API for walking traffic
//! through `SRC_ONLY → SRC_FIRST → DST_FIRST → DST_ONLY`.

mod api;
mod cli;
mod config;
mod profile;
mod router;
mod state;
#[cfg(test)]
mod test_helpers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use switchover_core::{
    ConnPool, DoubleWritePool, EntityStore, LogProducer, PgEntityStore, PgEventLog,
    RepairConsumer, Scheduler,
};
use switchover_types::AccessPattern;

use cli::Cli;
use profile::Profile;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    fmt().with_env_filter(filter).with_target(true).init();

    tracing::info!(port = cli.port, "switchover starting");

    let src_pool = config::connect_pool(&cli.source_url).await?;
    let dst_pool = config::connect_pool(&cli.target_url).await?;
    let events_pool = match &cli.events_url {
        Some(url) => config::connect_pool(url).await?,
        None => dst_pool.clone(),
    };

    let src_conn: Arc<dyn ConnPool> = Arc::new(src_pool.clone());
    let dst_conn: Arc<dyn ConnPool> = Arc::new(dst_pool.clone());
    let pool = Arc::new(DoubleWritePool::new(src_conn, dst_conn, AccessPattern::SrcOnly));

    let event_log = Arc::new(PgEventLog::new(events_pool, cli.partitions));
    event_log.ensure_schema().await?;
    let producer = Arc::new(LogProducer::new(event_log.clone(), cli.topic.clone()));

    let src_store: Arc<dyn EntityStore<Profile>> =
        Arc::new(PgEntityStore::<Profile>::new(src_pool));
    let dst_store: Arc<dyn EntityStore<Profile>> =
        Arc::new(PgEntityStore::<Profile>::new(dst_pool));

    let consumer = Arc::new(
        RepairConsumer::new(
            event_log.clone(),
            cli.topic.clone(),
            cli.group.clone(),
            src_store.clone(),
            dst_store.clone(),
        )
        .await?,
    );
    let (consumer_shutdown, consumer_signal) = tokio::sync::watch::channel(false);
    consumer.start(consumer_signal);

    let scheduler = Arc::new(Scheduler::new(src_store, dst_store, pool, producer));
    let app = router::build_router(AppState::new(scheduler));

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!(%addr, "control surface listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    drop(consumer_shutdown);
    Ok(())
}
