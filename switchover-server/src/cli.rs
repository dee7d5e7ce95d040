use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "switchover",
    about = "Control plane for zero-downtime store migration",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(short, long, env = "SWITCHOVER_PORT", default_value = "8070")]
    pub port: u16,

    /// Connection URL of the store traffic is moving away from.
    #[arg(long, env = "SWITCHOVER_SOURCE_URL")]
    pub source_url: String,

    /// Connection URL of the store traffic is moving to.
    #[arg(long, env = "SWITCHOVER_TARGET_URL")]
    pub target_url: String,

    /// Where the inconsistency log lives; defaults to the target store.
    #[arg(long, env = "SWITCHOVER_EVENTS_URL")]
    pub events_url: Option<String>,

    #[arg(long, env = "SWITCHOVER_TOPIC", default_value = "switchover_inconsistent")]
    pub topic: String,

    #[arg(long, env = "SWITCHOVER_GROUP", default_value = "switchover-repair")]
    pub group: String,

    #[arg(long, env = "SWITCHOVER_PARTITIONS", default_value = "4")]
    pub partitions: u32,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
