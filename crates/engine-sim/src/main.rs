#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Engine stand-in: polls the bridge like the real game client would.

use std::time::Duration;

use botomy_engine_sim::{EngineClient, EngineConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "botomy-engine-sim")]
struct Args {
    /// Bridge base URL, e.g. http://127.0.0.1:3000
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    bridge: String,

    /// Tick interval in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Reset poll interval in milliseconds.
    #[arg(long, default_value_t = 200)]
    reset_poll_ms: u64,

    /// Ticks per round when the reset carries no round_length.
    #[arg(long, default_value_t = 120)]
    round_length: u64,

    /// Stop after this many ticks (runs forever if unset).
    #[arg(long)]
    ticks: Option<u64>,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig {
        tick: Duration::from_millis(args.tick_ms),
        reset_poll: Duration::from_millis(args.reset_poll_ms),
        round_length: args.round_length,
        max_ticks: args.ticks,
    };
    tracing::info!(bridge = %args.bridge, ?config, "engine starting");

    let client = EngineClient::new(args.bridge);
    let sim = tokio::select! {
        sim = botomy_engine_sim::run(client, config) => sim,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            return Ok(());
        }
    };

    tracing::info!(
        episodes = sim.episodes(),
        score = sim.snapshot().own_score(),
        "engine stopped"
    );
    Ok(())
}
