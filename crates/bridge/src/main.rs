#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Bridge daemon: serves the engine endpoints and drives a demo policy.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use botomy_bridge::{BridgeConfig, ControlLoop, RendezvousStore};
use botomy_core::{Action, ResetOptions};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "botomy-bridge")]
struct Args {
    /// Listen address for the engine, e.g. 0.0.0.0:3000
    #[arg(long, default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Drop every Nth eligible engine poll (0 disables).
    #[arg(long, default_value_t = 0)]
    frame_skip: u32,

    /// Give up on a snapshot wait after this many milliseconds (0 waits forever).
    #[arg(long, default_value_t = 0)]
    wait_timeout_ms: u64,

    /// Episodes for the demo policy to play (0 plays until interrupted).
    #[arg(long, default_value_t = 1)]
    episodes: u64,

    /// Step limit per episode.
    #[arg(long, default_value_t = 250)]
    max_steps: u64,

    /// Seed passed to the engine on the first reset; incremented per episode.
    #[arg(long)]
    seed: Option<i64>,

    /// Round length requested from the engine, in engine-defined units.
    #[arg(long)]
    round_length: Option<u64>,

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

    let config = BridgeConfig {
        listen: args.listen,
        frame_skip: args.frame_skip,
        wait_timeout: (args.wait_timeout_ms > 0).then(|| Duration::from_millis(args.wait_timeout_ms)),
    };
    let store = Arc::new(RendezvousStore::from_config(&config)?);
    tracing::info!(?config, "bridge starting");

    let mut options = ResetOptions::new();
    if let Some(len) = args.round_length {
        options.insert("round_length".into(), len.into());
    }
    let demo = tokio::spawn(run_demo(
        ControlLoop::new(Arc::clone(&store)),
        args.episodes,
        args.max_steps,
        args.seed,
        options,
    ));

    let shutdown = {
        let store = Arc::clone(&store);
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
                res = demo => match res {
                    Ok(Ok(())) => tracing::info!("demo policy finished"),
                    Ok(Err(e)) => tracing::error!(error = %e, "demo policy failed"),
                    Err(e) => tracing::error!(error = %e, "demo task panicked"),
                },
            }
            store.close().await;
        }
    };

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(listen = %config.listen, "waiting for engine");
    botomy_bridge::http::serve(listener, store, shutdown).await?;
    Ok(())
}

/// Cycle through the discrete action set, one action per step.
async fn run_demo(
    mut control: ControlLoop,
    episodes: u64,
    max_steps: u64,
    seed: Option<i64>,
    options: ResetOptions,
) -> botomy_bridge::Result<()> {
    let mut episode = 0u64;
    while episodes == 0 || episode < episodes {
        let seed = seed.map(|s| s + episode as i64);
        let mut snapshot = control.reset(seed, options.clone()).await?;
        let start_score = snapshot.own_score();

        for step in 0..max_steps {
            let action = Action::ALL[step as usize % Action::COUNT];
            snapshot = control.step(action.encode(&snapshot)).await?;
            if snapshot.state().is_terminal() {
                break;
            }
        }

        tracing::info!(
            episode,
            steps = control.steps(),
            score_delta = snapshot.own_score() - start_score,
            "demo episode summary"
        );
        episode += 1;
    }
    Ok(())
}
