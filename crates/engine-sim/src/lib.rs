#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Scripted game engine that drives the gym bridge over HTTP.

use std::time::Duration;

pub mod client;
pub mod sim;

pub use client::EngineClient;
pub use sim::Simulation;

/// Timing knobs for [`run`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between `POST /` ticks.
    pub tick: Duration,
    /// Interval between `GET /reset` polls.
    pub reset_poll: Duration,
    /// Round length used when a reset carries no `round_length` option.
    pub round_length: u64,
    /// Stop after this many ticks. `None` runs forever.
    pub max_ticks: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            reset_poll: Duration::from_millis(200),
            round_length: 120,
            max_ticks: None,
        }
    }
}

/// Tick the simulation against the bridge until `max_ticks` is reached.
///
/// Failed calls are logged and retried on the next tick, like a real engine
/// that keeps polling regardless of the bridge's health.
pub async fn run(client: EngineClient, config: EngineConfig) -> Simulation {
    let mut sim = Simulation::new(config.round_length);
    let mut tick = tokio::time::interval(config.tick);
    let mut reset_poll = tokio::time::interval(config.reset_poll);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            _ = reset_poll.tick() => match client.poll_reset().await {
                Ok(r) if r.reset => {
                    sim.begin_episode(r.seed, &r.options);
                    tracing::info!(
                        seed = ?r.seed,
                        round_length = sim.round_length(),
                        match_id = %sim.snapshot().game_info.match_id,
                        "episode reset"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "reset poll failed"),
            },
            _ = tick.tick() => {
                match client.post_snapshot(sim.snapshot()).await {
                    Ok(actions) => {
                        if !actions.is_empty() {
                            tracing::debug!(commands = actions.len(), "applying actions");
                        }
                        sim.apply(&actions);
                    }
                    Err(e) => tracing::warn!(error = %e, "tick failed"),
                }
                sim.advance();

                ticks += 1;
                if config.max_ticks.is_some_and(|max| ticks >= max) {
                    return sim;
                }
            }
        }
    }
}
