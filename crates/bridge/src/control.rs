//! `reset`/`step` adapter for the decision loop.

use std::sync::Arc;

use botomy_core::{ActionBatch, GameState, ResetOptions, Snapshot};
use ulid::Ulid;

use crate::error::Result;
use crate::store::RendezvousStore;

/// Turn-based view of the engine for a decision loop.
///
/// `reset` and `step` suspend until the engine's polls complete the
/// corresponding handshake.
#[derive(Debug)]
pub struct ControlLoop {
    store: Arc<RendezvousStore>,
    episode: Option<Ulid>,
    steps: u64,
}

impl ControlLoop {
    /// Drive `store`. Only one control loop should share a store.
    pub fn new(store: Arc<RendezvousStore>) -> Self {
        Self {
            store,
            episode: None,
            steps: 0,
        }
    }

    /// Current episode id, assigned on each successful reset.
    pub fn episode(&self) -> Option<Ulid> {
        self.episode
    }

    /// Steps taken since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Ask the engine for a new episode and return its first STARTING snapshot.
    ///
    /// Snapshots still arriving from the previous episode are discarded.
    pub async fn reset(
        &mut self,
        seed: Option<i64>,
        options: ResetOptions,
    ) -> Result<Arc<Snapshot>> {
        self.store.request_reset(seed, options).await;

        let mut snapshot = self.store.await_snapshot(false).await?;
        let mut discarded = 0u32;
        while snapshot.state() != GameState::Starting {
            tracing::debug!(state = ?snapshot.state(), "discarding pre-episode snapshot");
            discarded += 1;
            snapshot = self.store.await_snapshot(true).await?;
        }

        let episode = Ulid::new();
        self.episode = Some(episode);
        self.steps = 0;
        tracing::info!(
            episode = %episode,
            seed = ?seed,
            match_id = %snapshot.game_info.match_id,
            discarded,
            "episode started"
        );
        Ok(snapshot)
    }

    /// Hand `actions` to the engine and return the snapshot that follows them.
    pub async fn step(&mut self, actions: ActionBatch) -> Result<Arc<Snapshot>> {
        self.store.publish_actions(actions).await?;
        let snapshot = self.store.await_snapshot(false).await?;
        self.steps += 1;
        if snapshot.state().is_terminal() {
            tracing::info!(
                episode = ?self.episode.map(|e| e.to_string()),
                steps = self.steps,
                score = snapshot.own_score(),
                state = ?snapshot.state(),
                "episode finished"
            );
        }
        Ok(snapshot)
    }
}
