//! Gym-style wrapper over [`ControlLoop`].

use std::sync::Arc;

use botomy_core::{Action, ResetOptions, Snapshot};

use crate::control::ControlLoop;
use crate::error::{Error, Result};

/// Flattens a snapshot into a fixed-length observation vector.
pub trait Featurizer {
    /// Length of every vector returned by [`Featurizer::featurize`].
    fn dim(&self) -> usize;

    /// Flatten `snapshot`; must return exactly `dim()` values.
    fn featurize(&self, snapshot: &Snapshot) -> Vec<f32>;
}

/// Result of one [`GymEnv::step`].
#[derive(Debug, Clone)]
pub struct Transition {
    /// Featurized snapshot.
    pub observation: Vec<f32>,
    /// Own-player score gained since the previous observation.
    pub reward: i64,
    /// The round ended (ENDED or MATCH_COMPLETED).
    pub terminated: bool,
    /// Raw snapshot behind `observation`.
    pub snapshot: Arc<Snapshot>,
}

/// `reset`/`step` over the discrete [`Action`] set, observing through `F`.
pub struct GymEnv<F> {
    control: ControlLoop,
    featurizer: F,
    last: Arc<Snapshot>,
}

impl<F: Featurizer> GymEnv<F> {
    /// Wrap `control`; observations come from `featurizer`.
    pub fn new(control: ControlLoop, featurizer: F) -> Self {
        Self {
            control,
            featurizer,
            last: Arc::new(Snapshot::waiting()),
        }
    }

    /// Length of every observation.
    pub fn observation_dim(&self) -> usize {
        self.featurizer.dim()
    }

    /// Number of discrete actions accepted by [`GymEnv::step`].
    pub fn action_count(&self) -> usize {
        Action::COUNT
    }

    /// Snapshot behind the latest observation.
    pub fn last_snapshot(&self) -> &Arc<Snapshot> {
        &self.last
    }

    /// Underlying control loop, for episode and step bookkeeping.
    pub fn control(&self) -> &ControlLoop {
        &self.control
    }

    /// Start a new episode and return its first observation.
    pub async fn reset(&mut self, seed: Option<i64>, options: ResetOptions) -> Result<Vec<f32>> {
        self.last = self.control.reset(seed, options).await?;
        self.observe()
    }

    /// Move relative to the last observed own-player position.
    pub async fn step(&mut self, action: Action) -> Result<Transition> {
        let batch = action.encode(&self.last);
        let before = self.last.own_score();
        self.last = self.control.step(batch).await?;
        Ok(Transition {
            observation: self.observe()?,
            reward: self.last.own_score() - before,
            terminated: self.last.state().is_terminal(),
            snapshot: Arc::clone(&self.last),
        })
    }

    fn observe(&self) -> Result<Vec<f32>> {
        let obs = self.featurizer.featurize(&self.last);
        let expected = self.featurizer.dim();
        if obs.len() != expected {
            return Err(Error::FeatureShape {
                expected,
                got: obs.len(),
            });
        }
        Ok(obs)
    }
}
