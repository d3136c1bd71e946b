//! Rendezvous between the engine's polling endpoints and the decision loop.
//!
//! [`Rendezvous`] is the plain state machine; every transition is a method
//! taking `&mut self`, so it can be exercised without any runtime.
//! [`RendezvousStore`] wraps it in a single async mutex and wakes waiters
//! through a [`Notify`] whenever a snapshot lands.
//!
//! Two signals drive the handoff:
//! - `snapshot_ready`: the next posted snapshot will be accepted.
//! - `action_ready`: a batch is waiting to be handed to the engine.
//!
//! Snapshots are numbered as they are accepted. A consumer only ever returns
//! a snapshot whose number is newer than the last one it returned, which is
//! what makes delivery exactly-once even when a waiter wakes late.

use std::sync::Arc;
use std::time::Duration;

use botomy_core::{ActionBatch, ResetOptions, ResetResponse, Snapshot};
use tokio::sync::{Mutex, Notify};

use crate::config::check_frame_skip;
use crate::error::{Error, Result};
use crate::ingress::{self, TickOutcome};

/// Pending episode restart, handed to the engine by `GET /reset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetRequest {
    /// The engine should restart its episode.
    pub should_reset: bool,
    /// Seed for the new episode, if any.
    pub seed: Option<i64>,
    /// Engine-defined episode options.
    pub options: ResetOptions,
}

impl From<ResetRequest> for ResetResponse {
    fn from(r: ResetRequest) -> Self {
        ResetResponse {
            reset: r.should_reset,
            seed: r.seed,
            options: r.options,
        }
    }
}

/// Store state and its transitions, without locking.
#[derive(Debug)]
pub struct Rendezvous {
    snapshot: Arc<Snapshot>,
    snapshot_ready: bool,
    action_ready: bool,
    pending: ActionBatch,
    reset: ResetRequest,
    frame_skip: u32,
    skip_count: u32,
    /// Number of snapshots accepted from the engine.
    accepted: u64,
    /// Number of the last snapshot handed to the decision loop.
    consumed: u64,
    /// A batch was published and no snapshot has been consumed since.
    step_outstanding: bool,
    closed: bool,
}

impl Rendezvous {
    /// Fails for a `frame_skip` of 1, which would drop every poll.
    pub fn new(frame_skip: u32) -> Result<Self> {
        check_frame_skip(frame_skip)?;
        Ok(Self {
            snapshot: Arc::new(Snapshot::waiting()),
            snapshot_ready: false,
            action_ready: false,
            pending: ActionBatch::empty(),
            reset: ResetRequest::default(),
            frame_skip,
            skip_count: 0,
            accepted: 0,
            consumed: 0,
            step_outstanding: false,
            closed: false,
        })
    }

    /// Current snapshot, consumed or not.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// The next eligible poll's snapshot will be accepted.
    pub fn snapshot_ready(&self) -> bool {
        self.snapshot_ready
    }

    /// A batch is waiting for the engine.
    pub fn action_ready(&self) -> bool {
        self.action_ready
    }

    /// Frame-skip counter.
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    /// Snapshots accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// True when the bridge wants something from the engine's next poll.
    pub fn expecting_input(&self) -> bool {
        self.snapshot_ready || self.action_ready
    }

    /// Advance the frame-skip counter; true when this poll must be dropped.
    pub fn skip_frame(&mut self) -> bool {
        if self.frame_skip == 0 {
            return false;
        }
        self.skip_count += 1;
        if self.skip_count >= self.frame_skip {
            self.skip_count = 0;
            return true;
        }
        false
    }

    /// Install `snapshot` as current and mark it as not yet consumed.
    pub fn publish_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
        self.snapshot_ready = false;
        self.accepted += 1;
    }

    /// Accept the snapshot already in flight instead of waiting for the next ack.
    pub fn arm(&mut self) {
        self.snapshot_ready = true;
    }

    /// Hand out the newest accepted snapshot if it was not returned before.
    pub fn try_consume(&mut self) -> Option<Arc<Snapshot>> {
        if self.accepted == self.consumed {
            return None;
        }
        self.consumed = self.accepted;
        self.snapshot_ready = false;
        self.step_outstanding = false;
        Some(Arc::clone(&self.snapshot))
    }

    /// Give up on the snapshot a timed-out caller was waiting for.
    ///
    /// Disarms the store and discards anything accepted meanwhile, so a late
    /// tick is never returned to the next caller as if it followed its step.
    pub fn abandon_wait(&mut self) {
        self.snapshot_ready = false;
        self.consumed = self.accepted;
        self.step_outstanding = false;
    }

    /// Queue `batch` for the engine and disarm until it is collected.
    ///
    /// Fails if the previous step has not consumed its snapshot yet.
    pub fn publish_actions(&mut self, batch: ActionBatch) -> Result<()> {
        if self.step_outstanding {
            return Err(Error::ContractViolation(
                "actions published twice without consuming a snapshot",
            ));
        }
        self.pending = batch;
        self.action_ready = true;
        self.snapshot_ready = false;
        self.step_outstanding = true;
        Ok(())
    }

    /// Release the pending batch to the engine and arm for the next snapshot.
    pub fn take_pending_actions(&mut self) -> ActionBatch {
        if !self.action_ready {
            return ActionBatch::empty();
        }
        self.action_ready = false;
        self.snapshot_ready = true;
        std::mem::take(&mut self.pending)
    }

    /// Ask the engine for a new episode and install the WAITING sentinel.
    pub fn request_reset(&mut self, seed: Option<i64>, options: ResetOptions) {
        self.reset = ResetRequest {
            should_reset: true,
            seed,
            options,
        };
        self.snapshot = Arc::new(Snapshot::waiting());
        // Anything accepted before the reset belongs to the old episode.
        self.consumed = self.accepted;
        self.step_outstanding = false;
    }

    /// Read the reset request; a positive read arms the store for the new episode.
    pub fn poll_reset(&mut self) -> ResetRequest {
        let out = self.reset.clone();
        if self.reset.should_reset {
            self.reset.should_reset = false;
            self.action_ready = false;
            self.pending = ActionBatch::empty();
            self.snapshot_ready = true;
        }
        out
    }
}

/// Process-wide rendezvous shared by the HTTP handlers and the control loop.
#[derive(Debug)]
pub struct RendezvousStore {
    state: Mutex<Rendezvous>,
    changed: Notify,
    wait_timeout: Option<Duration>,
}

impl RendezvousStore {
    /// See [`Rendezvous::new`] for the accepted `frame_skip` values.
    pub fn new(frame_skip: u32, wait_timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(Rendezvous::new(frame_skip)?),
            changed: Notify::new(),
            wait_timeout,
        })
    }

    /// Validate `cfg` and build a store from it.
    pub fn from_config(cfg: &crate::BridgeConfig) -> Result<Self> {
        cfg.validate()?;
        Self::new(cfg.frame_skip, cfg.wait_timeout)
    }

    /// Run one engine tick through the ingress rules.
    pub async fn ingest(&self, snapshot: Snapshot) -> ActionBatch {
        let outcome = {
            let mut st = self.state.lock().await;
            ingress::on_tick(&mut st, snapshot)
        };
        match &outcome {
            TickOutcome::Idle => {}
            TickOutcome::Skipped => tracing::trace!("frame skipped"),
            TickOutcome::Served { accepted, actions } => {
                if *accepted {
                    tracing::debug!("snapshot accepted");
                    self.changed.notify_waiters();
                }
                if !actions.is_empty() {
                    tracing::debug!(commands = actions.len(), "actions delivered");
                }
            }
        }
        outcome.into_actions()
    }

    /// Install `snapshot` directly and wake waiters.
    pub async fn publish_snapshot(&self, snapshot: Snapshot) {
        self.state.lock().await.publish_snapshot(snapshot);
        self.changed.notify_waiters();
    }

    /// See [`Rendezvous::publish_actions`].
    pub async fn publish_actions(&self, batch: ActionBatch) -> Result<()> {
        self.state.lock().await.publish_actions(batch)
    }

    /// See [`Rendezvous::take_pending_actions`].
    pub async fn take_pending_actions(&self) -> ActionBatch {
        self.state.lock().await.take_pending_actions()
    }

    /// See [`Rendezvous::request_reset`].
    pub async fn request_reset(&self, seed: Option<i64>, options: ResetOptions) {
        self.state.lock().await.request_reset(seed, options);
    }

    /// Answer a `GET /reset`; see [`Rendezvous::poll_reset`].
    pub async fn poll_reset(&self) -> ResetRequest {
        let req = self.state.lock().await.poll_reset();
        if req.should_reset {
            tracing::debug!(seed = ?req.seed, "reset handed to engine; armed for next snapshot");
        }
        req
    }

    /// Latest snapshot held by the store, consumed or not.
    pub async fn current_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(self.state.lock().await.snapshot())
    }

    /// Wait for a snapshot accepted after the last one returned.
    ///
    /// With `immediate`, the store is armed first so the engine's very next
    /// poll is accepted.
    pub async fn await_snapshot(&self, immediate: bool) -> Result<Arc<Snapshot>> {
        let Some(waited) = self.wait_timeout else {
            return self.wait_for_snapshot(immediate).await;
        };
        match tokio::time::timeout(waited, self.wait_for_snapshot(immediate)).await {
            Ok(res) => res,
            Err(_) => {
                self.state.lock().await.abandon_wait();
                tracing::warn!(?waited, "gave up waiting for a snapshot");
                Err(Error::Timeout { waited })
            }
        }
    }

    async fn wait_for_snapshot(&self, immediate: bool) -> Result<Arc<Snapshot>> {
        let mut arm = immediate;
        loop {
            // Register before checking so a publish in between still wakes us.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut st = self.state.lock().await;
                if st.closed {
                    return Err(Error::Closed);
                }
                if arm {
                    st.arm();
                    arm = false;
                }
                if let Some(snapshot) = st.try_consume() {
                    return Ok(snapshot);
                }
            }

            notified.await;
        }
    }

    /// Wake every waiter with [`Error::Closed`].
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.changed.notify_waiters();
    }

    #[cfg(test)]
    pub(crate) async fn with_state<R>(&self, f: impl FnOnce(&mut Rendezvous) -> R) -> R {
        f(&mut *self.state.lock().await)
    }
}
