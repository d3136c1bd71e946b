//! Per-poll decision for `POST /`.

use botomy_core::{ActionBatch, Snapshot};

use crate::store::Rendezvous;

/// What a single engine poll did to the rendezvous.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing was expected from the engine; state untouched.
    Idle,
    /// Dropped by frame skipping.
    Skipped,
    /// The poll was eligible and handled.
    Served {
        /// The posted snapshot became the current one.
        accepted: bool,
        /// Batch for the engine, empty if none was pending.
        actions: ActionBatch,
    },
}

impl TickOutcome {
    /// Response body for the engine.
    pub fn into_actions(self) -> ActionBatch {
        match self {
            TickOutcome::Served { actions, .. } => actions,
            TickOutcome::Idle | TickOutcome::Skipped => ActionBatch::empty(),
        }
    }
}

/// Apply one engine tick.
///
/// The snapshot is stored before pending actions are released, so a poll that
/// both delivers a snapshot and collects actions hands back the batch computed
/// from the previous state.
pub fn on_tick(rv: &mut Rendezvous, snapshot: Snapshot) -> TickOutcome {
    if !rv.expecting_input() {
        return TickOutcome::Idle;
    }
    if rv.skip_frame() {
        return TickOutcome::Skipped;
    }

    let accepted = rv.snapshot_ready();
    if accepted {
        rv.publish_snapshot(snapshot);
    }

    let actions = rv.take_pending_actions();
    TickOutcome::Served { accepted, actions }
}
