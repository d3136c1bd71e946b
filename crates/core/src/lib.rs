#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Wire model shared by the gym bridge and engine stand-ins.

pub mod action;
pub mod api;
pub mod model;

pub use action::{Action, ActionBatch, Command};
pub use api::{ResetOptions, ResetResponse};
pub use model::{GameState, Position, Snapshot};
