#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Gym bridge: turns an HTTP-polling game engine into a `reset`/`step` loop.

pub mod config;
pub mod control;
pub mod env;
pub mod error;
pub mod http;
pub mod ingress;
pub mod store;

pub use config::BridgeConfig;
pub use control::ControlLoop;
pub use env::{Featurizer, GymEnv, Transition};
pub use error::{Error, Result};
pub use store::{Rendezvous, RendezvousStore, ResetRequest};
