//! Deterministic simulation harness for Hopseal protocol testing.
//!
//! Runs the three relay parties as turmoil hosts talking over simulated TCP,
//! with a seeded [`Environment`](hopseal_core::env::Environment) so every
//! run is reproducible. Link latency, held links and in-transit corruption
//! come from turmoil and [`Faults`](hopseal_runtime::Faults).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_link;
pub mod sim_relay;

pub use sim_env::SimEnv;
pub use sim_relay::{Observations, RECEIVER_PORT, RELAY_PORT, install_relay};
