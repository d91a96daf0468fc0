//! Hopseal runtime.
//!
//! Production glue around [`hopseal_core`]'s Sans-IO actors: an in-process
//! network of ordered links, one tokio task per party, key bootstrap and the
//! `hopseal` CLI.
//!
//! # Architecture
//!
//! ```text
//!   RelayConfig ──> bootstrap (HopKeys) ──> runner
//!                                             │ spawn
//!                     ┌───────────────────────┼────────────────────────┐
//!                     ▼                       ▼                        ▼
//!               drive_sender             drive_relay             drive_receiver
//!               SenderActor              RelayActor              ReceiverActor
//!                     │                       │                        ▲
//!                     └──── Endpoint ── Network (mpsc inboxes) ────────┘
//! ```
//!
//! # Components
//!
//! - [`Network`] / [`Endpoint`]: ordered point-to-point links with optional
//!   fault taps
//! - [`actors`]: drivers executing one actor against one endpoint
//! - [`HopKeys`]: key generation per hop
//! - [`run_relay_protocol`], [`run_exchange`]: whole-run orchestration
//! - [`SystemEnv`]: OS-backed randomness

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actors;
mod bootstrap;
mod config;
mod error;
mod network;
mod runner;
mod system_env;

pub use actors::Delivery;
pub use bootstrap::{HopKeys, RelayKeys, SuiteKind, UnknownSuite};
pub use config::{
    ConfigError, DEFAULT_MESSAGE_COUNT, DEFAULT_PAYLOAD_SIZE, ExchangeConfig, MAX_PAYLOAD_SIZE,
    RelayConfig,
};
pub use error::{LinkError, RuntimeError};
pub use network::{Endpoint, Network, Tap};
pub use runner::{
    ExchangeReport, Faults, RelayReport, exchange_message, run_exchange, run_relay,
    run_relay_protocol,
};
pub use system_env::SystemEnv;
