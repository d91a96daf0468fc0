//! Hopseal CLI.
//!
//! # Usage
//!
//! ```bash
//! # Relay a 1 MiB payload: ChaCha20-Poly1305 on hop A, AES-256-GCM on hop B
//! hopseal relay
//!
//! # Public-key hop B, larger payload, corrupt the plain link
//! hopseal relay --payload-size 200000000 --hop-b rsa-oaep --corrupt payload
//!
//! # Ten messages over one AES-256-GCM link
//! hopseal exchange --suite aes-256-gcm --messages 10
//! ```
//!
//! Exits non-zero unless the relay outcome is `Valid` or every exchange
//! message opened.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use hopseal_crypto::DEFAULT_RSA_BITS;
use hopseal_proto::Party;
use hopseal_runtime::{
    DEFAULT_MESSAGE_COUNT, DEFAULT_PAYLOAD_SIZE, ExchangeConfig, Faults, RelayConfig,
    RuntimeError, SuiteKind, SystemEnv, run_exchange, run_relay,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Bit flipped by `--corrupt`: inside the nonce of an AEAD message, inside
/// the block of an OAEP message
const CORRUPT_BIT: usize = 5 * 8 + 3;

/// Hopseal secure relay
#[derive(Parser, Debug)]
#[command(name = "hopseal")]
#[command(about = "Multi-hop secure relay with end-to-end payload verification")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the three-party relay protocol once
    Relay {
        /// Random payload size in bytes
        #[arg(long, default_value_t = DEFAULT_PAYLOAD_SIZE)]
        payload_size: usize,

        /// Suite on hop A (sender to relay)
        #[arg(long, default_value_t = SuiteKind::ChaCha20Poly1305)]
        hop_a: SuiteKind,

        /// Suite on hop B (relay to receiver)
        #[arg(long, default_value_t = SuiteKind::Aes256Gcm)]
        hop_b: SuiteKind,

        /// RSA modulus size for public-key hops
        #[arg(long, default_value_t = DEFAULT_RSA_BITS)]
        rsa_bits: usize,

        /// Flip one bit on a link in transit
        #[arg(long, value_enum)]
        corrupt: Option<CorruptLink>,
    },

    /// Send messages over one secured link
    Exchange {
        /// Suite on the link
        #[arg(long, default_value_t = SuiteKind::Aes256Gcm)]
        suite: SuiteKind,

        /// Number of messages
        #[arg(long, default_value_t = DEFAULT_MESSAGE_COUNT)]
        messages: usize,

        /// RSA modulus size when the suite is rsa-oaep
        #[arg(long, default_value_t = DEFAULT_RSA_BITS)]
        rsa_bits: usize,
    },
}

/// Link to corrupt
#[derive(ValueEnum, Clone, Copy, Debug)]
enum CorruptLink {
    /// Plain payload link, sender to receiver
    Payload,
    /// Hop A, sender to relay
    HopA,
    /// Hop B, relay to receiver
    HopB,
}

impl CorruptLink {
    fn faults(self) -> Faults {
        let (from, to) = match self {
            Self::Payload => (Party::Sender, Party::Receiver),
            Self::HopA => (Party::Sender, Party::Relay),
            Self::HopB => (Party::Relay, Party::Receiver),
        };
        Faults::none().flip_bit(from, to, CORRUPT_BIT)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match run(args.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(command: Command) -> Result<bool, RuntimeError> {
    match command {
        Command::Relay { payload_size, hop_a, hop_b, rsa_bits, corrupt } => {
            let config = RelayConfig { payload_size, hop_a, hop_b, rsa_bits };
            let faults = corrupt.map_or_else(Faults::none, CorruptLink::faults);

            let report = run_relay(&config, SystemEnv::new(), faults).await?;
            tracing::info!(
                outcome = %report.outcome,
                fingerprint = %report.sender_fingerprint,
                "relay complete"
            );
            Ok(report.outcome.is_valid())
        },
        Command::Exchange { suite, messages, rsa_bits } => {
            let config = ExchangeConfig { suite, messages, rsa_bits };

            let report = run_exchange(&config, SystemEnv::new()).await?;
            tracing::info!(sent = report.sent, received = report.received.len(), "exchange complete");
            Ok(report.received.len() == report.sent)
        },
    }
}
