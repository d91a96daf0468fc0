//! Whole-run orchestration: wire the network, spawn one task per party and
//! collect the results.

use std::sync::Arc;

use bytes::Bytes;
use hopseal_core::{
    ExchangeReceiver, ExchangeSender, Outcome, ReceiverActor, RelayActor, SenderActor,
    env::Environment,
};
use hopseal_crypto::Fingerprint;
use hopseal_proto::Party;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    actors::{
        Delivery, drive_exchange_receiver, drive_exchange_sender, drive_receiver, drive_relay,
        drive_sender,
    },
    bootstrap::{HopKeys, RelayKeys},
    config::{ConfigError, ExchangeConfig, RelayConfig},
    error::RuntimeError,
    network::{Network, Tap},
};

/// Link faults to inject into a run.
#[derive(Clone, Default)]
pub struct Faults {
    taps: Vec<(Party, Party, Tap)>,
}

impl Faults {
    /// No faults: every link delivers bytes unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rewrite every message from `from` to `to` with `f`.
    #[must_use]
    pub fn tap<F>(mut self, from: Party, to: Party, f: F) -> Self
    where
        F: Fn(Bytes) -> Bytes + Send + Sync + 'static,
    {
        self.taps.push((from, to, Arc::new(f)));
        self
    }

    /// Flip one bit of every message from `from` to `to`.
    ///
    /// `bit` counts from the start of the message and wraps around its
    /// length; empty messages pass unchanged.
    #[must_use]
    pub fn flip_bit(self, from: Party, to: Party, bit: usize) -> Self {
        self.tap(from, to, move |bytes| {
            if bytes.is_empty() {
                return bytes;
            }
            let mut corrupted = bytes.to_vec();
            let bit = bit % (corrupted.len() * 8);
            corrupted[bit / 8] ^= 1 << (bit % 8);
            Bytes::from(corrupted)
        })
    }

    /// Returns true if no link is tapped.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Returns true if at least one tap rewrites the link from `from` to `to`.
    pub fn taps_link(&self, from: Party, to: Party) -> bool {
        self.taps.iter().any(|(f, t, _)| *f == from && *t == to)
    }

    /// Pass `bytes` through every tap on the link from `from` to `to`, in
    /// the order the taps were added.
    pub fn apply(&self, from: Party, to: Party, bytes: Bytes) -> Bytes {
        self.taps
            .iter()
            .filter(|(f, t, _)| *f == from && *t == to)
            .fold(bytes, |bytes, (_, _, tap)| tap(bytes))
    }

    fn install(self, network: &mut Network) {
        let mut links = Vec::new();
        for &(from, to, _) in &self.taps {
            if !links.contains(&(from, to)) {
                links.push((from, to));
            }
        }

        let faults = Arc::new(self);
        for (from, to) in links {
            warn!(%from, %to, "fault injected on link");
            let faults = Arc::clone(&faults);
            network.tap(from, to, move |bytes| faults.apply(from, to, bytes));
        }
    }
}

impl std::fmt::Debug for Faults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let links: Vec<_> = self.taps.iter().map(|(from, to, _)| (*from, *to)).collect();
        f.debug_struct("Faults").field("links", &links).finish()
    }
}

/// Result of a completed relay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Receiver's verdict
    pub outcome: Outcome,
    /// Fingerprint the Sender computed
    pub sender_fingerprint: Fingerprint,
    /// Payload as delivered, present only when the verdict is `Valid`
    pub payload: Option<Bytes>,
}

/// Run the three-party relay protocol once with the given keys and payload.
///
/// Spawns one task per party and waits for all three. If the Sender or the
/// Relay fails, the Receiver can never complete; its task is cancelled and
/// the failure is returned.
///
/// # Errors
///
/// - `Protocol` if the Sender or the Relay aborted
/// - `Link` if a link was missing or a peer vanished
/// - `Task` if an actor task panicked
pub async fn run_relay_protocol<E: Environment>(
    keys: RelayKeys,
    payload: Bytes,
    env: E,
    faults: Faults,
) -> Result<RelayReport, RuntimeError> {
    let mut network = Network::new();
    network
        .connect(Party::Sender, Party::Receiver)
        .connect(Party::Sender, Party::Relay)
        .connect(Party::Relay, Party::Receiver);
    faults.install(&mut network);

    let sender_endpoint = network.endpoint(Party::Sender)?;
    let relay_endpoint = network.endpoint(Party::Relay)?;
    let receiver_endpoint = network.endpoint(Party::Receiver)?;
    drop(network);

    info!(
        size = payload.len(),
        hop_a = keys.sender_hop_a.suite_name(),
        hop_b = keys.relay_hop_b.suite_name(),
        "starting relay run"
    );

    let sender = SenderActor::new(keys.sender_hop_a, payload);
    let sender_fingerprint = *sender.fingerprint();
    let relay = RelayActor::new(keys.relay_hop_a, keys.relay_hop_b);
    let receiver = ReceiverActor::new(keys.receiver_hop_b);

    let mut sender_task = tokio::spawn(drive_sender(sender, sender_endpoint, env.clone()));
    let mut relay_task = tokio::spawn(drive_relay(relay, relay_endpoint, env));
    let mut receiver_task = tokio::spawn(drive_receiver(receiver, receiver_endpoint));

    let result = async {
        join(Party::Sender, &mut sender_task).await?;
        join(Party::Relay, &mut relay_task).await?;
        join(Party::Receiver, &mut receiver_task).await
    }
    .await;

    let Delivery { outcome, payload } = match result {
        Ok(delivery) => delivery,
        Err(err) => {
            warn!(error = %err, "relay run failed, receiver cannot complete");
            relay_task.abort();
            receiver_task.abort();
            return Err(err);
        },
    };

    info!(%outcome, "relay run finished");
    Ok(RelayReport { outcome, sender_fingerprint, payload })
}

/// Generate keys and a random payload from `config`, then run the relay
/// protocol.
///
/// # Errors
///
/// - `Config` if `config` is invalid, or if `faults` taps the payload link
///   while `config` asks for an empty payload
/// - `KeyGeneration` if RSA key generation fails
/// - Anything [`run_relay_protocol`] returns
pub async fn run_relay<E: Environment>(
    config: &RelayConfig,
    env: E,
    faults: Faults,
) -> Result<RelayReport, RuntimeError> {
    config.validate()?;
    if config.payload_size == 0 && faults.taps_link(Party::Sender, Party::Receiver) {
        return Err(ConfigError::EmptyPayloadFault.into());
    }

    let mut rng = env.rng();
    let hop_a = HopKeys::generate(config.hop_a, config.rsa_bits, &mut rng)?;
    let hop_b = HopKeys::generate(config.hop_b, config.rsa_bits, &mut rng)?;

    let mut payload = vec![0u8; config.payload_size];
    env.random_bytes(&mut payload);

    run_relay_protocol(RelayKeys::from_hops(hop_a, hop_b), Bytes::from(payload), env, faults)
        .await
}

/// Result of a completed exchange run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReport {
    /// Messages the Sender sealed
    pub sent: usize,
    /// Plaintexts the Receiver opened, in order
    pub received: Vec<Bytes>,
}

/// Text of the `index`-th exchange message.
pub fn exchange_message(index: usize) -> Bytes {
    Bytes::from(format!("Message {index} from sender to receiver"))
}

/// Run the two-party message exchange once.
///
/// # Errors
///
/// - `Config` if `config` is invalid
/// - `KeyGeneration` if RSA key generation fails
/// - `Protocol` if a message fails to seal or open
pub async fn run_exchange<E: Environment>(
    config: &ExchangeConfig,
    env: E,
) -> Result<ExchangeReport, RuntimeError> {
    config.validate()?;

    let keys = HopKeys::generate(config.suite, config.rsa_bits, &mut env.rng())?;

    let mut network = Network::new();
    network.connect(Party::Sender, Party::Receiver);
    let sender_endpoint = network.endpoint(Party::Sender)?;
    let receiver_endpoint = network.endpoint(Party::Receiver)?;
    drop(network);

    info!(suite = keys.sealer.suite_name(), messages = config.messages, "starting exchange");

    let messages = (0..config.messages).map(exchange_message);
    let sender = ExchangeSender::new(keys.sealer, messages);
    let receiver = ExchangeReceiver::new(keys.opener, config.messages);

    let mut sender_task = tokio::spawn(drive_exchange_sender(sender, sender_endpoint, env));
    let mut receiver_task = tokio::spawn(drive_exchange_receiver(receiver, receiver_endpoint));

    let sent = match join(Party::Sender, &mut sender_task).await {
        Ok(sent) => sent,
        Err(err) => {
            receiver_task.abort();
            return Err(err);
        },
    };
    let received = join(Party::Receiver, &mut receiver_task).await?;

    info!(sent, received = received.len(), "exchange finished");
    Ok(ExchangeReport { sent, received })
}

async fn join<T>(
    party: Party,
    task: &mut JoinHandle<Result<T, RuntimeError>>,
) -> Result<T, RuntimeError> {
    task.await.map_err(|e| RuntimeError::Task { party, reason: e.to_string() })?
}
