//! The relay protocol as three turmoil hosts.
//!
//! ```text
//!   sender ──── payload ───────────────────────────> receiver:7000
//!     │                                                  ▲
//!     └── sealed fingerprint ──> relay:7001 ── resealed ─┘
//! ```
//!
//! The Receiver is a turmoil client: `Sim::run` returns once it reaches an
//! outcome. The Sender and the Relay are hosts. A Relay that aborts forwards
//! nothing, so the Receiver waits until the simulation duration runs out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use hopseal_core::{Outcome, ProtocolError, ReceiverActor, RelayActor, SenderActor};
use hopseal_proto::Party;
use hopseal_runtime::{Faults, RelayKeys};
use turmoil::{Sim, net::TcpListener};

use crate::{
    SimEnv,
    sim_link::{accept, connect, read_message, write_message},
};

/// Port the Receiver listens on
pub const RECEIVER_PORT: u16 = 7000;

/// Port the Relay listens on
pub const RELAY_PORT: u16 = 7001;

#[derive(Debug, Default)]
struct Observed {
    sender_done: bool,
    relay_forwarded: bool,
    relay_error: Option<ProtocolError>,
    outcome: Option<Outcome>,
    payload: Option<Bytes>,
}

/// What the simulated parties reported, readable while the simulation runs.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    inner: Arc<Mutex<Observed>>,
}

impl Observations {
    fn lock(&self) -> MutexGuard<'_, Observed> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true once the Sender has delivered both messages.
    pub fn sender_done(&self) -> bool {
        self.lock().sender_done
    }

    /// Returns true once the Relay has written the resealed fingerprint.
    pub fn relay_forwarded(&self) -> bool {
        self.lock().relay_forwarded
    }

    /// Error the Relay aborted with, if any.
    pub fn relay_error(&self) -> Option<ProtocolError> {
        self.lock().relay_error.clone()
    }

    /// Receiver's verdict, once reached.
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().outcome.clone()
    }

    /// Payload the Receiver accepted; present only for a `Valid` verdict.
    pub fn payload(&self) -> Option<Bytes> {
        self.lock().payload.clone()
    }
}

/// Register the Sender, Relay and Receiver hosts on `sim`.
///
/// `faults` rewrite messages before they are written to the wire. Every
/// party draws randomness from clones of `env`.
pub fn install_relay(
    sim: &mut Sim<'_>,
    keys: RelayKeys,
    payload: Bytes,
    env: SimEnv,
    faults: Faults,
) -> Observations {
    let observations = Observations::default();

    let RelayKeys { sender_hop_a, relay_hop_a, relay_hop_b, receiver_hop_b } = keys;

    {
        let env = env.clone();
        let faults = faults.clone();
        let observations = observations.clone();
        sim.host(Party::Sender.name(), move || {
            let actor = SenderActor::new(sender_hop_a.clone(), payload.clone());
            run_sender(actor, env.clone(), faults.clone(), observations.clone())
        });
    }

    {
        let observations = observations.clone();
        sim.host(Party::Relay.name(), move || {
            let actor = RelayActor::new(relay_hop_a.clone(), relay_hop_b.clone());
            run_relay(actor, env.clone(), faults.clone(), observations.clone())
        });
    }

    sim.client(
        Party::Receiver.name(),
        run_receiver(ReceiverActor::new(receiver_hop_b), observations.clone()),
    );

    observations
}

async fn run_sender(
    mut actor: SenderActor,
    env: SimEnv,
    faults: Faults,
    observations: Observations,
) -> turmoil::Result {
    let mut to_receiver = None;
    let mut to_relay = None;
    while let Some(outgoing) = actor.step(&env)? {
        let message = faults.apply(Party::Sender, outgoing.to, outgoing.message);
        match outgoing.to {
            Party::Receiver => to_receiver = Some(message),
            Party::Relay => to_relay = Some(message),
            Party::Sender => return Err("sender addressed itself".into()),
        }
    }
    let (Some(payload), Some(sealed)) = (to_receiver, to_relay) else {
        return Err("sender finished without both messages".into());
    };

    // Independent links: a held link to one peer must not stall the other
    tokio::try_join!(
        deliver(Party::Sender, Party::Receiver, RECEIVER_PORT, payload),
        deliver(Party::Sender, Party::Relay, RELAY_PORT, sealed),
    )?;

    observations.lock().sender_done = true;
    Ok(())
}

async fn run_relay(
    mut actor: RelayActor,
    env: SimEnv,
    faults: Faults,
    observations: Observations,
) -> turmoil::Result {
    let listener = TcpListener::bind(format!("0.0.0.0:{RELAY_PORT}").as_str()).await?;
    let (from, mut stream) = accept(&listener).await?;
    let message = read_message(&mut stream).await?;

    match actor.handle_message(from, &message, &env) {
        Ok(outgoing) => {
            let message = faults.apply(Party::Relay, outgoing.to, outgoing.message);
            deliver(Party::Relay, outgoing.to, RECEIVER_PORT, message).await?;
            observations.lock().relay_forwarded = true;
        },
        Err(err) => {
            tracing::warn!(error = %err, "relay aborted, nothing forwarded");
            observations.lock().relay_error = Some(err);
        },
    }
    Ok(())
}

/// Links are accepted in arrival order and each carries one message.
async fn run_receiver(mut actor: ReceiverActor, observations: Observations) -> turmoil::Result {
    let listener = TcpListener::bind(format!("0.0.0.0:{RECEIVER_PORT}").as_str()).await?;
    let mut links = Vec::new();

    loop {
        let (from, mut stream) = accept(&listener).await?;
        let message = read_message(&mut stream).await?;
        links.push(stream);

        if let Some(outcome) = actor.handle_message(from, message) {
            tracing::info!(%outcome, links = links.len(), "receiver finished");
            let mut observed = observations.lock();
            observed.outcome = Some(outcome);
            observed.payload = actor.into_payload();
            return Ok(());
        }
    }
}

async fn deliver(me: Party, peer: Party, port: u16, message: Bytes) -> std::io::Result<()> {
    let mut stream = connect(me, peer, port).await?;
    write_message(&mut stream, &message).await
}
