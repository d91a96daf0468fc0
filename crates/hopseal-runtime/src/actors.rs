//! Actor drivers: execute the Sans-IO actors against network endpoints.
//!
//! Each driver owns one actor and one endpoint and runs as its own tokio
//! task. Drivers only move bytes; every protocol decision stays in the
//! actor.

use bytes::Bytes;
use hopseal_core::{
    ExchangeReceiver, ExchangeSender, Outcome, ProtocolError, ReceiverActor, RelayActor,
    SenderActor, env::Environment,
};
use hopseal_proto::Party;
use tracing::{debug, info};

use crate::{error::RuntimeError, network::Endpoint};

/// What the Receiver ends up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Verdict
    pub outcome: Outcome,
    /// Payload, present only when the verdict is `Valid`
    pub payload: Option<Bytes>,
}

fn aborted(party: Party) -> impl FnOnce(ProtocolError) -> RuntimeError {
    move |source| RuntimeError::Protocol { party, source }
}

/// Run the Sender until both of its messages are handed to the network.
///
/// # Errors
///
/// - `Protocol` if sealing the fingerprint fails
/// - `Link` if a destination is not connected or already gone
pub async fn drive_sender<E: Environment>(
    mut actor: SenderActor,
    endpoint: Endpoint,
    env: E,
) -> Result<(), RuntimeError> {
    while let Some(out) = actor.step(&env).map_err(aborted(Party::Sender))? {
        endpoint.send(out.to, out.message)?;
    }

    info!(fingerprint = %actor.fingerprint(), "sender done");
    Ok(())
}

/// Run the Relay: wait for one message, reseal, forward.
///
/// Blocks until a message arrives; if the Sender never sends, this never
/// returns.
///
/// # Errors
///
/// - `Protocol` if hop A fails to open or hop B fails to seal; nothing is
///   forwarded in that case
/// - `Link` if the Receiver is not connected or already gone
pub async fn drive_relay<E: Environment>(
    mut actor: RelayActor,
    mut endpoint: Endpoint,
    env: E,
) -> Result<(), RuntimeError> {
    let (from, bytes) = endpoint.receive_any().await?;
    debug!(%from, size = bytes.len(), "relay received");

    let out = actor.handle_message(from, &bytes, &env).map_err(aborted(Party::Relay))?;
    endpoint.send(out.to, out.message)?;

    info!("relay done");
    Ok(())
}

/// Run the Receiver until it reaches an outcome.
///
/// Blocks until both the payload and the relayed fingerprint arrive. An
/// `Aborted` outcome is a successful return: the protocol finished without a
/// verdict.
///
/// # Errors
///
/// - `Link` only if the endpoint's inbox closes, which does not happen while
///   the endpoint is alive
pub async fn drive_receiver(
    mut actor: ReceiverActor,
    mut endpoint: Endpoint,
) -> Result<Delivery, RuntimeError> {
    loop {
        let (from, bytes) = endpoint.receive_any().await?;
        if let Some(outcome) = actor.handle_message(from, bytes) {
            return Ok(Delivery { outcome, payload: actor.into_payload() });
        }
    }
}

/// Send every queued exchange message.
///
/// # Errors
///
/// - `Protocol` if a message cannot be sealed
/// - `Link` if the Receiver is not connected or already gone
pub async fn drive_exchange_sender<E: Environment>(
    mut actor: ExchangeSender,
    endpoint: Endpoint,
    env: E,
) -> Result<usize, RuntimeError> {
    while let Some(out) = actor.step(&env).map_err(aborted(Party::Sender))? {
        endpoint.send(out.to, out.message)?;
        debug!(sent = actor.sent(), "exchange message sent");
    }
    Ok(actor.sent())
}

/// Open exchange messages until the expected count has arrived.
///
/// # Errors
///
/// - `Protocol` on the first message that fails to open
pub async fn drive_exchange_receiver(
    mut actor: ExchangeReceiver,
    mut endpoint: Endpoint,
) -> Result<Vec<Bytes>, RuntimeError> {
    while !actor.is_done() {
        let (from, bytes) = endpoint.receive_any().await?;
        let plaintext = actor.handle_message(from, &bytes).map_err(aborted(Party::Receiver))?;
        info!(message = %String::from_utf8_lossy(&plaintext), "receiver got message");
    }
    Ok(actor.into_messages())
}
