//! In-process network of ordered point-to-point links.
//!
//! Each party owns one inbox. A link from `a` to `b` is a handle on `b`'s
//! inbox held by `a`'s endpoint, so messages on one directed pair arrive in
//! send order while messages from different peers interleave freely.
//!
//! # Liveness
//!
//! A receive blocks until the awaited peer sends. Every endpoint keeps a
//! handle on its own inbox, so a peer that finishes or aborts does not wake
//! anyone up: a hung peer blocks its partner indefinitely. There are no
//! timeouts; callers that need one wrap the future themselves.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    sync::Arc,
};

use bytes::Bytes;
use hopseal_proto::Party;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::LinkError;

/// Fault hook that rewrites bytes in transit on one directed link.
pub type Tap = Arc<dyn Fn(Bytes) -> Bytes + Send + Sync>;

/// Message as it sits in an inbox.
#[derive(Debug)]
struct Envelope {
    from: Party,
    bytes: Bytes,
}

struct Route {
    inbox: mpsc::UnboundedSender<Envelope>,
    tap: Option<Tap>,
}

/// Builder for the links between parties.
///
/// Connect and tap links first, then hand each party its [`Endpoint`].
pub struct Network {
    senders: HashMap<Party, mpsc::UnboundedSender<Envelope>>,
    receivers: HashMap<Party, mpsc::UnboundedReceiver<Envelope>>,
    links: HashSet<(Party, Party)>,
    taps: HashMap<(Party, Party), Tap>,
}

impl Network {
    /// Create a network with an inbox for every party and no links.
    pub fn new() -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for party in Party::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(party, tx);
            receivers.insert(party, rx);
        }

        Self { senders, receivers, links: HashSet::new(), taps: HashMap::new() }
    }

    /// Connect `a` and `b` with an ordered link in each direction.
    pub fn connect(&mut self, a: Party, b: Party) -> &mut Self {
        self.links.insert((a, b));
        self.links.insert((b, a));
        self
    }

    /// Rewrite every message sent from `from` to `to` with `f`.
    ///
    /// Simulates link corruption; the protocol sees whatever `f` returns.
    pub fn tap<F>(&mut self, from: Party, to: Party, f: F) -> &mut Self
    where
        F: Fn(Bytes) -> Bytes + Send + Sync + 'static,
    {
        self.taps.insert((from, to), Arc::new(f));
        self
    }

    /// Hand `party` its endpoint, with routes to every peer connected so far.
    ///
    /// # Errors
    ///
    /// - `EndpointTaken` if the endpoint was already handed out
    pub fn endpoint(&mut self, party: Party) -> Result<Endpoint, LinkError> {
        let inbox = self.receivers.remove(&party).ok_or(LinkError::EndpointTaken(party))?;

        let mut routes = HashMap::new();
        for &(from, to) in &self.links {
            if from != party {
                continue;
            }
            if let Some(tx) = self.senders.get(&to) {
                let tap = self.taps.get(&(from, to)).cloned();
                routes.insert(to, Route { inbox: tx.clone(), tap });
            }
        }

        let keepalive = self.senders.get(&party).cloned();
        debug!(%party, peers = routes.len(), "endpoint ready");

        Ok(Endpoint { party, routes, inbox, _keepalive: keepalive, stash: VecDeque::new() })
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("links", &self.links)
            .field("taps", &self.taps.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// One party's view of the network.
pub struct Endpoint {
    party: Party,
    routes: HashMap<Party, Route>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    // Keeps the inbox open after every peer is gone
    _keepalive: Option<mpsc::UnboundedSender<Envelope>>,
    // Messages pulled off the inbox while waiting for a different peer
    stash: VecDeque<Envelope>,
}

impl Endpoint {
    /// Party this endpoint belongs to.
    pub fn party(&self) -> Party {
        self.party
    }

    /// Queue `bytes` for `to`. Never blocks.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if there is no link to `to`
    /// - `PeerGone` if `to` dropped its endpoint
    pub fn send(&self, to: Party, bytes: Bytes) -> Result<(), LinkError> {
        let route =
            self.routes.get(&to).ok_or(LinkError::NotConnected { from: self.party, to })?;

        let bytes = match &route.tap {
            Some(tap) => tap(bytes),
            None => bytes,
        };

        trace!(from = %self.party, %to, size = bytes.len(), "send");
        route
            .inbox
            .send(Envelope { from: self.party, bytes })
            .map_err(|_| LinkError::PeerGone { to })
    }

    /// Wait for the next message from `from`.
    ///
    /// Messages from other peers that arrive meanwhile are kept, in order,
    /// for later receives.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if there is no link from `from`
    pub async fn receive(&mut self, from: Party) -> Result<Bytes, LinkError> {
        if !self.routes.contains_key(&from) {
            return Err(LinkError::NotConnected { from, to: self.party });
        }

        if let Some(index) = self.stash.iter().position(|envelope| envelope.from == from) {
            if let Some(envelope) = self.stash.remove(index) {
                return Ok(envelope.bytes);
            }
        }

        loop {
            let envelope = self.next_envelope().await?;
            if envelope.from == from {
                return Ok(envelope.bytes);
            }
            self.stash.push_back(envelope);
        }
    }

    /// Wait for the next message from any peer.
    ///
    /// # Errors
    ///
    /// Never fails while the endpoint is alive; the error type is shared with
    /// [`receive`](Self::receive).
    pub async fn receive_any(&mut self) -> Result<(Party, Bytes), LinkError> {
        let envelope = match self.stash.pop_front() {
            Some(envelope) => envelope,
            None => self.next_envelope().await?,
        };
        Ok((envelope.from, envelope.bytes))
    }

    async fn next_envelope(&mut self) -> Result<Envelope, LinkError> {
        let envelope = self.inbox.recv().await.ok_or(LinkError::PeerGone { to: self.party })?;
        trace!(from = %envelope.from, to = %self.party, size = envelope.bytes.len(), "receive");
        Ok(envelope)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("party", &self.party)
            .field("peers", &self.routes.keys().collect::<Vec<_>>())
            .field("stashed", &self.stash.len())
            .finish_non_exhaustive()
    }
}
