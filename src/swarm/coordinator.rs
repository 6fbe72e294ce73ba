use super::availability::PieceLedger;
use super::error::SwarmError;
use super::requests::RequestLedger;
use crate::constants::{REQUEST_TIMEOUT, SHUTDOWN_TIMEOUT, TICK_INTERVAL};
use crate::peer::{Bitfield, Message, PeerId, PeerLink, PeerSession, SessionParams, SwarmEvent};
use crate::storage::{PieceWriter, WriteReport};
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, debug_span, error, info, trace, warn, Instrument};

/// Timing knobs for the coordinator loop.
#[derive(Debug, Clone)]
pub struct SwarmOptions {
    /// Age after which an unanswered request is dropped and the piece
    /// becomes schedulable again.
    pub request_timeout: Duration,
    pub tick_interval: Duration,
    /// How long shutdown waits for every session to acknowledge.
    pub shutdown_timeout: Duration,
}

impl Default for SwarmOptions {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            tick_interval: TICK_INTERVAL,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
        }
    }
}

/// Result of [`Swarm::run`].
#[derive(Debug)]
pub struct SwarmOutcome {
    pub pieces_written: usize,
    pub piece_count: usize,
    pub completed: bool,
    /// Errors hit while shutting sessions down or closing the output file.
    pub errors: Vec<SwarmError>,
}

/// The swarm coordinator.
///
/// Owns the peer map, the availability and request ledgers, and the record of
/// written pieces. A single task drives it: every session publishes into one
/// event channel, and the coordinator answers through each session's
/// [`PeerLink`].
pub struct Swarm {
    peers: BTreeMap<PeerId, Arc<dyn PeerLink>>,
    ledger: PieceLedger,
    requests: RequestLedger,
    written: Bitfield,
    pending_writes: HashSet<u32>,
    writer: PieceWriter,
    reports: mpsc::UnboundedReceiver<WriteReport>,
    events: mpsc::Receiver<SwarmEvent>,
    options: SwarmOptions,
}

impl Swarm {
    pub fn new(
        events: mpsc::Receiver<SwarmEvent>,
        writer: PieceWriter,
        reports: mpsc::UnboundedReceiver<WriteReport>,
        options: SwarmOptions,
    ) -> Self {
        let piece_count = writer.piece_count() as usize;
        Self {
            peers: BTreeMap::new(),
            ledger: PieceLedger::new(piece_count),
            requests: RequestLedger::new(piece_count),
            written: Bitfield::new(piece_count),
            pending_writes: HashSet::new(),
            writer,
            reports,
            events,
            options,
        }
    }

    pub fn ledger(&self) -> &PieceLedger {
        &self.ledger
    }

    pub fn requests(&self) -> &RequestLedger {
        &self.requests
    }

    /// One bit per piece, set once the piece is on disk.
    pub fn written(&self) -> &Bitfield {
        &self.written
    }

    pub fn piece_count(&self) -> usize {
        self.written.len()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_complete(&self) -> bool {
        self.written.is_complete()
    }

    /// Drives the swarm until every piece is written, every session is gone,
    /// or `shutdown` resolves. Sessions are then shut down and the writer is
    /// drained.
    pub async fn run<F>(mut self, shutdown: F) -> SwarmOutcome
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.options.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        while !self.is_complete() {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("no peer sessions left");
                        break;
                    }
                },
                Some(report) = self.reports.recv() => self.handle_report(report),
                _ = ticker.tick() => self.tick(Instant::now()),
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        if self.is_complete() {
            info!("all {} pieces written", self.piece_count());
        }

        let mut errors = Vec::new();
        if let Err(e) = self.shutdown().await {
            error!("{}", e);
            errors.push(e);
        }

        let Swarm {
            writer,
            mut reports,
            mut written,
            ..
        } = self;
        if let Err(e) = writer.close().await {
            error!("closing output: {}", e);
            errors.push(e.into());
        }
        while let Ok(report) = reports.try_recv() {
            if let WriteReport::Written { index, .. } = report {
                written.set(index as usize);
            }
        }

        SwarmOutcome {
            pieces_written: written.count(),
            piece_count: written.len(),
            completed: written.is_complete(),
            errors,
        }
    }

    pub fn handle_event(&mut self, event: SwarmEvent) {
        match event {
            SwarmEvent::Connected(link) => self.register(link),
            SwarmEvent::Message { peer, message } => self.handle_message(peer, message),
            SwarmEvent::Closed { peer, addr, error } => {
                let registered = self
                    .peers
                    .get(&peer)
                    .is_some_and(|link| link.addr() == addr);
                if !registered {
                    trace!(%peer, %addr, "close for unregistered session");
                    return;
                }
                self.peers.remove(&peer);

                match error {
                    Some(e) => debug!(%peer, "session closed: {}", e),
                    None => debug!(%peer, "session closed"),
                }

                let cleared = self.requests.clear_peer(peer);
                if !cleared.is_empty() {
                    debug!(%peer, "re-queueing pieces {:?}", cleared);
                }
                self.schedule();
            }
        }
    }

    fn register(&mut self, link: Arc<dyn PeerLink>) {
        let peer = link.peer_id();
        if self.peers.contains_key(&peer) {
            debug!(%peer, addr = %link.addr(), "duplicate peer id, closing new session");
            drop(link.shutdown());
            return;
        }

        debug!(%peer, addr = %link.addr(), "peer connected");
        self.peers.insert(peer, link);
    }

    fn handle_message(&mut self, peer: PeerId, message: Message) {
        let Some(link) = self.peers.get(&peer).cloned() else {
            trace!(%peer, "message from unregistered peer");
            return;
        };

        match message {
            Message::Bitfield(bits) => {
                self.ledger.record_bitfield(peer, &bits);
                express_interest(link.as_ref());
                if link.choking().can_request() {
                    self.schedule();
                }
            }
            Message::Have { piece } => {
                self.ledger.record_have(peer, piece);
                express_interest(link.as_ref());
                if link.choking().can_request() {
                    self.schedule();
                }
            }
            Message::Unchoke => {
                link.set_peer_choking(false);
                self.schedule();
            }
            Message::Choke => {
                link.set_peer_choking(true);
                let cleared = self.requests.clear_peer(peer);
                if !cleared.is_empty() {
                    debug!(%peer, "choked with {} requests outstanding", cleared.len());
                    self.schedule();
                }
            }
            Message::Interested => link.set_peer_interested(true),
            Message::NotInterested => link.set_peer_interested(false),
            Message::Piece { index, begin, data } => self.handle_piece(peer, index, begin, data),
            Message::KeepAlive | Message::Request { .. } | Message::Cancel { .. } => {
                trace!(%peer, kind = ?message.id(), "ignored");
            }
        }
    }

    fn handle_piece(&mut self, peer: PeerId, index: u32, begin: u32, data: Bytes) {
        if self.requests.remove(index, peer).is_none() {
            debug!(%peer, index, "unsolicited piece dropped");
            return;
        }

        if self.written.has(index as usize) || self.pending_writes.contains(&index) {
            trace!(%peer, index, "duplicate piece dropped");
            return;
        }

        let whole_piece = self.writer.piece_len(index) == Some(data.len() as u64);
        if begin != 0 || !whole_piece {
            debug!(%peer, index, begin, len = data.len(), "partial block dropped");
            self.schedule();
            return;
        }

        match self.writer.write(index, begin, data) {
            Ok(()) => {
                self.pending_writes.insert(index);
            }
            Err(e) => {
                warn!(index, "write rejected: {}", e);
                self.schedule();
            }
        }
    }

    pub fn handle_report(&mut self, report: WriteReport) {
        match report {
            WriteReport::Written { index, len, .. } => {
                self.pending_writes.remove(&index);
                self.written.set(index as usize);
                debug!(
                    index,
                    len,
                    "piece written ({}/{})",
                    self.written.count(),
                    self.piece_count()
                );
            }
            WriteReport::Failed { index, error, .. } => {
                self.pending_writes.remove(&index);
                warn!(index, "piece write failed: {}", error);
                self.requests.clear_piece(index);
                self.schedule();
            }
        }
    }

    /// Expires stale requests and logs progress.
    pub fn tick(&mut self, now: Instant) {
        let expired = self.requests.expire(now, self.options.request_timeout);
        if !expired.is_empty() {
            debug!("{} requests timed out", expired.len());
            self.schedule();
        }

        info!(
            written = self.written.count(),
            pieces = self.piece_count(),
            peers = self.peers.len(),
            outstanding = self.requests.len(),
            "progress"
        );
    }

    /// Requests every missing piece from each unchoked holder, in ascending
    /// piece order. Returns the number of requests sent.
    pub fn schedule(&mut self) -> usize {
        let mut sent = 0;

        for index in 0..self.piece_count() as u32 {
            if self.written.has(index as usize)
                || self.pending_writes.contains(&index)
                || self.requests.is_outstanding(index)
            {
                continue;
            }

            let Some(length) = self
                .writer
                .piece_len(index)
                .and_then(|len| u32::try_from(len).ok())
            else {
                continue;
            };

            let holders: BTreeSet<PeerId> = self.ledger.holders_of(index).into_iter().collect();
            for holder in holders {
                let Some(link) = self.peers.get(&holder) else {
                    continue;
                };
                if !link.choking().can_request() {
                    continue;
                }

                match link.send(Message::request(index, 0, length)) {
                    Ok(()) => {
                        self.requests.record(index, holder, Instant::now());
                        sent += 1;
                    }
                    Err(e) => debug!(peer = %holder, index, "request not sent: {}", e),
                }
            }
        }

        if sent > 0 {
            trace!("sent {} requests", sent);
        }
        sent
    }

    /// Signals every session to close and waits for the acknowledgements.
    ///
    /// The peer map is empty afterwards, whether or not every session
    /// answered within the shutdown timeout.
    pub async fn shutdown(&mut self) -> Result<(), SwarmError> {
        let peers = std::mem::take(&mut self.peers);
        if peers.is_empty() {
            return Ok(());
        }
        info!("shutting down {} peer sessions", peers.len());

        for peer in peers.keys() {
            self.requests.clear_peer(*peer);
        }

        let mut acks: FuturesUnordered<_> = peers.values().map(|link| link.shutdown()).collect();
        let deadline = tokio::time::Instant::now() + self.options.shutdown_timeout;
        while !acks.is_empty() {
            if tokio::time::timeout_at(deadline, acks.next()).await.is_err() {
                return Err(SwarmError::ShutdownTimeout {
                    pending: acks.len(),
                });
            }
        }
        Ok(())
    }
}

fn express_interest(link: &dyn PeerLink) {
    if let Err(e) = link.send(Message::Interested) {
        debug!(peer = %link.peer_id(), "interest not sent: {}", e);
    }
}

/// Spawns one connect task per distinct address.
///
/// Connected sessions announce themselves on `events`; failures are logged
/// and never affect other peers. Returns the number of tasks spawned.
pub fn connect_peers<I>(addrs: I, params: SessionParams, events: mpsc::Sender<SwarmEvent>) -> usize
where
    I: IntoIterator<Item = SocketAddr>,
{
    let params = Arc::new(params);
    let addrs: BTreeSet<SocketAddr> = addrs.into_iter().collect();

    for addr in &addrs {
        let addr = *addr;
        let params = params.clone();
        let events = events.clone();
        tokio::spawn(
            async move {
                if let Err(e) = PeerSession::connect(addr, &params, events).await {
                    debug!("connect failed: {}", e);
                }
            }
            .instrument(debug_span!("connect", %addr)),
        );
    }

    debug!("connecting to {} peers", addrs.len());
    addrs.len()
}
