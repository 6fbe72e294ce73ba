use super::*;
use crate::peer::{ChokingState, Message, PeerError, PeerId, PeerLink, SessionPhase};
use crate::storage::{PieceWriter, StorageError, WriteReport};
use bytes::Bytes;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

struct FakeLink {
    peer_id: PeerId,
    addr: SocketAddr,
    choking: Mutex<ChokingState>,
    phase: Mutex<SessionPhase>,
    outbox: mpsc::UnboundedSender<Message>,
    answers_shutdown: bool,
    held_acks: Mutex<Vec<oneshot::Sender<()>>>,
}

impl FakeLink {
    fn new(name: &[u8], port: u16) -> (Arc<Self>, mpsc::UnboundedReceiver<Message>) {
        Self::build(name, port, true)
    }

    fn stuck(name: &[u8], port: u16) -> (Arc<Self>, mpsc::UnboundedReceiver<Message>) {
        Self::build(name, port, false)
    }

    fn build(
        name: &[u8],
        port: u16,
        answers_shutdown: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Message>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        let link = Arc::new(Self {
            peer_id: PeerId::padded(name),
            addr: SocketAddr::from(([10, 0, 0, 1], port)),
            choking: Mutex::new(ChokingState::default()),
            phase: Mutex::new(SessionPhase::Active),
            outbox,
            answers_shutdown,
            held_acks: Mutex::new(Vec::new()),
        });
        (link, rx)
    }
}

impl PeerLink for FakeLink {
    fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn phase(&self) -> SessionPhase {
        *self.phase.lock()
    }

    fn choking(&self) -> ChokingState {
        *self.choking.lock()
    }

    fn set_am_choking(&self, choking: bool) {
        self.choking.lock().am_choking = choking;
    }

    fn set_am_interested(&self, interested: bool) {
        self.choking.lock().am_interested = interested;
    }

    fn set_peer_choking(&self, choking: bool) {
        self.choking.lock().peer_choking = choking;
    }

    fn set_peer_interested(&self, interested: bool) {
        self.choking.lock().peer_interested = interested;
    }

    fn send(&self, message: Message) -> Result<(), PeerError> {
        if *self.phase.lock() >= SessionPhase::Closing {
            return Err(PeerError::ConnectionClosed);
        }
        self.choking.lock().record_sent(&message);
        self.outbox
            .send(message)
            .map_err(|_| PeerError::ConnectionClosed)
    }

    fn shutdown(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.answers_shutdown {
            *self.phase.lock() = SessionPhase::Closed;
            let _ = tx.send(());
        } else {
            self.held_acks.lock().push(tx);
        }
        rx
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Message> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

fn requests_in(messages: &[Message]) -> Vec<(u32, u32, u32)> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Request {
                index,
                begin,
                length,
            } => Some((*index, *begin, *length)),
            _ => None,
        })
        .collect()
}

fn options() -> SwarmOptions {
    SwarmOptions {
        request_timeout: Duration::from_secs(10),
        tick_interval: Duration::from_secs(3600),
        shutdown_timeout: Duration::from_millis(200),
    }
}

// Three pieces of 4, 4 and 2 bytes.
async fn test_swarm(temp: &TempDir) -> (Swarm, mpsc::Sender<SwarmEvent>) {
    let (writer, reports) = PieceWriter::open(temp.path().join("out.bin"), 4, 10)
        .await
        .unwrap();
    let (tx, rx) = mpsc::channel(64);
    (Swarm::new(rx, writer, reports, options()), tx)
}

fn connect(swarm: &mut Swarm, link: &Arc<FakeLink>) {
    let link: Arc<dyn PeerLink> = link.clone();
    swarm.handle_event(SwarmEvent::Connected(link));
}

fn deliver(swarm: &mut Swarm, link: &FakeLink, message: Message) {
    swarm.handle_event(SwarmEvent::Message {
        peer: link.peer_id,
        message,
    });
}

fn bitfield(bits: &'static [u8]) -> Message {
    Message::Bitfield(Bytes::from_static(bits))
}

#[test]
fn test_ledger_bitfield_scenarios() {
    let peer = PeerId::padded(b"boblog123");

    let ledger = PieceLedger::new(16);
    ledger.record_bitfield(peer, &[0xFE, 0xFF]);
    assert_eq!(ledger.to_string(), "1111111011111111");

    let ledger = PieceLedger::new(8);
    ledger.record_bitfield(peer, &[0x06]);
    assert_eq!(ledger.to_string(), "00000110");
    assert!(ledger.holders_of(5).contains(&peer));
    assert!(ledger.holders_of(6).contains(&peer));
    assert!(ledger.holders_of(1).is_empty());
}

#[test]
fn test_ledger_bitfield_ignores_spare_bits() {
    let ledger = PieceLedger::new(4);
    ledger.record_bitfield(PeerId::padded(b"a"), &[0xFF, 0xFF]);
    assert_eq!(ledger.summary(), vec![true; 4]);
}

#[test]
fn test_ledger_have() {
    let alice = PeerId::padded(b"alice");
    let bob = PeerId::padded(b"bob");
    let ledger = PieceLedger::new(8);

    ledger.record_have(alice, 6);
    assert_eq!(ledger.to_string(), "00000010");

    ledger.record_have(alice, 6);
    assert_eq!(ledger.availability(6), 1);
    ledger.record_have(bob, 6);
    assert_eq!(ledger.availability(6), 2);

    ledger.record_have(alice, 8);
    ledger.record_have(alice, u32::MAX);
    assert_eq!(ledger.to_string(), "00000010");
    assert!(ledger.holders_of(8).is_empty());
    assert_eq!(ledger.availability(100), 0);
}

#[test]
fn test_request_ledger() {
    let alice = PeerId::padded(b"alice");
    let bob = PeerId::padded(b"bob");
    let ledger = RequestLedger::new(4);
    let start = Instant::now();

    ledger.record(0, alice, start);
    ledger.record(1, alice, start);
    ledger.record(1, bob, start + Duration::from_secs(5));
    ledger.record(9, bob, start);
    assert_eq!(ledger.len(), 3);
    assert!(ledger.is_outstanding(1));
    assert!(!ledger.is_outstanding(2));
    assert!(ledger.has_request(1, bob));
    assert!(!ledger.has_request(0, bob));

    assert_eq!(ledger.remove(0, alice), Some(start));
    assert_eq!(ledger.remove(0, alice), None);

    let expired = ledger.expire(start + Duration::from_secs(12), Duration::from_secs(10));
    assert_eq!(expired, vec![(1, alice)]);
    assert!(ledger.has_request(1, bob));

    assert_eq!(ledger.clear_peer(bob), vec![1]);
    assert!(ledger.is_empty());

    ledger.record(3, alice, start);
    ledger.record(3, bob, start);
    assert_eq!(ledger.clear_piece(3), 2);
    assert_eq!(ledger.clear_piece(42), 0);
}

#[tokio::test]
async fn test_interest_sent_on_bitfield_and_have() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);
    assert_eq!(swarm.peer_count(), 1);

    deliver(&mut swarm, &alice, bitfield(&[0x80]));
    assert_eq!(drain(&mut alice_rx), vec![Message::Interested]);
    assert!(alice.choking().am_interested);
    assert_eq!(swarm.ledger().to_string(), "100");

    deliver(&mut swarm, &alice, Message::Have { piece: 2 });
    assert_eq!(drain(&mut alice_rx), vec![Message::Interested]);
    assert_eq!(swarm.ledger().to_string(), "101");

    // choked, so nothing was requested
    assert!(swarm.requests().is_empty());
}

#[tokio::test]
async fn test_unchoke_requests_pieces_in_order() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);

    deliver(&mut swarm, &alice, bitfield(&[0xE0]));
    drain(&mut alice_rx);
    deliver(&mut swarm, &alice, Message::Unchoke);

    assert!(alice.choking().can_request());
    assert_eq!(
        requests_in(&drain(&mut alice_rx)),
        vec![(0, 0, 4), (1, 0, 4), (2, 0, 2)]
    );
    assert_eq!(swarm.requests().len(), 3);
}

#[tokio::test]
async fn test_no_rerequest_while_outstanding() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, mut bob_rx) = FakeLink::new(b"bob", 2);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);

    deliver(&mut swarm, &alice, bitfield(&[0xE0]));
    deliver(&mut swarm, &bob, bitfield(&[0xE0]));
    deliver(&mut swarm, &alice, Message::Unchoke);
    assert_eq!(requests_in(&drain(&mut alice_rx)).len(), 3);

    deliver(&mut swarm, &bob, Message::Unchoke);
    assert!(requests_in(&drain(&mut bob_rx)).is_empty());
    assert_eq!(swarm.schedule(), 0);
}

#[tokio::test]
async fn test_request_fans_out_to_unchoked_holders() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, mut bob_rx) = FakeLink::new(b"bob", 2);
    let (carol, mut carol_rx) = FakeLink::new(b"carol", 3);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);
    connect(&mut swarm, &carol);

    deliver(&mut swarm, &alice, bitfield(&[0x80]));
    deliver(&mut swarm, &bob, bitfield(&[0x80]));
    deliver(&mut swarm, &carol, bitfield(&[0x80]));
    bob.set_peer_choking(false);
    deliver(&mut swarm, &alice, Message::Unchoke);

    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);
    assert_eq!(requests_in(&drain(&mut bob_rx)), vec![(0, 0, 4)]);
    assert!(requests_in(&drain(&mut carol_rx)).is_empty());
    assert_eq!(swarm.requests().len(), 2);
}

#[tokio::test]
async fn test_have_from_unchoked_peer_schedules() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, mut bob_rx) = FakeLink::new(b"bob", 2);
    let (carol, mut carol_rx) = FakeLink::new(b"carol", 3);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);
    connect(&mut swarm, &carol);

    // unchoked before announcing anything
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &bob, Message::Unchoke);
    deliver(&mut swarm, &alice, Message::Have { piece: 1 });
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(1, 0, 4)]);

    // piece 1 is now outstanding, and carol still chokes us
    deliver(&mut swarm, &bob, Message::Have { piece: 1 });
    deliver(&mut swarm, &carol, Message::Have { piece: 2 });
    assert!(requests_in(&drain(&mut bob_rx)).is_empty());
    assert!(requests_in(&drain(&mut carol_rx)).is_empty());
}

#[tokio::test]
async fn test_closed_peer_requests_move_to_other_holder() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, mut bob_rx) = FakeLink::new(b"bob", 2);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);

    deliver(&mut swarm, &alice, bitfield(&[0x80]));
    deliver(&mut swarm, &bob, bitfield(&[0x80]));
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &bob, Message::Unchoke);
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);
    assert!(requests_in(&drain(&mut bob_rx)).is_empty());

    swarm.handle_event(SwarmEvent::Closed {
        peer: alice.peer_id,
        addr: alice.addr,
        error: Some(PeerError::ConnectionClosed),
    });
    assert_eq!(swarm.peer_count(), 1);
    assert!(!swarm.requests().has_request(0, alice.peer_id));
    assert_eq!(requests_in(&drain(&mut bob_rx)), vec![(0, 0, 4)]);
}

#[tokio::test]
async fn test_close_from_other_session_ignored() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, _alice_rx) = FakeLink::new(b"alice", 1);
    let (impostor, _impostor_rx) = FakeLink::new(b"alice", 9);
    connect(&mut swarm, &alice);

    // same peer id from another address is refused
    connect(&mut swarm, &impostor);
    assert_eq!(impostor.phase(), SessionPhase::Closed);
    assert_eq!(swarm.peer_count(), 1);

    swarm.handle_event(SwarmEvent::Closed {
        peer: impostor.peer_id,
        addr: impostor.addr,
        error: None,
    });
    assert_eq!(swarm.peer_count(), 1);
}

#[tokio::test]
async fn test_choke_clears_requests() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, mut bob_rx) = FakeLink::new(b"bob", 2);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);

    deliver(&mut swarm, &alice, bitfield(&[0x40]));
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &bob, Message::Unchoke);
    deliver(&mut swarm, &bob, bitfield(&[0x40]));
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(1, 0, 4)]);

    deliver(&mut swarm, &alice, Message::Choke);
    assert!(!alice.choking().can_request());
    assert!(!swarm.requests().has_request(1, alice.peer_id));
    assert_eq!(requests_in(&drain(&mut bob_rx)), vec![(1, 0, 4)]);
}

#[tokio::test]
async fn test_peer_interest_flags() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);

    deliver(&mut swarm, &alice, Message::Interested);
    assert!(alice.choking().peer_interested);
    deliver(&mut swarm, &alice, Message::NotInterested);
    assert!(!alice.choking().peer_interested);

    // we never serve uploads
    deliver(&mut swarm, &alice, Message::request(0, 0, 4));
    deliver(&mut swarm, &alice, Message::KeepAlive);
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test]
async fn test_unsolicited_piece_dropped() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);

    deliver(
        &mut swarm,
        &alice,
        Message::Piece {
            index: 0,
            begin: 0,
            data: Bytes::from_static(b"aaaa"),
        },
    );

    // still requestable once alice has it
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &alice, Message::Have { piece: 0 });
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);
}

#[tokio::test]
async fn test_partial_piece_rerequested() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &alice, Message::Have { piece: 0 });
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);

    deliver(
        &mut swarm,
        &alice,
        Message::Piece {
            index: 0,
            begin: 0,
            data: Bytes::from_static(b"aa"),
        },
    );
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);
}

#[tokio::test]
async fn test_tick_expires_requests() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &alice, Message::Have { piece: 2 });
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(2, 0, 2)]);

    swarm.tick(Instant::now());
    assert!(drain(&mut alice_rx).is_empty());

    swarm.tick(Instant::now() + Duration::from_secs(11));
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(2, 0, 2)]);
    assert!(swarm.requests().has_request(2, alice.peer_id));
}

#[tokio::test]
async fn test_write_reports() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, mut alice_rx) = FakeLink::new(b"alice", 1);
    connect(&mut swarm, &alice);
    deliver(&mut swarm, &alice, Message::Unchoke);
    deliver(&mut swarm, &alice, bitfield(&[0xE0]));
    drain(&mut alice_rx);

    swarm.handle_report(WriteReport::Written {
        index: 1,
        begin: 0,
        len: 4,
    });
    assert!(swarm.written().has(1));
    assert!(!swarm.is_complete());

    swarm.handle_report(WriteReport::Failed {
        index: 0,
        begin: 0,
        error: StorageError::WriterClosed,
    });
    assert!(!swarm.written().has(0));
    assert_eq!(requests_in(&drain(&mut alice_rx)), vec![(0, 0, 4)]);
}

#[tokio::test]
async fn test_shutdown_waits_for_acks() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, _alice_rx) = FakeLink::new(b"alice", 1);
    let (bob, _bob_rx) = FakeLink::new(b"bob", 2);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &bob);

    swarm.shutdown().await.unwrap();
    assert_eq!(swarm.peer_count(), 0);
    assert_eq!(alice.phase(), SessionPhase::Closed);
    assert_eq!(bob.phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn test_shutdown_timeout() {
    let temp = TempDir::new().unwrap();
    let (mut swarm, _tx) = test_swarm(&temp).await;
    let (alice, _alice_rx) = FakeLink::new(b"alice", 1);
    let (stuck, _stuck_rx) = FakeLink::stuck(b"stuck", 2);
    connect(&mut swarm, &alice);
    connect(&mut swarm, &stuck);

    assert!(matches!(
        swarm.shutdown().await,
        Err(SwarmError::ShutdownTimeout { pending: 1 })
    ));
    assert_eq!(swarm.peer_count(), 0);
}

async fn serve_requests(
    link: Arc<FakeLink>,
    mut outbox: mpsc::UnboundedReceiver<Message>,
    events: mpsc::Sender<SwarmEvent>,
) {
    while let Some(message) = outbox.recv().await {
        if let Message::Request {
            index,
            begin,
            length,
        } = message
        {
            let data = Bytes::from(vec![b'a' + index as u8; length as usize]);
            let event = SwarmEvent::Message {
                peer: link.peer_id,
                message: Message::Piece { index, begin, data },
            };
            if events.send(event).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_run_downloads_every_piece() {
    let temp = TempDir::new().unwrap();
    let (swarm, tx) = test_swarm(&temp).await;
    let (alice, alice_rx) = FakeLink::new(b"alice", 1);

    let link: Arc<dyn PeerLink> = alice.clone();
    tx.send(SwarmEvent::Connected(link)).await.unwrap();
    for message in [bitfield(&[0xE0]), Message::Unchoke] {
        tx.send(SwarmEvent::Message {
            peer: alice.peer_id,
            message,
        })
        .await
        .unwrap();
    }
    tokio::spawn(serve_requests(alice.clone(), alice_rx, tx.clone()));

    let outcome = swarm.run(std::future::pending()).await;
    assert!(outcome.completed);
    assert_eq!(outcome.pieces_written, 3);
    assert_eq!(outcome.piece_count, 3);
    assert!(outcome.errors.is_empty());
    assert_eq!(alice.phase(), SessionPhase::Closed);

    let contents = tokio::fs::read(temp.path().join("out.bin")).await.unwrap();
    assert_eq!(contents, b"aaaabbbbcc");
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let temp = TempDir::new().unwrap();
    let (swarm, tx) = test_swarm(&temp).await;
    let (alice, _alice_rx) = FakeLink::new(b"alice", 1);
    let link: Arc<dyn PeerLink> = alice.clone();
    tx.send(SwarmEvent::Connected(link)).await.unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(swarm.run(async {
        let _ = stop_rx.await;
    }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let outcome = run.await.unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.pieces_written, 0);
    assert!(outcome.errors.is_empty());
    assert_eq!(alice.phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn test_run_reports_stuck_shutdown() {
    let temp = TempDir::new().unwrap();
    let (swarm, tx) = test_swarm(&temp).await;
    let (stuck, _stuck_rx) = FakeLink::stuck(b"stuck", 1);
    let link: Arc<dyn PeerLink> = stuck.clone();
    tx.send(SwarmEvent::Connected(link)).await.unwrap();

    let outcome = swarm.run(tokio::time::sleep(Duration::from_millis(50))).await;
    assert!(matches!(
        outcome.errors.as_slice(),
        [SwarmError::ShutdownTimeout { pending: 1 }]
    ));
}

#[tokio::test]
async fn test_run_ends_when_no_sessions_remain() {
    let temp = TempDir::new().unwrap();
    let (swarm, tx) = test_swarm(&temp).await;
    drop(tx);

    let outcome = swarm.run(std::future::pending()).await;
    assert!(!outcome.completed);
    assert_eq!(outcome.piece_count, 3);
}

#[tokio::test]
async fn test_connect_peers_reports_failures_quietly() {
    use crate::metainfo::InfoHash;
    use crate::peer::SessionParams;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::channel(8);
    let params = SessionParams::new(InfoHash([0; 20]), PeerId::generate());
    assert_eq!(connect_peers(vec![addr, addr], params, tx), 1);

    // the only sender lived in the failed connect task
    assert!(rx.recv().await.is_none());
}
