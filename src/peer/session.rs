use super::choking::ChokingState;
use super::error::PeerError;
use super::message::{read_handshake, FrameReader, Handshake, Message};
use super::peer_id::PeerId;
use crate::constants::{
    CONNECT_TIMEOUT, DEFAULT_MAX_FRAME_LEN, KEEP_ALIVE_INTERVAL, PIECE_PREAMBLE_LEN, READ_TIMEOUT,
};
use crate::metainfo::InfoHash;
use parking_lot::Mutex;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info_span, trace, Instrument};

/// Lifecycle of a peer session. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SessionPhase {
    /// TCP connection in progress.
    #[default]
    Connecting,
    /// Connected, exchanging handshakes.
    Handshaking,
    /// Handshake verified; messages flow both ways.
    Active,
    /// The driver is tearing the connection down.
    Closing,
    /// The connection is gone and the swarm has been told.
    Closed,
}

/// What a session publishes to the coordinator.
#[derive(Debug)]
pub enum SwarmEvent {
    /// Handshake verified; always the first event for a session.
    Connected(Arc<dyn PeerLink>),
    /// A frame received from the peer. Keep-alives are not forwarded.
    Message { peer: PeerId, message: Message },
    /// The session ended. Always the last event for a session.
    Closed {
        peer: PeerId,
        addr: SocketAddr,
        error: Option<PeerError>,
    },
}

/// The coordinator's view of one connected peer.
///
/// Implemented by [`PeerSession`] for real connections; tests drive the
/// coordinator with in-memory implementations.
pub trait PeerLink: Send + Sync {
    fn peer_id(&self) -> PeerId;

    fn addr(&self) -> SocketAddr;

    fn phase(&self) -> SessionPhase;

    fn choking(&self) -> ChokingState;

    fn set_am_choking(&self, choking: bool);

    fn set_am_interested(&self, interested: bool);

    fn set_peer_choking(&self, choking: bool);

    fn set_peer_interested(&self, interested: bool);

    /// Queues a message for the peer. Fails once the session has closed.
    fn send(&self, message: Message) -> Result<(), PeerError>;

    /// Asks the session to close. The receiver resolves once it has.
    fn shutdown(&self) -> oneshot::Receiver<()>;
}

impl fmt::Debug for dyn PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("peer_id", &self.peer_id())
            .field("addr", &self.addr())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Per-connection settings shared by every session of a swarm.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub info_hash: InfoHash,
    /// Our own peer ID, sent in the handshake.
    pub peer_id: PeerId,
    /// Bounds the TCP connect and, separately, the handshake exchange.
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub keep_alive_interval: Duration,
    pub max_frame_len: usize,
}

impl SessionParams {
    pub fn new(info_hash: InfoHash, peer_id: PeerId) -> Self {
        Self {
            info_hash,
            peer_id,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            keep_alive_interval: KEEP_ALIVE_INTERVAL,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Raises the frame limit so a whole piece fits in one `Piece` frame.
    pub fn with_piece_length(mut self, piece_length: u64) -> Self {
        let needed = usize::try_from(piece_length)
            .unwrap_or(usize::MAX)
            .saturating_add(PIECE_PREAMBLE_LEN);
        self.max_frame_len = self.max_frame_len.max(needed);
        self
    }
}

enum PeerCommand {
    Send(Message),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    choking: ChokingState,
}

/// Handle to a live connection with one remote peer.
///
/// The socket itself is owned by a spawned driver task that reads frames into
/// the swarm's event channel and writes queued messages out. The handle only
/// queues commands and exposes the session's flags.
pub struct PeerSession {
    addr: SocketAddr,
    peer_id: PeerId,
    state: Arc<Mutex<SessionState>>,
    commands: mpsc::UnboundedSender<PeerCommand>,
}

impl PeerSession {
    /// Opens a connection, exchanges handshakes and starts the driver.
    ///
    /// The driver publishes [`SwarmEvent::Connected`] before any message from
    /// the peer, so callers do not need to register the returned handle.
    pub async fn connect(
        addr: SocketAddr,
        params: &SessionParams,
        events: mpsc::Sender<SwarmEvent>,
    ) -> Result<Arc<Self>, PeerError> {
        let state = Arc::new(Mutex::new(SessionState::default()));

        let stream = timeout(params.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PeerError::Timeout)??;

        state.lock().phase = SessionPhase::Handshaking;
        let (stream, theirs) = timeout(params.connect_timeout, exchange_handshakes(stream, params))
            .await
            .map_err(|_| PeerError::Timeout)??;

        debug!(%addr, peer = %theirs.peer_id, "handshake complete");
        Ok(Self::start(stream, addr, theirs.peer_id, params, state, events))
    }

    fn start(
        stream: TcpStream,
        addr: SocketAddr,
        peer_id: PeerId,
        params: &SessionParams,
        state: Arc<Mutex<SessionState>>,
        events: mpsc::Sender<SwarmEvent>,
    ) -> Arc<Self> {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            addr,
            peer_id,
            state: state.clone(),
            commands: commands_tx,
        });

        let driver = SessionDriver {
            peer_id,
            addr,
            state,
            events,
            commands: commands_rx,
            frames: FrameReader::new(params.max_frame_len),
            read_timeout: params.read_timeout,
            keep_alive_interval: params.keep_alive_interval,
        };
        let link: Arc<dyn PeerLink> = session.clone();
        tokio::spawn(
            driver
                .run(stream, link)
                .instrument(info_span!("peer", %addr, peer = %peer_id)),
        );

        session
    }
}

impl PeerLink for PeerSession {
    fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    fn choking(&self) -> ChokingState {
        self.state.lock().choking
    }

    fn set_am_choking(&self, choking: bool) {
        self.state.lock().choking.am_choking = choking;
    }

    fn set_am_interested(&self, interested: bool) {
        self.state.lock().choking.am_interested = interested;
    }

    fn set_peer_choking(&self, choking: bool) {
        self.state.lock().choking.peer_choking = choking;
    }

    fn set_peer_interested(&self, interested: bool) {
        self.state.lock().choking.peer_interested = interested;
    }

    fn send(&self, message: Message) -> Result<(), PeerError> {
        let mut state = self.state.lock();
        if state.phase >= SessionPhase::Closing {
            return Err(PeerError::ConnectionClosed);
        }
        state.choking.record_sent(&message);
        self.commands
            .send(PeerCommand::Send(message))
            .map_err(|_| PeerError::ConnectionClosed)
    }

    fn shutdown(&self) -> oneshot::Receiver<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if let Err(mpsc::error::SendError(PeerCommand::Shutdown(ack_tx))) =
            self.commands.send(PeerCommand::Shutdown(ack_tx))
        {
            // Driver already gone.
            let _ = ack_tx.send(());
        }
        ack_rx
    }
}

async fn exchange_handshakes(
    mut stream: TcpStream,
    params: &SessionParams,
) -> Result<(TcpStream, Handshake), PeerError> {
    let ours = Handshake::new(params.info_hash, params.peer_id);
    stream.write_all(&ours.encode()).await?;

    let theirs = read_handshake(&mut stream).await?;
    if theirs.info_hash != params.info_hash {
        return Err(PeerError::HandshakeMismatch("wrong info hash"));
    }
    if theirs.peer_id == params.peer_id {
        return Err(PeerError::HandshakeMismatch("connected to ourselves"));
    }
    Ok((stream, theirs))
}

enum Exit {
    Shutdown(oneshot::Sender<()>),
    Failed(PeerError),
    /// The coordinator dropped its end of a channel.
    Detached,
}

struct SessionDriver {
    peer_id: PeerId,
    addr: SocketAddr,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::Sender<SwarmEvent>,
    commands: mpsc::UnboundedReceiver<PeerCommand>,
    frames: FrameReader,
    read_timeout: Duration,
    keep_alive_interval: Duration,
}

impl SessionDriver {
    async fn run(self, stream: TcpStream, link: Arc<dyn PeerLink>) {
        let SessionDriver {
            peer_id,
            addr,
            state,
            events,
            mut commands,
            frames,
            read_timeout,
            keep_alive_interval,
        } = self;

        state.lock().phase = SessionPhase::Active;
        if events.send(SwarmEvent::Connected(link)).await.is_err() {
            state.lock().phase = SessionPhase::Closed;
            return;
        }

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        let exit = tokio::select! {
            exit = read_loop(peer_id, &mut reader, frames, read_timeout, &events) => exit,
            exit = write_loop(&mut writer, &mut commands, keep_alive_interval) => exit,
        };

        state.lock().phase = SessionPhase::Closing;
        let mut acks = Vec::new();
        let error = match exit {
            Exit::Shutdown(ack) => {
                let _ = writer.shutdown().await;
                acks.push(ack);
                None
            }
            Exit::Failed(e) => Some(e),
            Exit::Detached => None,
        };
        drop(reader);
        drop(writer);

        commands.close();
        while let Ok(command) = commands.try_recv() {
            if let PeerCommand::Shutdown(ack) = command {
                acks.push(ack);
            }
        }
        state.lock().phase = SessionPhase::Closed;

        match &error {
            Some(e) => debug!("session closed: {}", e),
            None => debug!("session closed"),
        }

        for ack in acks {
            let _ = ack.send(());
        }
        let _ = events
            .send(SwarmEvent::Closed {
                peer: peer_id,
                addr,
                error,
            })
            .await;
    }
}

async fn read_loop<R>(
    peer: PeerId,
    reader: &mut R,
    frames: FrameReader,
    read_timeout: Duration,
    events: &mpsc::Sender<SwarmEvent>,
) -> Exit
where
    R: AsyncRead + Unpin,
{
    loop {
        let message = match timeout(read_timeout, frames.read_message(reader)).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => return Exit::Failed(e),
            Err(_) => return Exit::Failed(PeerError::Timeout),
        };
        trace!(kind = ?message.id(), "received");

        if message == Message::KeepAlive {
            continue;
        }
        if events
            .send(SwarmEvent::Message { peer, message })
            .await
            .is_err()
        {
            return Exit::Detached;
        }
    }
}

async fn write_loop<W>(
    writer: &mut W,
    commands: &mut mpsc::UnboundedReceiver<PeerCommand>,
    keep_alive_interval: Duration,
) -> Exit
where
    W: AsyncWrite + Unpin,
{
    loop {
        let message = match timeout(keep_alive_interval, commands.recv()).await {
            Ok(Some(PeerCommand::Send(message))) => message,
            Ok(Some(PeerCommand::Shutdown(ack))) => return Exit::Shutdown(ack),
            Ok(None) => return Exit::Detached,
            Err(_) => Message::KeepAlive,
        };

        trace!(kind = ?message.id(), "sending");
        if let Err(e) = write_message(writer, &message).await {
            return Exit::Failed(e);
        }
    }
}

async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), PeerError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&message.encode()).await?;
    writer.flush().await?;
    Ok(())
}
