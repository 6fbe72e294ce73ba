//! Swarm coordination.
//!
//! A [`Swarm`] owns everything shared between peer sessions: who holds which
//! piece ([`PieceLedger`]), which requests are in flight ([`RequestLedger`])
//! and which pieces are already on disk. Sessions never touch that state;
//! they publish [`SwarmEvent`]s into one channel and the coordinator answers
//! through each session's [`PeerLink`](crate::peer::PeerLink).
//!
//! # Scheduling
//!
//! Pieces are requested whole, lowest index first, from every holder that
//! has unchoked us. A piece is not requested again while any request for it
//! is outstanding; requests are cleared when the piece arrives, when the peer
//! chokes us or disconnects, when the write fails, or when they time out.
//!
//! # Examples
//!
//! ```no_run
//! use peerwire::peer::{PeerId, SessionParams};
//! use peerwire::metainfo::InfoHash;
//! use peerwire::storage::PieceWriter;
//! use peerwire::swarm::{connect_peers, Swarm, SwarmOptions};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (writer, reports) = PieceWriter::open("out.bin", 262144, 1 << 24).await?;
//! let (events_tx, events_rx) = mpsc::channel(1024);
//!
//! let params = SessionParams::new(InfoHash([0; 20]), PeerId::generate());
//! connect_peers(vec!["10.0.0.2:6881".parse()?], params, events_tx);
//!
//! let swarm = Swarm::new(events_rx, writer, reports, SwarmOptions::default());
//! let outcome = swarm.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
//! println!("{}/{} pieces", outcome.pieces_written, outcome.piece_count);
//! # Ok(())
//! # }
//! ```

mod availability;
mod coordinator;
mod error;
mod requests;

pub use crate::peer::SwarmEvent;
pub use availability::PieceLedger;
pub use coordinator::{connect_peers, Swarm, SwarmOptions, SwarmOutcome};
pub use error::SwarmError;
pub use requests::RequestLedger;

#[cfg(test)]
mod tests;
