//! Disk output for downloaded pieces.
//!
//! The swarm never waits on the disk. [`PieceWriter::write`] validates the
//! target range and queues the block; a background task performs the
//! positioned write and answers on a report channel, so the outcome of every
//! accepted write arrives as a [`WriteReport`].
//!
//! # Examples
//!
//! ```no_run
//! use bytes::Bytes;
//! use peerwire::storage::{PieceWriter, WriteReport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (writer, mut reports) = PieceWriter::open("out/file.bin", 16384, 40000).await?;
//!
//! writer.write(1, 0, Bytes::from(vec![0u8; 16384]))?;
//! if let Some(WriteReport::Written { index, len, .. }) = reports.recv().await {
//!     println!("piece {} done ({} bytes)", index, len);
//! }
//!
//! writer.close().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod writer;

pub use error::StorageError;
pub use writer::{PieceWriter, WriteReport};
