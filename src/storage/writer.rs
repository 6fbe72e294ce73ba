use super::error::StorageError;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Outcome of one accepted write.
#[derive(Debug)]
pub enum WriteReport {
    Written {
        index: u32,
        begin: u32,
        len: usize,
    },
    Failed {
        index: u32,
        begin: u32,
        error: StorageError,
    },
}

impl WriteReport {
    pub fn index(&self) -> u32 {
        match self {
            WriteReport::Written { index, .. } | WriteReport::Failed { index, .. } => *index,
        }
    }
}

struct WriteJob {
    index: u32,
    begin: u32,
    offset: u64,
    data: Bytes,
}

/// Writes piece data into a single pre-sized output file.
pub struct PieceWriter {
    piece_length: u64,
    total_length: u64,
    jobs: mpsc::UnboundedSender<WriteJob>,
    task: JoinHandle<Result<(), StorageError>>,
}

impl PieceWriter {
    /// Opens (or creates) `path`, sizes it to `total_length` and starts the
    /// background writer.
    pub async fn open(
        path: impl AsRef<Path>,
        piece_length: u64,
        total_length: u64,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WriteReport>), StorageError> {
        if piece_length == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "piece length must be positive",
            )
            .into());
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .await?;
        file.set_len(total_length).await?;
        debug!("opened {} ({} bytes)", path.display(), total_length);

        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(file, jobs_rx, reports_tx));

        Ok((
            Self {
                piece_length,
                total_length,
                jobs: jobs_tx,
                task,
            },
            reports_rx,
        ))
    }

    pub fn piece_count(&self) -> u32 {
        self.total_length.div_ceil(self.piece_length) as u32
    }

    /// True length of piece `index`, or `None` past the last piece.
    pub fn piece_len(&self, index: u32) -> Option<u64> {
        let start = u64::from(index) * self.piece_length;
        if start >= self.total_length {
            return None;
        }
        Some(self.piece_length.min(self.total_length - start))
    }

    /// Queues `data` for `index * piece_length + begin`.
    ///
    /// Range errors are returned here without touching the disk; I/O errors
    /// arrive later as [`WriteReport::Failed`].
    pub fn write(&self, index: u32, begin: u32, data: Bytes) -> Result<(), StorageError> {
        let piece_len = self
            .piece_len(index)
            .ok_or(StorageError::InvalidPieceIndex(index))?;

        let end = u64::from(begin) + data.len() as u64;
        if end > piece_len {
            return Err(StorageError::InvalidBlockOffset {
                piece: index,
                offset: begin,
                length: data.len(),
            });
        }

        let job = WriteJob {
            index,
            begin,
            offset: u64::from(index) * self.piece_length + u64::from(begin),
            data,
        };
        self.jobs.send(job).map_err(|_| StorageError::WriterClosed)
    }

    /// Finishes every queued write, then syncs the file.
    pub async fn close(self) -> Result<(), StorageError> {
        drop(self.jobs);
        self.task.await.map_err(|_| StorageError::WriterClosed)?
    }
}

async fn run_writer(
    mut file: File,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
    reports: mpsc::UnboundedSender<WriteReport>,
) -> Result<(), StorageError> {
    while let Some(job) = jobs.recv().await {
        let report = match write_at(&mut file, job.offset, &job.data).await {
            Ok(()) => {
                trace!(index = job.index, begin = job.begin, "block written");
                WriteReport::Written {
                    index: job.index,
                    begin: job.begin,
                    len: job.data.len(),
                }
            }
            Err(error) => {
                warn!(index = job.index, "write failed: {}", error);
                WriteReport::Failed {
                    index: job.index,
                    begin: job.begin,
                    error,
                }
            }
        };
        // The swarm may already be gone during shutdown.
        let _ = reports.send(report);
    }

    file.sync_data().await?;
    Ok(())
}

async fn write_at(file: &mut File, offset: u64, data: &[u8]) -> Result<(), StorageError> {
    file.seek(SeekFrom::Start(offset)).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}
