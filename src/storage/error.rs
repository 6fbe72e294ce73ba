use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("output file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("piece {0} is past the end of the torrent")]
    InvalidPieceIndex(u32),

    /// The block would run past the end of its piece.
    #[error("block out of range: piece {piece}, offset {offset}, length {length}")]
    InvalidBlockOffset { piece: u32, offset: u32, length: usize },

    #[error("piece writer is closed")]
    WriterClosed,
}
