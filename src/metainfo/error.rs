use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors from reading a `.torrent` file.
#[derive(Debug, Error)]
pub enum MetainfoError {
    #[error("torrent is not valid bencode: {0}")]
    Bencode(#[from] BencodeError),

    #[error("torrent is missing `{0}`")]
    MissingField(&'static str),

    /// Present but of the wrong type or out of range.
    #[error("torrent has an invalid `{0}`")]
    InvalidField(&'static str),

    /// A hex info hash was not 40 hex digits.
    #[error("info hash must be 40 hex digits")]
    InvalidInfoHash,

    #[error("failed to read torrent: {0}")]
    Io(#[from] std::io::Error),
}
