use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("announce request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracker response is not bencode: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    /// The tracker answered with a `failure reason`.
    #[error("tracker refused announce: {0}")]
    Failure(String),

    #[error("malformed tracker response: {0}")]
    InvalidResponse(String),

    #[error("not an http(s) tracker url: {0}")]
    InvalidUrl(String),
}
