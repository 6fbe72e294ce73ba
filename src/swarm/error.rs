use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("{pending} peer sessions did not acknowledge shutdown")]
    ShutdownTimeout { pending: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
