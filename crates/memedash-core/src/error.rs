//! Error types for the dashboard services.

use crate::storage::StorageError;
use memedash_protocol::ApiError;
use thiserror::Error;

/// Errors raised while wiring dashboard services together.
#[derive(Debug, Error)]
pub enum MemedashCoreError {
    /// The API client could not be constructed.
    #[error("api client error: {0}")]
    Api(#[from] ApiError),
    /// Durable settings storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
