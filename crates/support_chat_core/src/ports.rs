//! crates/support_chat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the completion API, the storage backend and the way
//! uploaded files are read.

use crate::domain::CompletionRequest;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Could not decode file: {0}")]
    Decode(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends the ordered turns to the model and returns the full reply text.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String>;
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored string for `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// The original file name as selected by the user.
    fn name(&self) -> &str;

    /// Decodes the whole file body as UTF-8 text.
    async fn read_text(&self) -> PortResult<String>;
}
