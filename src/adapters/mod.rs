//! Backend interfaces for the remote generation service.
//!
//! Backends provide a unified interface for submitting jobs, re-querying
//! operation snapshots, and fetching delivered media. The workflow only
//! talks to the [`VideoBackend`] trait, which keeps the remote service
//! swappable and lets tests script one in memory.

pub mod veo;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{GenerationRequest, Operation};

// Re-export the Veo backend
pub use veo::VeoBackend;

/// Binary payload fetched from the delivery endpoint
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Raw video bytes
    pub bytes: Vec<u8>,

    /// MIME type, when the delivery endpoint reported one
    pub mime_type: Option<String>,
}

/// Failures at the backend boundary
#[derive(Debug, Error)]
pub enum BackendError {
    /// No credential was available when the call needed one
    #[error("no API key is configured")]
    MissingCredential,

    /// The HTTP transport failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered with a payload we could not interpret
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures and server-side errors are transient; a missing
    /// credential or a malformed payload is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::MissingCredential | Self::InvalidResponse(_) => false,
        }
    }
}

/// Trait for remote generation backends
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Submit a generation job, returning the initial operation snapshot
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation, BackendError>;

    /// Re-query the job, returning a fresh snapshot keyed by the current one
    async fn query(&self, operation: &Operation) -> Result<Operation, BackendError>;

    /// Fetch the binary payload behind a delivery URI
    async fn download(&self, uri: &str) -> Result<DownloadedMedia, BackendError>;
}
