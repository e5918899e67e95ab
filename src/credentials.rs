//! Credential gate for the generation workflow.
//!
//! The host process supplies credentials; the workflow never stores them.
//! Every check re-queries the host live, since the active credential can be
//! rotated between checks. A host without a selection flow is a normal,
//! handled variant: `request_credential` reports `HostUnavailable` and the
//! caller shows an "environment not supported" notice instead of crashing.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the host credential-selection flow.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The host provides no credential-selection integration
    #[error("credential selection is not supported in this environment")]
    HostUnavailable,

    /// The user dismissed the selection flow without choosing a credential
    #[error("credential selection was cancelled")]
    UserCancelled,
}

/// Host-provided credential capability.
///
/// Implementations must read host state live on every call rather than
/// caching it; submission and retrieval each re-read the key at their point
/// of use.
#[async_trait]
pub trait CredentialHost: Send + Sync {
    /// Whether a usable credential is currently configured.
    ///
    /// Never errors: a host that cannot be reached reads as "not configured".
    async fn has_credential(&self) -> bool;

    /// Invoke the host's credential-selection flow.
    async fn request_credential(&self) -> Result<(), CredentialError>;

    /// The active credential value, read live.
    async fn api_key(&self) -> Option<String>;
}

/// Credential host backed by a process environment variable.
///
/// The variable is read on every call, so rotating the credential in the
/// environment takes effect mid-workflow.
pub struct EnvCredentialHost {
    var: String,
}

impl EnvCredentialHost {
    /// Create a host reading the given environment variable
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialHost for EnvCredentialHost {
    async fn has_credential(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    async fn request_credential(&self) -> Result<(), CredentialError> {
        // A plain environment has no selection UI to open.
        Err(CredentialError::HostUnavailable)
    }

    async fn api_key(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The absent-host variant: no integration is available at all.
#[derive(Debug, Default)]
pub struct UnsupportedHost;

#[async_trait]
impl CredentialHost for UnsupportedHost {
    async fn has_credential(&self) -> bool {
        false
    }

    async fn request_credential(&self) -> Result<(), CredentialError> {
        Err(CredentialError::HostUnavailable)
    }

    async fn api_key(&self) -> Option<String> {
        None
    }
}
