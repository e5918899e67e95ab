//! Error taxonomy for the generation workflow.
//!
//! Each pipeline stage has its own error type; the pipeline boundary wraps
//! whichever stage failed into a [`GenerationError`] and renders the single
//! human-readable message that reaches the presentation layer. Nothing is
//! silently swallowed except credential-presence checks, which degrade to
//! "not configured" in the credential gate.

use thiserror::Error;

use crate::adapters::BackendError;

/// Failure while building or dispatching the generation request.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The request violated an invariant before it was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The remote submission call failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure while polling the operation to a terminal state.
#[derive(Debug, Error)]
pub enum PollError {
    /// The configured deadline expired before the operation completed
    #[error("video generation timed out after {elapsed_seconds}s")]
    TimedOut { elapsed_seconds: u64 },

    /// The workflow was cancelled while waiting
    #[error("video generation was cancelled")]
    Cancelled,

    /// A status query failed past the transient-retry budget
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure while turning a terminal operation into a local artifact.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The operation completed carrying an error payload
    #[error("{message}")]
    RemoteGenerationFailed { message: String },

    /// The operation completed without any generated-video URI
    #[error("No video URI returned from the API.")]
    MissingArtifact,

    /// The delivery endpoint answered with a non-success status
    #[error("Failed to download video: {status}")]
    DownloadFailed { status: u16 },

    /// The download transport itself failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Writing the downloaded bytes to disk failed
    #[error("failed to store downloaded video: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline-boundary error: exactly one failing stage per attempt.
///
/// The workflow converts this into one Error-state transition; no partial or
/// ambiguous states are exposed to the presentation layer.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("polling failed: {0}")]
    Poll(#[from] PollError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
}

impl GenerationError {
    /// True when the attempt ended because the caller cancelled it.
    ///
    /// The session routes cancellation back to Idle instead of Error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Poll(PollError::Cancelled))
    }

    /// The single message delivered with the Error-state transition.
    ///
    /// Remote error payloads pass through verbatim so the user sees what the
    /// service reported; everything else gets a short stage-specific line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Submission(SubmissionError::InvalidRequest(msg)) => {
                format!("Invalid generation request: {}", msg)
            }
            Self::Submission(SubmissionError::Backend(e)) => {
                format!("Failed to start video generation: {}", e)
            }
            Self::Poll(PollError::TimedOut { elapsed_seconds }) => {
                format!("Video generation timed out after {}s.", elapsed_seconds)
            }
            Self::Poll(PollError::Cancelled) => "Video generation was cancelled.".to_string(),
            Self::Poll(PollError::Backend(e)) => {
                format!("Lost contact with the generation service: {}", e)
            }
            Self::Retrieval(RetrievalError::RemoteGenerationFailed { message }) => message.clone(),
            Self::Retrieval(e) => e.to_string(),
        }
    }
}
