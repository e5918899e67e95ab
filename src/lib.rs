//! stillmotion - turn still photos into seamless looping videos
//!
//! A Rust client for Veo image-to-video generation. The remote job is
//! asynchronous: stillmotion submits it, polls the operation to a terminal
//! state, downloads the delivered video, and exposes the whole lifecycle
//! through a small state machine the presentation layer observes.
//!
//! # Architecture
//!
//! The pipeline runs as one sequential async task:
//! - Submit: build the enhanced prompt and dispatch the job
//! - Poll: re-query at a fixed interval until done, bounded by a deadline
//!   and a cancellation token
//! - Retrieve: authenticate the delivery URI and materialize the video
//!   as a local file
//!
//! # Modules
//!
//! - `adapters`: Remote generation backends (Veo)
//! - `core`: Workflow logic (Poller, Workflow, Session)
//! - `credentials`: Host credential gate
//! - `domain`: Data structures (GenerationRequest, Operation, VideoArtifact)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Generate a looping video from a photo
//! stillmotion generate photo.jpg --prompt "Gentle breeze"
//!
//! # Check the credential gate
//! stillmotion auth
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod credentials;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{BackendError, DownloadedMedia, VeoBackend, VideoBackend};
pub use crate::core::{
    GenerationSession, GenerationStatus, PollSettings, RetryPolicy, StartError, Workflow,
    WorkflowSettings,
};
pub use credentials::{CredentialError, CredentialHost, EnvCredentialHost, UnsupportedHost};
pub use domain::{AspectRatio, GenerationRequest, Operation, VideoArtifact};
pub use error::{GenerationError, PollError, RetrievalError, SubmissionError};
