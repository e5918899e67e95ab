//! Client-visible generation state machine.
//!
//! A [`GenerationSession`] is the status projection the presentation layer
//! observes and reacts to. It owns the four input fields (image, prompt,
//! aspect ratio are the caller's; the image doubles as the reset trigger)
//! and the outcome of the last attempt (artifact or error message). The
//! session transitions only in response to workflow events and the four
//! user actions: start, reset, retry-acknowledge, cancel.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::credentials::CredentialHost;
use crate::domain::{AspectRatio, GenerationRequest, VideoArtifact};

use super::workflow::Workflow;

/// Presentation-visible status of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Waiting for input; the only state a start is valid from
    Idle,

    /// The pipeline is running
    Generating,

    /// The last attempt produced an artifact
    Complete,

    /// The last attempt failed with a message
    Error,
}

impl Default for GenerationStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// Reasons a start action is rejected without leaving Idle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StartError {
    /// Start is only valid from Idle
    #[error("a generation is already in progress or unacknowledged")]
    AlreadyActive,

    /// No image has been selected
    #[error("no image selected")]
    NoImage,

    /// The credential gate did not pass; shown as a notice, not a crash
    #[error("no API credential is configured")]
    CredentialMissing,
}

/// The image chosen for animation
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// State machine wrapping one generation workflow at a time
#[derive(Default)]
pub struct GenerationSession {
    status: GenerationStatus,
    image: Option<SelectedImage>,
    prompt: String,
    aspect_ratio: AspectRatio,
    error_message: Option<String>,
    artifact: Option<VideoArtifact>,
}

impl GenerationSession {
    /// Create a session in the Idle state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Message carried by the Error state
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Artifact carried by the Complete state
    pub fn artifact(&self) -> Option<&VideoArtifact> {
        self.artifact.as_ref()
    }

    /// Select a new source image.
    ///
    /// Discards any previous outcome and returns to Idle; ignored while a
    /// generation is running.
    pub fn select_image(&mut self, bytes: Vec<u8>, mime_type: impl Into<String>) {
        if self.status == GenerationStatus::Generating {
            warn!("Ignoring image selection while generating");
            return;
        }

        self.image = Some(SelectedImage {
            bytes,
            mime_type: mime_type.into(),
        });
        self.artifact = None;
        self.error_message = None;
        self.status = GenerationStatus::Idle;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Run the pipeline for the currently selected inputs.
    ///
    /// Valid only from Idle with an image selected and the credential gate
    /// passing; rejection leaves the session untouched at Idle. The session
    /// is Generating for the duration of the call and ends at Complete or
    /// Error, or back at Idle with inputs retained when the token fires.
    pub async fn start(
        &mut self,
        workflow: &Workflow,
        credentials: &dyn CredentialHost,
        cancel: &CancellationToken,
    ) -> Result<GenerationStatus, StartError> {
        if self.status != GenerationStatus::Idle {
            return Err(StartError::AlreadyActive);
        }

        let image = self.image.as_ref().ok_or(StartError::NoImage)?;

        if !credentials.has_credential().await {
            return Err(StartError::CredentialMissing);
        }

        let request = GenerationRequest::new(
            image.bytes.clone(),
            image.mime_type.clone(),
            self.prompt.clone(),
            self.aspect_ratio,
        );

        self.status = GenerationStatus::Generating;
        self.error_message = None;
        self.artifact = None;

        match workflow.generate(&request, cancel).await {
            Ok(artifact) => {
                self.complete(artifact);
            }
            Err(e) if e.is_cancelled() => {
                info!("Generation cancelled, returning to idle");
                self.status = GenerationStatus::Idle;
            }
            Err(e) => {
                self.fail(e.user_message());
            }
        }

        Ok(self.status)
    }

    /// Discard everything and return to Idle
    pub fn reset(&mut self) {
        self.status = GenerationStatus::Idle;
        self.image = None;
        self.prompt.clear();
        self.aspect_ratio = AspectRatio::default();
        self.error_message = None;
        self.artifact = None;
    }

    /// Dismiss an error without discarding the selected inputs.
    ///
    /// Only meaningful from Error; enables re-submission of the same image.
    pub fn acknowledge_error(&mut self) {
        if self.status != GenerationStatus::Error {
            return;
        }
        self.status = GenerationStatus::Idle;
        self.error_message = None;
    }

    fn complete(&mut self, artifact: VideoArtifact) {
        self.status = GenerationStatus::Complete;
        self.artifact = Some(artifact);
        self.error_message = None;
    }

    fn fail(&mut self, message: String) {
        self.status = GenerationStatus::Error;
        self.error_message = Some(message);
        self.artifact = None;
    }
}
