//! The submit -> poll -> retrieve pipeline.
//!
//! One workflow instance drives one generation attempt as a single
//! sequential async task. Every failure is funneled into one
//! [`GenerationError`] at the pipeline boundary; the session converts that
//! into a single Error-state transition. The returned artifact is owned by
//! the caller; the workflow keeps no reference to it.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::{BackendError, DownloadedMedia, VideoBackend};
use crate::domain::{artifact, GenerationRequest, Operation, VideoArtifact};
use crate::error::{GenerationError, PollError, RetrievalError, SubmissionError};

use super::poller::{self, PollSettings};

/// Settings for a workflow instance
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Poll loop settings
    pub poll: PollSettings,

    /// Directory downloaded artifacts are written into
    pub artifacts_dir: PathBuf,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            artifacts_dir: std::env::temp_dir().join("stillmotion"),
        }
    }
}

/// Drives the generation pipeline against a backend
pub struct Workflow {
    backend: Arc<dyn VideoBackend>,
    settings: WorkflowSettings,
}

impl Workflow {
    /// Create a workflow over the given backend
    pub fn new(backend: Arc<dyn VideoBackend>, settings: WorkflowSettings) -> Self {
        Self { backend, settings }
    }

    /// Run submit -> poll -> retrieve for one request.
    ///
    /// The cancellation token is honored at every suspension point: the
    /// submission call, each poll wait/query, and the download.
    #[instrument(skip(self, request, cancel), fields(backend = %self.backend.name()))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact, GenerationError> {
        let job = Uuid::new_v4();

        request
            .validate()
            .map_err(SubmissionError::InvalidRequest)?;

        info!(%job, aspect_ratio = request.aspect_ratio.as_str(), "Submitting generation job");
        let operation = tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled.into()),
            result = self.backend.submit(request) => {
                result.map_err(SubmissionError::Backend)?
            }
        };

        info!(%job, operation = %operation.name, "Job accepted, polling for completion");
        let terminal =
            poller::await_completion(self.backend.as_ref(), operation, &self.settings.poll, cancel)
                .await?;

        let uri = Self::resolve_uri(&terminal)?;

        info!(%job, "Generation finished, downloading artifact");
        let media = tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled.into()),
            result = self.backend.download(uri) => {
                result.map_err(download_error)?
            }
        };

        let artifact = self.materialize(media, &terminal).await?;
        info!(%job, path = %artifact.path.display(), size_bytes = artifact.size_bytes, "Generation complete");

        Ok(artifact)
    }

    /// Extract the delivery URI from a terminal snapshot.
    ///
    /// An error payload wins over any result payload; a success without a
    /// URI is a missing artifact. The download is never attempted for a
    /// failed operation.
    fn resolve_uri(operation: &Operation) -> Result<&str, RetrievalError> {
        if operation.error.is_some() {
            let message = operation
                .error_message()
                .unwrap_or("Video generation failed.")
                .to_string();
            return Err(RetrievalError::RemoteGenerationFailed { message });
        }

        operation
            .first_video_uri()
            .ok_or(RetrievalError::MissingArtifact)
    }

    /// Write the downloaded bytes into the artifacts directory
    async fn materialize(
        &self,
        media: DownloadedMedia,
        operation: &Operation,
    ) -> Result<VideoArtifact, RetrievalError> {
        let mime_type = media
            .mime_type
            .filter(|m| m.starts_with("video/"))
            .or_else(|| operation.first_video_mime_type().map(str::to_string))
            .unwrap_or_else(|| "video/mp4".to_string());

        tokio::fs::create_dir_all(&self.settings.artifacts_dir).await?;

        let filename = format!(
            "stillmotion-{}-{:.8}.{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            Uuid::new_v4().simple().to_string(),
            artifact::extension_for(&mime_type)
        );
        let path = self.settings.artifacts_dir.join(filename);

        tokio::fs::write(&path, &media.bytes).await?;

        Ok(VideoArtifact::new(path, mime_type, media.bytes.len() as u64))
    }
}

/// Map a delivery-endpoint failure into the retrieval taxonomy
fn download_error(error: BackendError) -> RetrievalError {
    match error {
        BackendError::Api { status, .. } => RetrievalError::DownloadFailed { status },
        other => RetrievalError::Backend(other),
    }
}
