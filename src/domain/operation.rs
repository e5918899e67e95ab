//! Remote operation snapshots.
//!
//! An [`Operation`] is an immutable snapshot of the remote asynchronous job.
//! Re-querying the service yields a fresh snapshot that supersedes the
//! current one; snapshots are never mutated in place. The serde model
//! mirrors the service's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Snapshot of a remote video-generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Remote handle used to re-query this job
    pub name: String,

    /// Terminal-state flag
    #[serde(default)]
    pub done: bool,

    /// Error payload, present when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,

    /// Result payload, present when the job succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,

    /// Progress metadata reported by the service (logged, not interpreted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Error payload carried by a failed operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result payload of a completed operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// Generated video descriptors, in service order
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideo>,
}

/// One generated video descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoHandle>,
}

/// Delivery handle for a generated video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoHandle {
    /// Authenticated-fetch URI for the binary payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Operation {
    /// A freshly created, non-terminal snapshot
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            error: None,
            response: None,
            metadata: None,
        }
    }

    /// Message of the error payload, if the job failed
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }

    /// Delivery URI of the first generated video, if any
    pub fn first_video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }

    /// MIME type reported for the first generated video
    pub fn first_video_mime_type(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .mime_type
            .as_deref()
    }
}
