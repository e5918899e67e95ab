//! Downloaded video artifacts.
//!
//! A [`VideoArtifact`] is the locally addressable result of a successful
//! generation. It is returned by value and owned by the caller; the workflow
//! keeps no reference to it and performs no cleanup of the backing file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated video materialized on local disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoArtifact {
    /// Path of the downloaded file
    pub path: PathBuf,

    /// MIME type of the payload
    pub mime_type: String,

    /// Filename to offer when the user exports the video
    pub suggested_filename: String,

    /// When the artifact was downloaded
    pub created_at: DateTime<Utc>,

    /// Size in bytes
    pub size_bytes: u64,
}

impl VideoArtifact {
    /// Create an artifact record for a file already written to disk
    pub fn new(path: PathBuf, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let mime_type = mime_type.into();
        let suggested_filename = format!("stillmotion.{}", extension_for(&mime_type));
        Self {
            path,
            mime_type,
            suggested_filename,
            created_at: Utc::now(),
            size_bytes,
        }
    }
}

/// File extension for a video MIME type
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        // The service delivers MP4 unless it says otherwise
        _ => "mp4",
    }
}
