//! Generation request and its validation.
//!
//! A request is immutable once submitted; the workflow validates it before
//! the first network call so a bad request never reaches the remote service.

use serde::{Deserialize, Serialize};

/// Suffix appended to a caller-supplied prompt.
const LOOP_SUFFIX: &str = ". Create a smooth, seamless looping video.";

/// Complete prompt used when the caller supplies none.
const DEFAULT_PROMPT: &str = "Cinematic, realistic motion. Create a smooth, seamless looping video.";

/// Output aspect ratio for the generated video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9
    #[serde(rename = "16:9")]
    Landscape,

    /// 9:16
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Wire representation expected by the generation service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::Landscape
    }
}

/// A single image-to-video generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Source image bytes (must be non-empty)
    pub image_bytes: Vec<u8>,

    /// MIME type of the source image (must be an image type)
    pub mime_type: String,

    /// Caller-supplied motion prompt (may be empty)
    pub prompt: String,

    /// Output aspect ratio
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    /// Create a new request
    pub fn new(
        image_bytes: Vec<u8>,
        mime_type: impl Into<String>,
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
    ) -> Self {
        Self {
            image_bytes,
            mime_type: mime_type.into(),
            prompt: prompt.into(),
            aspect_ratio,
        }
    }

    /// Validate request invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.image_bytes.is_empty() {
            return Err("image bytes are empty".to_string());
        }

        if !self.mime_type.starts_with("image/") {
            return Err(format!("'{}' is not an image MIME type", self.mime_type));
        }

        Ok(())
    }

    /// The prompt actually sent to the service.
    ///
    /// A non-empty caller prompt gets the looping suffix appended; an empty
    /// one is replaced by the complete default prompt. The two paths are
    /// mutually exclusive.
    pub fn enhanced_prompt(&self) -> String {
        if self.prompt.trim().is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            format!("{}{}", self.prompt, LOOP_SUFFIX)
        }
    }
}
