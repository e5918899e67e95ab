//! Shared test doubles: a scripted backend and a fake credential host.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use stillmotion::credentials::{CredentialError, CredentialHost};
use stillmotion::domain::{GeneratedVideo, OperationError, OperationResponse, VideoHandle};
use stillmotion::{BackendError, DownloadedMedia, GenerationRequest, Operation, VideoBackend};

/// One scripted answer to a status query
pub enum QueryStep {
    /// A fresh snapshot that is still running
    Pending,
    /// A terminal snapshot
    Terminal(Operation),
    /// An API failure with this status
    Fail { status: u16, message: &'static str },
}

/// Scripted answer to the download call
pub enum DownloadStep {
    Ok {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    Fail {
        status: u16,
    },
}

/// In-memory backend driven by a query script.
///
/// Once the script is exhausted every further query answers Pending, which
/// models an operation that never completes (for deadline and cancellation
/// tests). Queries record overlap so tests can assert strict sequencing.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<QueryStep>>,
    download: Mutex<DownloadStep>,
    /// Requests seen by submit, in order
    pub submitted: Mutex<Vec<GenerationRequest>>,
    /// URIs fetched by download, in order
    pub downloads: Mutex<Vec<String>>,
    /// Number of queries answered
    pub query_count: AtomicU32,
    /// Set if a query started while another was still in flight
    pub overlap: AtomicBool,
    in_flight: AtomicBool,
    /// Artificial latency per query
    pub query_delay: Duration,
    /// Key reads observed via the attached host (submit, then download)
    pub keys_seen: Mutex<Vec<Option<String>>>,
    host: Option<Arc<FakeHost>>,
    rotate_on_terminal: Mutex<Option<String>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<QueryStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            download: Mutex::new(DownloadStep::Ok {
                bytes: b"video-bytes".to_vec(),
                mime_type: Some("video/mp4".to_string()),
            }),
            submitted: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            query_count: AtomicU32::new(0),
            overlap: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            query_delay: Duration::from_millis(0),
            keys_seen: Mutex::new(Vec::new()),
            host: None,
            rotate_on_terminal: Mutex::new(None),
        }
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn with_download(mut self, step: DownloadStep) -> Self {
        self.download = Mutex::new(step);
        self
    }

    /// Record key reads through `host`, rotating to `rotate_to` when the
    /// terminal snapshot is handed out
    pub fn with_host(mut self, host: Arc<FakeHost>, rotate_to: Option<&str>) -> Self {
        self.host = Some(host);
        self.rotate_on_terminal = Mutex::new(rotate_to.map(str::to_string));
        self
    }

    async fn record_key(&self) {
        if let Some(host) = &self.host {
            let key = host.api_key().await;
            self.keys_seen.lock().unwrap().push(key);
        }
    }
}

#[async_trait]
impl VideoBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Operation, BackendError> {
        self.record_key().await;
        self.submitted.lock().unwrap().push(request.clone());
        Ok(Operation::pending("operations/test-op"))
    }

    async fn query(&self, operation: &Operation) -> Result<Operation, BackendError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlap.store(true, Ordering::SeqCst);
        }
        sleep(self.query_delay).await;
        self.in_flight.store(false, Ordering::SeqCst);
        self.query_count.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().unwrap().pop_front();
        match step {
            None | Some(QueryStep::Pending) => Ok(Operation::pending(operation.name.clone())),
            Some(QueryStep::Terminal(op)) => {
                if let (Some(host), Some(next)) = (
                    self.host.as_ref(),
                    self.rotate_on_terminal.lock().unwrap().take(),
                ) {
                    host.set_key(Some(&next));
                }
                Ok(op)
            }
            Some(QueryStep::Fail { status, message }) => Err(BackendError::Api {
                status,
                message: message.to_string(),
            }),
        }
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, BackendError> {
        self.record_key().await;
        self.downloads.lock().unwrap().push(uri.to_string());

        match &*self.download.lock().unwrap() {
            DownloadStep::Ok { bytes, mime_type } => Ok(DownloadedMedia {
                bytes: bytes.clone(),
                mime_type: mime_type.clone(),
            }),
            DownloadStep::Fail { status } => Err(BackendError::Api {
                status: *status,
                message: "delivery failed".to_string(),
            }),
        }
    }
}

/// Credential host with a settable in-memory key
pub struct FakeHost {
    key: Mutex<Option<String>>,
}

impl FakeHost {
    pub fn new(key: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            key: Mutex::new(key.map(str::to_string)),
        })
    }

    pub fn set_key(&self, key: Option<&str>) {
        *self.key.lock().unwrap() = key.map(str::to_string);
    }
}

#[async_trait]
impl CredentialHost for FakeHost {
    async fn has_credential(&self) -> bool {
        self.key.lock().unwrap().is_some()
    }

    async fn request_credential(&self) -> Result<(), CredentialError> {
        Err(CredentialError::HostUnavailable)
    }

    async fn api_key(&self) -> Option<String> {
        self.key.lock().unwrap().clone()
    }
}

/// Terminal snapshot carrying one delivery URI
pub fn done_with_uri(uri: &str) -> Operation {
    let mut op = Operation::pending("operations/test-op");
    op.done = true;
    op.response = Some(OperationResponse {
        generated_videos: vec![GeneratedVideo {
            video: Some(VideoHandle {
                uri: Some(uri.to_string()),
                mime_type: Some("video/mp4".to_string()),
            }),
        }],
    });
    op
}

/// Terminal snapshot carrying an error payload
pub fn done_with_error(message: &str) -> Operation {
    let mut op = Operation::pending("operations/test-op");
    op.done = true;
    op.error = Some(OperationError {
        code: Some(13),
        message: Some(message.to_string()),
    });
    op
}

/// Terminal snapshot with zero generated videos
pub fn done_empty() -> Operation {
    let mut op = Operation::pending("operations/test-op");
    op.done = true;
    op.response = Some(OperationResponse::default());
    op
}
