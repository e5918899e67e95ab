//! Generation Session Integration Tests
//!
//! Drives the state machine through full pipeline runs against a scripted
//! backend: the credential gate, cancellation, and the reset and
//! retry-acknowledge actions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{done_with_error, done_with_uri, FakeHost, QueryStep, ScriptedBackend};
use stillmotion::credentials::{CredentialError, CredentialHost, UnsupportedHost};
use stillmotion::{
    AspectRatio, GenerationSession, GenerationStatus, PollSettings, RetryPolicy, StartError,
    Workflow, WorkflowSettings,
};

fn fast_settings(artifacts_dir: &TempDir) -> WorkflowSettings {
    WorkflowSettings {
        poll: PollSettings {
            interval: Duration::from_millis(10),
            deadline: Some(Duration::from_secs(5)),
            retry: RetryPolicy::default(),
        },
        artifacts_dir: artifacts_dir.path().to_path_buf(),
    }
}

fn session_with_image() -> GenerationSession {
    let mut session = GenerationSession::new();
    session.select_image(vec![0xff, 0xd8], "image/jpeg");
    session
}

#[tokio::test]
async fn test_successful_run_reaches_complete() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![
        QueryStep::Pending,
        QueryStep::Terminal(done_with_uri("https://dl.example/v")),
    ]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));

    let mut session = session_with_image();
    session.set_prompt("Gentle breeze");

    let status = session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, GenerationStatus::Complete);
    let artifact = session.artifact().unwrap();
    assert_eq!(artifact.mime_type, "video/mp4");
    assert!(session.error_message().is_none());
}

#[tokio::test]
async fn test_failed_run_reaches_error_with_message() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![QueryStep::Terminal(
        done_with_error("prompt violates policy"),
    )]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));

    let mut session = session_with_image();
    let status = session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, GenerationStatus::Error);
    assert_eq!(session.error_message(), Some("prompt violates policy"));
    assert!(session.artifact().is_none());
}

#[tokio::test]
async fn test_start_requires_credential() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let workflow = Workflow::new(backend.clone(), fast_settings(&artifacts));
    let host = FakeHost::new(None);

    let mut session = session_with_image();
    let err = session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, StartError::CredentialMissing);
    // The gate failing is a notice, not a transition
    assert_eq!(session.status(), GenerationStatus::Idle);
    assert!(backend.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_absent_host_degrades_to_notice() {
    let host = UnsupportedHost;

    assert!(!host.has_credential().await);
    let err = host.request_credential().await.unwrap_err();
    assert!(matches!(err, CredentialError::HostUnavailable));

    // The session never left Idle
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));

    let mut session = session_with_image();
    let err = session
        .start(&workflow, &host, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, StartError::CredentialMissing);
    assert_eq!(session.status(), GenerationStatus::Idle);
}

#[tokio::test]
async fn test_start_requires_an_image() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));

    let mut session = GenerationSession::new();
    let err = session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, StartError::NoImage);
    assert_eq!(session.status(), GenerationStatus::Idle);
}

#[tokio::test]
async fn test_no_reentrant_start_from_terminal_states() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![
        QueryStep::Terminal(done_with_error("boom")),
        QueryStep::Terminal(done_with_uri("https://dl.example/v")),
    ]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));
    let cancel = CancellationToken::new();

    let mut session = session_with_image();
    session.start(&workflow, host.as_ref(), &cancel).await.unwrap();
    assert_eq!(session.status(), GenerationStatus::Error);

    // Error must be acknowledged before another start
    let err = session.start(&workflow, host.as_ref(), &cancel).await.unwrap_err();
    assert_eq!(err, StartError::AlreadyActive);

    // Acknowledging keeps the image and enables the retry
    session.acknowledge_error();
    assert_eq!(session.status(), GenerationStatus::Idle);
    assert!(session.has_image());

    let status = session.start(&workflow, host.as_ref(), &cancel).await.unwrap();
    assert_eq!(status, GenerationStatus::Complete);

    // Complete blocks starts too, until reset
    let err = session.start(&workflow, host.as_ref(), &cancel).await.unwrap_err();
    assert_eq!(err, StartError::AlreadyActive);
}

#[tokio::test]
async fn test_reset_clears_inputs_and_outcome() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![QueryStep::Terminal(
        done_with_uri("https://dl.example/v"),
    )]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));

    let mut session = session_with_image();
    session.set_prompt("Gentle breeze");
    session.set_aspect_ratio(AspectRatio::Portrait);
    session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(session.status(), GenerationStatus::Complete);

    session.reset();

    assert_eq!(session.status(), GenerationStatus::Idle);
    assert!(!session.has_image());
    assert_eq!(session.prompt(), "");
    assert_eq!(session.aspect_ratio(), AspectRatio::Landscape);
    assert!(session.artifact().is_none());
    assert!(session.error_message().is_none());
}

#[tokio::test]
async fn test_cancellation_returns_to_idle_with_inputs() {
    let artifacts = TempDir::new().unwrap();
    // Exhausted script: the operation never completes
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let workflow = Workflow::new(backend, fast_settings(&artifacts));
    let host = FakeHost::new(Some("key"));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let mut session = session_with_image();
    session.set_prompt("Gentle breeze");

    let status = session
        .start(&workflow, host.as_ref(), &cancel)
        .await
        .unwrap();

    // Never stuck in Generating, never Complete
    assert_eq!(status, GenerationStatus::Idle);
    assert!(session.has_image());
    assert_eq!(session.prompt(), "Gentle breeze");
    assert!(session.artifact().is_none());
    assert!(session.error_message().is_none());
}

#[tokio::test]
async fn test_timeout_surfaces_as_error() {
    let artifacts = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let mut settings = fast_settings(&artifacts);
    settings.poll.deadline = Some(Duration::from_millis(50));
    let workflow = Workflow::new(backend, settings);
    let host = FakeHost::new(Some("key"));

    let mut session = session_with_image();
    let status = session
        .start(&workflow, host.as_ref(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, GenerationStatus::Error);
    let message = session.error_message().unwrap();
    assert!(message.contains("timed out"), "unexpected message: {message}");
}
