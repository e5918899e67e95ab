//! Command-line interface for stillmotion.
//!
//! The CLI is the presentation layer: it supplies the image, prompt, and
//! aspect ratio, triggers the workflow, relays status transitions and error
//! messages, and exports the finished video. Ctrl-C cancels the running
//! generation cooperatively.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use crate::adapters::VeoBackend;
use crate::config;
use crate::core::{GenerationSession, GenerationStatus, StartError, Workflow};
use crate::credentials::{CredentialError, CredentialHost, EnvCredentialHost};
use crate::domain::AspectRatio;

/// stillmotion - turn still photos into seamless looping videos
#[derive(Parser, Debug)]
#[command(name = "stillmotion")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a looping video from a still image
    Generate {
        /// Source image file (JPEG, PNG, WebP, or GIF)
        image: PathBuf,

        /// Motion prompt; a looping instruction is appended automatically
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Output aspect ratio
        #[arg(short, long, value_enum, default_value = "landscape")]
        aspect_ratio: RatioArg,

        /// Copy the finished video to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give up polling after this many seconds (0 disables the deadline)
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },

    /// Check whether an API credential is configured
    Auth,

    /// Show resolved configuration (debug)
    Config,
}

/// Aspect ratio for the CLI (maps to AspectRatio)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RatioArg {
    /// 16:9
    Landscape,

    /// 9:16
    Portrait,
}

impl From<RatioArg> for AspectRatio {
    fn from(r: RatioArg) -> Self {
        match r {
            RatioArg::Landscape => AspectRatio::Landscape,
            RatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate {
                image,
                prompt,
                aspect_ratio,
                output,
                timeout_seconds,
            } => generate(&image, &prompt, aspect_ratio.into(), output, timeout_seconds).await,
            Commands::Auth => check_auth().await,
            Commands::Config => show_config(),
        }
    }
}

/// Run one generation end to end
async fn generate(
    image: &Path,
    prompt: &str,
    aspect_ratio: AspectRatio,
    output: Option<PathBuf>,
    timeout_seconds: Option<u64>,
) -> Result<()> {
    let cfg = config::config()?;

    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read image file: {}", image.display()))?;
    let mime_type = mime_type_for(image)
        .with_context(|| format!("Unsupported image type: {}", image.display()))?;

    let credentials: Arc<dyn CredentialHost> =
        Arc::new(EnvCredentialHost::new(cfg.credential_var.clone()));
    let backend = Arc::new(VeoBackend::new(cfg.veo_config(), credentials.clone()));

    let mut settings = cfg.workflow_settings();
    if let Some(seconds) = timeout_seconds {
        settings.poll.deadline = match seconds {
            0 => None,
            s => Some(std::time::Duration::from_secs(s)),
        };
    }
    let workflow = Workflow::new(backend, settings);

    let mut session = GenerationSession::new();
    session.select_image(bytes, mime_type);
    session.set_prompt(prompt);
    session.set_aspect_ratio(aspect_ratio);

    // Ctrl-C cancels the pending wait or query cooperatively
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            signal_token.cancel();
        }
    });

    eprintln!("Generating video... (poll interval {:?})", cfg.poll_interval);

    match session.start(&workflow, credentials.as_ref(), &cancel).await {
        Err(StartError::CredentialMissing) => {
            eprintln!(
                "No API credential is configured. Set {} or run `stillmotion auth`.",
                cfg.credential_var
            );
            std::process::exit(1);
        }
        Err(e) => anyhow::bail!("{}", e),
        Ok(_) => {}
    }

    match session.status() {
        GenerationStatus::Complete => {
            let artifact = session
                .artifact()
                .context("Complete state without an artifact")?;

            println!("{}", artifact.path.display());
            eprintln!(
                "[Done: {} ({} bytes), export as {}]",
                artifact.mime_type, artifact.size_bytes, artifact.suggested_filename
            );

            if let Some(destination) = output {
                std::fs::copy(&artifact.path, &destination).with_context(|| {
                    format!("Failed to copy video to {}", destination.display())
                })?;
                eprintln!("[Copied to {}]", destination.display());
            }
        }
        GenerationStatus::Error => {
            eprintln!(
                "[Generation failed: {}]",
                session.error_message().unwrap_or("unknown error")
            );
            std::process::exit(1);
        }
        GenerationStatus::Idle => {
            // Cancelled mid-poll; inputs stay usable for a re-run
            eprintln!("[Generation cancelled]");
        }
        GenerationStatus::Generating => unreachable!("start returned while still generating"),
    }

    Ok(())
}

/// Check the credential gate, invoking the selection flow when absent
async fn check_auth() -> Result<()> {
    let cfg = config::config()?;
    let host = EnvCredentialHost::new(cfg.credential_var.clone());

    if host.has_credential().await {
        println!("API credential configured (via {}).", cfg.credential_var);
        return Ok(());
    }

    match host.request_credential().await {
        Ok(()) => println!("Credential selected."),
        Err(CredentialError::HostUnavailable) => {
            println!(
                "Environment not supported: no credential-selection flow is available here.\n\
                 Set {} to use stillmotion.",
                cfg.credential_var
            );
        }
        Err(CredentialError::UserCancelled) => {
            println!("Credential selection cancelled.");
        }
    }

    Ok(())
}

/// Show the resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Home: {}", cfg.home.display());
    println!("Artifacts: {}", cfg.artifacts_dir.display());
    println!("Base URL: {}", cfg.base_url);
    println!("Model: {}", cfg.model);
    println!("Credential variable: {}", cfg.credential_var);
    println!("Poll interval: {:?}", cfg.poll_interval);
    match cfg.deadline {
        Some(deadline) => println!("Deadline: {:?}", deadline),
        None => println!("Deadline: none"),
    }
    println!(
        "Retry: {} attempts, {}ms initial delay",
        cfg.retry.max_attempts, cfg.retry.initial_delay_ms
    );
    match &cfg.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none found)"),
    }

    Ok(())
}

/// Infer the image MIME type from the file extension
fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
