//! Configuration for stillmotion.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STILLMOTION_HOME, STILLMOTION_ARTIFACTS,
//!    STILLMOTION_BASE_URL)
//! 2. Config file (.stillmotion/config.yaml)
//! 3. Defaults (~/.stillmotion)
//!
//! Config file discovery:
//! - Searches current directory and parents for .stillmotion/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::veo::VeoConfig;
use crate::core::poller::{PollSettings, RetryPolicy};
use crate::core::workflow::WorkflowSettings;

/// Environment variable holding the API key by default
pub const DEFAULT_CREDENTIAL_VAR: &str = "GEMINI_API_KEY";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: Option<GenerationConfig>,
    #[serde(default)]
    pub polling: Option<PollingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Downloaded-artifact directory (relative to config file)
    pub artifacts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Environment variable the credential host reads
    pub credential_var: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_seconds: Option<u64>,
    /// Overall deadline; 0 disables it
    pub deadline_seconds: Option<u64>,
    pub retry: Option<RetryPolicy>,
}

/// Resolved configuration with absolute paths and defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the state directory
    pub home: PathBuf,
    /// Absolute path downloaded artifacts land in
    pub artifacts_dir: PathBuf,
    /// Generation API base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub credential_var: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Wait between status queries
    pub poll_interval: Duration,
    /// Overall polling deadline
    pub deadline: Option<Duration>,
    /// Retry policy for transient query failures
    pub retry: RetryPolicy,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Backend configuration derived from this config
    pub fn veo_config(&self) -> VeoConfig {
        VeoConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            request_timeout: self.request_timeout,
        }
    }

    /// Poll-loop settings derived from this config
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            deadline: self.deadline,
            retry: self.retry.clone(),
        }
    }

    /// Workflow settings derived from this config
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            poll: self.poll_settings(),
            artifacts_dir: self.artifacts_dir.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".stillmotion").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    // Default home directory
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".stillmotion");

    // Check for config file
    let config_file = find_config_file();
    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Resolve home path
    let home = if let Ok(env_home) = std::env::var("STILLMOTION_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = parsed.as_ref().and_then(|c| c.paths.home.as_ref()) {
        // home is relative to the .stillmotion/ directory
        let config_dir = config_file
            .as_ref()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    // Resolve artifacts path
    let artifacts_dir = if let Ok(env_artifacts) = std::env::var("STILLMOTION_ARTIFACTS") {
        PathBuf::from(env_artifacts)
    } else if let Some(artifacts_path) = parsed.as_ref().and_then(|c| c.paths.artifacts.as_ref()) {
        let base_dir = config_file
            .as_ref()
            .and_then(|p| p.parent())
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));
        resolve_path(base_dir, artifacts_path)
    } else {
        home.join("artifacts")
    };

    let generation = parsed.as_ref().and_then(|c| c.generation.as_ref());
    let polling = parsed.as_ref().and_then(|c| c.polling.as_ref());
    let veo_defaults = VeoConfig::default();

    let base_url = std::env::var("STILLMOTION_BASE_URL")
        .ok()
        .or_else(|| generation.and_then(|g| g.base_url.clone()))
        .unwrap_or(veo_defaults.base_url);

    let model = generation
        .and_then(|g| g.model.clone())
        .unwrap_or(veo_defaults.model);

    let credential_var = generation
        .and_then(|g| g.credential_var.clone())
        .unwrap_or_else(|| DEFAULT_CREDENTIAL_VAR.to_string());

    let request_timeout = generation
        .and_then(|g| g.request_timeout_seconds)
        .map(Duration::from_secs)
        .unwrap_or(veo_defaults.request_timeout);

    let poll_defaults = PollSettings::default();

    let poll_interval = polling
        .and_then(|p| p.interval_seconds)
        .map(Duration::from_secs)
        .unwrap_or(poll_defaults.interval);

    let deadline = match polling.and_then(|p| p.deadline_seconds) {
        Some(0) => None,
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => poll_defaults.deadline,
    };

    let retry = polling
        .and_then(|p| p.retry.clone())
        .unwrap_or(poll_defaults.retry);

    Ok(ResolvedConfig {
        home,
        artifacts_dir,
        base_url,
        model,
        credential_var,
        request_timeout,
        poll_interval,
        deadline,
        retry,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
