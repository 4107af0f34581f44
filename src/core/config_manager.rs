// src/core/config_manager.rs
//! Unified configuration: `config.yaml` section, then environment overrides

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::environment::EnvironmentConfig;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:4000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_ID: &str = "local-user";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub backend: BackendConfig,
    pub storage_path: PathBuf,
    pub log_path: PathBuf,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Fixed bearer token
    Static(String),
    /// Shell command printing a fresh token on stdout
    Command(String),
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub user_id: String,
    pub token_source: Option<TokenSource>,
}

impl ConfigManager {
    pub fn load() -> Result<Self> {
        let file = EnvironmentConfig::load()?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a file section with overrides looked up through `var`
    pub fn from_sources<F>(file: EnvironmentConfig, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = var("BACKEND_URL")
            .or(file.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let timeout_seconds = match var("JOBSYNC_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("JOBSYNC_TIMEOUT_SECS must be a number, got {}", raw))?,
            None => file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let base_dir = std::env::current_dir().context("Failed to get current directory")?;

        let storage_path = var("JOBSYNC_STORAGE")
            .map(PathBuf::from)
            .or(file.storage_path)
            .unwrap_or_else(|| base_dir.join(".jobsync").join("storage.json"));

        let log_path = var("JOBSYNC_LOG")
            .map(PathBuf::from)
            .or(file.log_path)
            .unwrap_or_else(|| std::env::temp_dir().join("jobsync.log"));

        let token_source = match (var("JOBSYNC_USER_TOKEN"), var("JOBSYNC_TOKEN_COMMAND")) {
            (Some(token), _) if !token.is_empty() => Some(TokenSource::Static(token)),
            (_, Some(command)) if !command.is_empty() => Some(TokenSource::Command(command)),
            _ => None,
        };

        let identity = IdentityConfig {
            user_id: var("JOBSYNC_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            token_source,
        };

        info!("Backend URL: {}", base_url);
        info!("Token store: {}", storage_path.display());

        Ok(Self {
            backend: BackendConfig {
                base_url,
                timeout_seconds,
            },
            storage_path,
            log_path,
            identity,
        })
    }
}
