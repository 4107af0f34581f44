// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// One environment section of `config.yaml`. Every field is optional so a
/// section only needs to name what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub backend_url: Option<String>,
    pub storage_path: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: EnvironmentConfig,
    #[serde(default)]
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Section for the current environment, empty when `config.yaml` is absent
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        Self::load_from_file(Path::new("config.yaml"), &environment)
    }

    pub fn get_environment() -> String {
        std::env::var("JOBSYNC_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from_file(config_path: &Path, environment: &str) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config_file: ConfigFile = serde_yaml::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            storage_path: env_config
                .storage_path
                .map(|p| Self::resolve_path(&p))
                .transpose()?,
            log_path: env_config
                .log_path
                .map(|p| Self::resolve_path(&p))
                .transpose()?,
            ..env_config
        })
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_empty_section() {
        let dir = tempfile::tempdir().unwrap();
        let config = EnvironmentConfig::load_from_file(&dir.path().join("config.yaml"), "local")
            .unwrap();
        assert!(config.backend_url.is_none());
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_selects_environment_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "local:\n  backend_url: http://localhost:4000\nproduction:\n  backend_url: https://jobs.example.com\n  storage_path: /var/lib/jobsync/storage.json\n  timeout_seconds: 10\n",
        )
        .unwrap();

        let local = EnvironmentConfig::load_from_file(&path, "local").unwrap();
        assert_eq!(local.backend_url.as_deref(), Some("http://localhost:4000"));
        assert!(local.timeout_seconds.is_none());

        let production = EnvironmentConfig::load_from_file(&path, "production").unwrap();
        assert_eq!(
            production.backend_url.as_deref(),
            Some("https://jobs.example.com")
        );
        assert_eq!(
            production.storage_path,
            Some(PathBuf::from("/var/lib/jobsync/storage.json"))
        );
        assert_eq!(production.timeout_seconds, Some(10));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "local: [unclosed").unwrap();
        assert!(EnvironmentConfig::load_from_file(&path, "local").is_err());
    }
}
