// src/identity.rs
//! External identity-provider seam. The provider owns the end-user login;
//! this crate only reacts to the session and asks for bearer tokens.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::core::config_manager::{IdentityConfig, TokenSource};

/// Logged-in end user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Acquire a bearer token. Called before every user request; the caller
    /// never caches the result.
    async fn get_token(&self) -> Result<String>;
}

/// Provider for hosts without an end-user login
pub struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn get_token(&self) -> Result<String> {
        anyhow::bail!("No identity provider configured")
    }
}

pub struct StaticIdentity {
    token: String,
}

impl StaticIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn get_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Runs a shell command for each acquisition and uses its trimmed stdout
pub struct CommandIdentity {
    command: String,
}

impl CommandIdentity {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for CommandIdentity {
    async fn get_token(&self) -> Result<String> {
        debug!("Acquiring identity token via: {}", self.command);

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .context("Failed to execute token command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Token command failed: {}", stderr.trim());
        }

        let token = String::from_utf8(output.stdout)
            .context("Token command printed non UTF-8 output")?
            .trim()
            .to_string();

        if token.is_empty() {
            anyhow::bail!("Token command printed an empty token");
        }

        Ok(token)
    }
}

/// Provider and session for the configured identity, if any
pub fn from_config(config: &IdentityConfig) -> (Arc<dyn IdentityProvider>, Option<UserSession>) {
    match &config.token_source {
        Some(TokenSource::Static(token)) => (
            Arc::new(StaticIdentity::new(token.clone())),
            Some(UserSession::new(config.user_id.clone())),
        ),
        Some(TokenSource::Command(command)) => (
            Arc::new(CommandIdentity::new(command.clone())),
            Some(UserSession::new(config.user_id.clone())),
        ),
        None => (Arc::new(NoIdentity), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_identity() {
        assert_eq!(StaticIdentity::new("tok").get_token().await.unwrap(), "tok");
        assert!(NoIdentity.get_token().await.is_err());
    }

    #[tokio::test]
    async fn test_command_identity() {
        let provider = CommandIdentity::new("echo '  fresh-token  '");
        assert_eq!(provider.get_token().await.unwrap(), "fresh-token");

        assert!(CommandIdentity::new("exit 3").get_token().await.is_err());
        assert!(CommandIdentity::new("true").get_token().await.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = IdentityConfig {
            user_id: "u1".into(),
            token_source: Some(TokenSource::Static("t".into())),
        };
        let (_, session) = from_config(&config);
        assert_eq!(session, Some(UserSession::new("u1")));

        let config = IdentityConfig {
            user_id: "u1".into(),
            token_source: None,
        };
        let (_, session) = from_config(&config);
        assert!(session.is_none());
    }
}
