// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::inspect_token;
use crate::core::{ConfigManager, FileTokenStore, ServiceClient};
use crate::identity::{self, UserSession};
use crate::notify::ConsoleNotifier;
use crate::session::SessionManager;
use crate::types::SearchFilter;

#[derive(Parser)]
#[command(name = "jobsync")]
#[command(about = "Keep job-board session data in sync with the backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Override the backend base URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a session, wait for every fetch and print the full state
    Sync,
    /// List jobs, optionally filtered
    Jobs {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Recruiter session management
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },
    /// Show the logged-in user's profile and applications
    User,
    /// Token utilities
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
pub enum CompanyAction {
    /// Store a recruiter token and load the company profile
    Login { token: String },
    /// Forget the stored recruiter token
    Logout,
    /// Print the company profile for the stored token
    Show,
}

#[derive(Subcommand)]
pub enum TokenAction {
    /// Decode a token without verifying it
    Inspect { token: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn build_manager(config: &ConfigManager) -> Result<(SessionManager, Option<UserSession>)> {
    let backend = ServiceClient::new(&config.backend.base_url, config.backend.timeout_seconds)?;
    let (identity, user_session) = identity::from_config(&config.identity);

    let manager = SessionManager::new(
        backend.base_url().to_string(),
        Arc::new(backend),
        identity,
        Arc::new(ConsoleNotifier),
        Arc::new(FileTokenStore::new(config.storage_path.clone())),
    );
    Ok((manager, user_session))
}

pub async fn handle_command(cli: Cli, mut config: ConfigManager) -> Result<()> {
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }

    let (manager, user_session) = build_manager(&config)?;

    match cli.command {
        Command::Sync => {
            manager.start().await;
            manager.set_user_session(user_session).await;
            manager.settle().await;
            print_json(&manager.snapshot().await)?;
        }

        Command::Jobs { title, location } => {
            manager.set_search_filter(SearchFilter::new(title, location)).await;
            manager.start().await;
            manager.settle().await;

            let filter = manager.search_filter().await;
            manager.set_is_searched(!filter.is_empty()).await;

            let jobs = manager.filtered_jobs().await;
            info!("{} jobs match the current filter", jobs.len());
            print_json(&jobs)?;
        }

        Command::Company { action } => match action {
            CompanyAction::Login { token } => {
                manager.login_company(&token).await?;
                manager.settle().await;
                match manager.company_data().await {
                    Some(company) => {
                        println!("✓ Logged in as {}", company.name().unwrap_or("company"));
                    }
                    None => println!("Token stored, company profile unavailable"),
                }
            }
            CompanyAction::Logout => {
                manager.logout_company().await?;
                println!("✓ Recruiter token removed");
            }
            CompanyAction::Show => {
                manager.start().await;
                manager.settle().await;
                match manager.company_token().await {
                    Some(_) => print_json(&manager.company_data().await)?,
                    None => println!("No recruiter session. Use `jobsync company login <token>`."),
                }
            }
        },

        Command::User => {
            if user_session.is_none() {
                anyhow::bail!("No identity configured. Set JOBSYNC_USER_TOKEN or JOBSYNC_TOKEN_COMMAND.");
            }
            manager.set_user_session(user_session).await;
            manager.settle().await;
            print_json(&serde_json::json!({
                "user": manager.user_data().await,
                "applications": manager.user_applications().await,
            }))?;
        }

        Command::Token {
            action: TokenAction::Inspect { token },
        } => print_json(&inspect_token(&token))?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs_command() {
        let cli = Cli::try_parse_from(["jobsync", "jobs", "--title", "rust"]).unwrap();
        match cli.command {
            Command::Jobs { title, location } => {
                assert_eq!(title, "rust");
                assert_eq!(location, "");
            }
            _ => panic!("expected jobs command"),
        }
    }

    #[test]
    fn test_parse_company_login() {
        let cli = Cli::try_parse_from([
            "jobsync",
            "--backend-url",
            "http://localhost:4000",
            "company",
            "login",
            "abc.def",
        ])
        .unwrap();
        assert_eq!(cli.backend_url.as_deref(), Some("http://localhost:4000"));
        assert!(matches!(
            cli.command,
            Command::Company {
                action: CompanyAction::Login { ref token }
            } if token == "abc.def"
        ));
    }

    #[test]
    fn test_company_login_requires_token() {
        assert!(Cli::try_parse_from(["jobsync", "company", "login"]).is_err());
    }
}
