// src/core/service_client.rs
//! HTTP client for the job-board backend REST API

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, trace};

pub const JOBS_ENDPOINT: &str = "/api/jobs";
pub const COMPANY_ENDPOINT: &str = "/api/company/company";
pub const USER_ENDPOINT: &str = "/api/users/user";
pub const APPLICATIONS_ENDPOINT: &str = "/api/users/applications";

const COMPANY_TOKEN_HEADER: &str = "token";

/// How a request authenticates against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    None,
    /// Raw recruiter token sent in the custom `token` header
    CompanyToken(String),
    /// Identity-provider token sent as `Authorization: Bearer`
    Bearer(String),
}

impl RequestAuth {
    /// Header name and value this auth mode adds to a request
    pub fn header(&self) -> Option<(&'static str, String)> {
        match self {
            RequestAuth::None => None,
            RequestAuth::CompanyToken(token) => Some((COMPANY_TOKEN_HEADER, token.clone())),
            RequestAuth::Bearer(token) => Some(("Authorization", format!("Bearer {}", token))),
        }
    }
}

/// Transport seam used by the session manager
#[async_trait]
pub trait Backend: Send + Sync {
    /// GET `endpoint` and return the decoded JSON body.
    /// Non-2xx statuses are errors.
    async fn get_json(&self, endpoint: &str, auth: &RequestAuth) -> Result<serde_json::Value>;
}

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Create new service client with configuration
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl Backend for ServiceClient {
    async fn get_json(&self, endpoint: &str, auth: &RequestAuth) -> Result<serde_json::Value> {
        let url = self.url(endpoint);
        trace!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some((name, value)) = auth.header() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to GET from {}", url))?;

        let status = response.status();
        trace!("Response status: {}", status);

        if status.is_success() {
            response
                .json::<serde_json::Value>()
                .await
                .context("Failed to parse JSON response")
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Backend error response {} from {}: {}", status, url, error_text);
            anyhow::bail!("Request failed with status code {}", status.as_u16())
        }
    }
}
