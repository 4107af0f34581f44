// src/session.rs
//! Session & data sync manager.
//!
//! Owns the shared application state, validates the stored company token at
//! startup and keeps remote data in step with the two session inputs: the
//! company token and the identity-provider user session. Fetches triggered by
//! those inputs are spawned and never awaited by the trigger; they are tracked
//! in a `JoinSet` so dropping the manager aborts whatever is still in flight.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::auth::is_structurally_valid_token;
use crate::core::service_client::{
    APPLICATIONS_ENDPOINT, COMPANY_ENDPOINT, JOBS_ENDPOINT, USER_ENDPOINT,
};
use crate::core::token_store::COMPANY_TOKEN_KEY;
use crate::core::{Backend, RequestAuth, TokenStore};
use crate::identity::{IdentityProvider, UserSession};
use crate::notify::Notifier;
use crate::types::{
    Application, ApplicationsResponse, CompanyProfile, CompanyResponse, Job, JobsResponse,
    SearchFilter, UserProfile, UserResponse,
};

const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub search_filter: SearchFilter,
    pub is_searched: bool,
    pub jobs: Vec<Job>,
    pub show_recruiter_login: bool,
    pub company_token: Option<String>,
    pub company_data: Option<CompanyProfile>,
    pub user_session: Option<UserSession>,
    pub user_data: Option<UserProfile>,
    pub user_applications: Vec<Application>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub backend_url: String,
    pub taken_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: AppState,
}

/// What a fetch did. Purely informational: every failure has already been
/// surfaced through the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Server answered `success: false`
    Rejected(String),
    /// Transport, status or decoding failure
    Failed(String),
    /// Session changed while the request was in flight; result dropped
    Stale,
}

fn is_truthy(token: Option<&str>) -> bool {
    token.map(|t| !t.is_empty()).unwrap_or(false)
}

/// Everything a spawned fetch needs. Holds no task handles: every spawned
/// fetch owns a clone of this.
struct SyncContext {
    backend_url: String,
    backend: Arc<dyn Backend>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn TokenStore>,
    state: RwLock<AppState>,
}

impl SyncContext {
    async fn get<R: DeserializeOwned>(&self, endpoint: &str, auth: RequestAuth) -> Result<R> {
        let body = self.backend.get_json(endpoint, &auth).await?;
        serde_json::from_value(body)
            .with_context(|| format!("Unexpected response from {}", endpoint))
    }

    fn reject(&self, endpoint: &str, message: Option<String>) -> FetchOutcome {
        let message = message.unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
        warn!("{} rejected request: {}", endpoint, message);
        self.notifier.error(&message);
        FetchOutcome::Rejected(message)
    }

    fn fail(&self, endpoint: &str, err: anyhow::Error) -> FetchOutcome {
        error!("{} request failed: {:#}", endpoint, err);
        let message = err.to_string();
        self.notifier.error(&message);
        FetchOutcome::Failed(message)
    }

    async fn fetch_jobs(&self) -> FetchOutcome {
        match self.get::<JobsResponse>(JOBS_ENDPOINT, RequestAuth::None).await {
            Ok(response) if response.success => {
                info!("Loaded {} jobs", response.jobs.len());
                self.state.write().await.jobs = response.jobs;
                FetchOutcome::Applied
            }
            Ok(response) => self.reject(JOBS_ENDPOINT, response.message),
            Err(e) => self.fail(JOBS_ENDPOINT, e),
        }
    }

    async fn fetch_company_data(&self, token: String) -> FetchOutcome {
        let auth = RequestAuth::CompanyToken(token.clone());
        let result = self.get::<CompanyResponse>(COMPANY_ENDPOINT, auth).await;

        let mut state = self.state.write().await;
        if state.company_token.as_deref() != Some(token.as_str()) {
            debug!("Discarding company response for a superseded token");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(response) if response.success => {
                state.company_data = response.company;
                info!("Loaded company profile");
                FetchOutcome::Applied
            }
            Ok(response) => {
                drop(state);
                self.reject(COMPANY_ENDPOINT, response.message)
            }
            Err(e) => {
                drop(state);
                self.fail(COMPANY_ENDPOINT, e)
            }
        }
    }

    /// Bearer-authenticated GET on behalf of `session`. `None` when the
    /// session was replaced or ended before the answer arrived.
    async fn get_for_session<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        session: &UserSession,
    ) -> Option<Result<R>> {
        let result = match self.identity.get_token().await {
            Ok(token) => self.get::<R>(endpoint, RequestAuth::Bearer(token)).await,
            Err(e) => Err(e.context("Failed to acquire identity token")),
        };

        if self.state.read().await.user_session.as_ref() != Some(session) {
            debug!("Discarding {} response for {}, session changed", endpoint, session.user_id);
            return None;
        }
        Some(result)
    }

    async fn fetch_user_data(&self, session: UserSession) -> FetchOutcome {
        let result = match self.get_for_session::<UserResponse>(USER_ENDPOINT, &session).await {
            Some(result) => result,
            None => return FetchOutcome::Stale,
        };

        match result {
            Ok(response) if response.success => {
                let mut state = self.state.write().await;
                if state.user_session.as_ref() != Some(&session) {
                    return FetchOutcome::Stale;
                }
                state.user_data = response.user;
                info!("Loaded user profile");
                FetchOutcome::Applied
            }
            Ok(response) => self.reject(USER_ENDPOINT, response.message),
            Err(e) => self.fail(USER_ENDPOINT, e),
        }
    }

    async fn fetch_user_applications(&self, session: UserSession) -> FetchOutcome {
        let result = match self
            .get_for_session::<ApplicationsResponse>(APPLICATIONS_ENDPOINT, &session)
            .await
        {
            Some(result) => result,
            None => return FetchOutcome::Stale,
        };

        match result {
            Ok(response) if response.success => {
                let mut state = self.state.write().await;
                if state.user_session.as_ref() != Some(&session) {
                    return FetchOutcome::Stale;
                }
                info!("Loaded {} applications", response.applications.len());
                state.user_applications = response.applications;
                FetchOutcome::Applied
            }
            Ok(response) => self.reject(APPLICATIONS_ENDPOINT, response.message),
            Err(e) => self.fail(APPLICATIONS_ENDPOINT, e),
        }
    }
}

pub struct SessionManager {
    ctx: Arc<SyncContext>,
    tasks: Mutex<JoinSet<()>>,
}

impl SessionManager {
    pub fn new(
        backend_url: impl Into<String>,
        backend: Arc<dyn Backend>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            ctx: Arc::new(SyncContext {
                backend_url: backend_url.into(),
                backend,
                identity,
                notifier,
                store,
                state: RwLock::new(AppState::default()),
            }),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    async fn spawn<F, Fut>(&self, label: &'static str, fetch: F)
    where
        F: FnOnce(Arc<SyncContext>) -> Fut,
        Fut: Future<Output = FetchOutcome> + Send + 'static,
    {
        let fut = fetch(self.ctx.clone());
        let mut tasks = self.tasks.lock().await;
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                error!("Fetch task ended abnormally: {}", e);
            }
        }
        tasks.spawn(async move {
            let outcome = fut.await;
            debug!("{} finished: {:?}", label, outcome);
        });
    }

    /// Startup: load jobs and restore a structurally valid stored company token.
    pub async fn start(&self) {
        self.spawn("fetch_jobs", |ctx| async move { ctx.fetch_jobs().await })
            .await;

        match self.ctx.store.get(COMPANY_TOKEN_KEY).await {
            Ok(Some(token)) if is_structurally_valid_token(&token) => {
                info!("Restored company token from storage");
                self.set_company_token(Some(token)).await;
            }
            Ok(stored) => {
                if stored.is_some() {
                    warn!("Invalid or corrupt {} in storage, removing it", COMPANY_TOKEN_KEY);
                } else {
                    debug!("No stored {}", COMPANY_TOKEN_KEY);
                }
                if let Err(e) = self.ctx.store.remove(COMPANY_TOKEN_KEY).await {
                    error!("Failed to remove {}: {:#}", COMPANY_TOKEN_KEY, e);
                }
            }
            Err(e) => {
                warn!("Unreadable {} in storage, removing it: {:#}", COMPANY_TOKEN_KEY, e);
                if let Err(e) = self.ctx.store.remove(COMPANY_TOKEN_KEY).await {
                    error!("Failed to remove {}: {:#}", COMPANY_TOKEN_KEY, e);
                }
            }
        }
    }

    /// Wait for every fetch spawned so far, including ones spawned meanwhile
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tasks.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    error!("Fetch task ended abnormally: {}", e);
                }
            }
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.ctx.backend_url
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            backend_url: self.ctx.backend_url.clone(),
            taken_at: Utc::now(),
            state: self.ctx.state.read().await.clone(),
        }
    }

    // ----- search -----

    pub async fn search_filter(&self) -> SearchFilter {
        self.ctx.state.read().await.search_filter.clone()
    }

    pub async fn set_search_filter(&self, filter: SearchFilter) {
        self.ctx.state.write().await.search_filter = filter;
    }

    pub async fn is_searched(&self) -> bool {
        self.ctx.state.read().await.is_searched
    }

    pub async fn set_is_searched(&self, searched: bool) {
        self.ctx.state.write().await.is_searched = searched;
    }

    // ----- jobs -----

    pub async fn jobs(&self) -> Vec<Job> {
        self.ctx.state.read().await.jobs.clone()
    }

    pub async fn set_jobs(&self, jobs: Vec<Job>) {
        self.ctx.state.write().await.jobs = jobs;
    }

    /// Jobs matching the current search filter
    pub async fn filtered_jobs(&self) -> Vec<Job> {
        let state = self.ctx.state.read().await;
        state
            .jobs
            .iter()
            .filter(|job| job.matches(&state.search_filter))
            .cloned()
            .collect()
    }

    pub async fn fetch_jobs(&self) -> FetchOutcome {
        self.ctx.fetch_jobs().await
    }

    // ----- recruiter -----

    pub async fn show_recruiter_login(&self) -> bool {
        self.ctx.state.read().await.show_recruiter_login
    }

    pub async fn set_show_recruiter_login(&self, show: bool) {
        self.ctx.state.write().await.show_recruiter_login = show;
    }

    pub async fn company_token(&self) -> Option<String> {
        self.ctx.state.read().await.company_token.clone()
    }

    /// Changing the token to a non-empty value spawns a company fetch.
    /// Clearing it drops the company profile.
    pub async fn set_company_token(&self, token: Option<String>) {
        {
            let mut state = self.ctx.state.write().await;
            if state.company_token == token {
                return;
            }
            if !is_truthy(token.as_deref()) {
                state.company_data = None;
            }
            state.company_token = token.clone();
        }

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.spawn("fetch_company_data", move |ctx| async move {
                ctx.fetch_company_data(token).await
            })
            .await;
        }
    }

    pub async fn company_data(&self) -> Option<CompanyProfile> {
        self.ctx.state.read().await.company_data.clone()
    }

    pub async fn set_company_data(&self, company: Option<CompanyProfile>) {
        self.ctx.state.write().await.company_data = company;
    }

    pub async fn fetch_company_data(&self) -> FetchOutcome {
        match self.company_token().await.filter(|t| !t.is_empty()) {
            Some(token) => self.ctx.fetch_company_data(token).await,
            None => self.ctx.fail(
                COMPANY_ENDPOINT,
                anyhow::anyhow!("Recruiter login required"),
            ),
        }
    }

    /// Persist a recruiter token and make it the active one
    pub async fn login_company(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            anyhow::bail!("Company token must not be empty");
        }
        self.ctx
            .store
            .set(COMPANY_TOKEN_KEY, token)
            .await
            .context("Failed to persist company token")?;
        self.set_company_token(Some(token.to_string())).await;
        Ok(())
    }

    pub async fn logout_company(&self) -> Result<()> {
        self.ctx
            .store
            .remove(COMPANY_TOKEN_KEY)
            .await
            .context("Failed to remove company token")?;
        self.set_company_token(None).await;
        info!("Recruiter logged out");
        Ok(())
    }

    // ----- end user -----

    pub async fn user_session(&self) -> Option<UserSession> {
        self.ctx.state.read().await.user_session.clone()
    }

    /// Report the identity-provider session. Any change clears the previous
    /// user's data; a change to a present session spawns both user fetches.
    pub async fn set_user_session(&self, session: Option<UserSession>) {
        {
            let mut state = self.ctx.state.write().await;
            if state.user_session == session {
                return;
            }
            state.user_data = None;
            state.user_applications.clear();
            state.user_session = session.clone();
        }

        if let Some(session) = session {
            let for_applications = session.clone();
            self.spawn("fetch_user_data", move |ctx| async move {
                ctx.fetch_user_data(session).await
            })
            .await;
            self.spawn("fetch_user_applications", move |ctx| async move {
                ctx.fetch_user_applications(for_applications).await
            })
            .await;
        }
    }

    pub async fn user_data(&self) -> Option<UserProfile> {
        self.ctx.state.read().await.user_data.clone()
    }

    pub async fn set_user_data(&self, user: Option<UserProfile>) {
        self.ctx.state.write().await.user_data = user;
    }

    pub async fn user_applications(&self) -> Vec<Application> {
        self.ctx.state.read().await.user_applications.clone()
    }

    pub async fn set_user_applications(&self, applications: Vec<Application>) {
        self.ctx.state.write().await.user_applications = applications;
    }

    pub async fn fetch_user_data(&self) -> FetchOutcome {
        match self.user_session().await {
            Some(session) => self.ctx.fetch_user_data(session).await,
            None => self.ctx.fail(USER_ENDPOINT, anyhow::anyhow!("User login required")),
        }
    }

    pub async fn fetch_user_applications(&self) -> FetchOutcome {
        match self.user_session().await {
            Some(session) => self.ctx.fetch_user_applications(session).await,
            None => self
                .ctx
                .fail(APPLICATIONS_ENDPOINT, anyhow::anyhow!("User login required")),
        }
    }
}
