// src/core/token_store.rs
//! Persistent key/value storage for session tokens (the local-storage analogue)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::FsOps;

pub const COMPANY_TOKEN_KEY: &str = "companyToken";

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// String map persisted as a JSON object on disk.
///
/// Non-string values read back as their JSON text, so a hand-edited entry
/// still reaches token validation. Writes replace a file that no longer
/// parses.
pub struct FileTokenStore {
    path: PathBuf,
    // serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, Value>> {
        match FsOps::read_optional(&self.path).await? {
            None => Ok(BTreeMap::new()),
            Some(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Some(content) => serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse token store: {}", self.path.display())
            }),
        }
    }

    /// Entries for a write. An unreadable store starts over empty; the flag
    /// tells the caller the file must be rewritten.
    async fn load_for_write(&self) -> (BTreeMap<String, Value>, bool) {
        match self.load().await {
            Ok(entries) => (entries, false),
            Err(e) => {
                warn!("Discarding unreadable token store: {:#}", e);
                (BTreeMap::new(), true)
            }
        }
    }

    async fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(entries).context("Failed to serialize token store")?;
        FsOps::write_atomic(&self.path, &content).await
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key).map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load_for_write().await;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&entries).await?;
        info!("Stored {} in {}", key, self.path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, reset) = self.load_for_write().await;
        if entries.remove(key).is_some() || reset {
            self.save(&entries).await?;
            info!("Removed {} from {}", key, self.path.display());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
