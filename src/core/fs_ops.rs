// src/core/fs_ops.rs
//! File system helpers for the persisted token store

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            debug!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Read a file, `None` when it does not exist
    pub async fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read file: {}", path.display()))
            }
        }
    }

    /// Write through a sibling temp file so readers never see a partial file
    pub async fn write_atomic(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace file: {}", path.display()))?;

        debug!("Written file: {}", path.display());
        Ok(())
    }
}
