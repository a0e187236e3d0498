//! Flat-file persistence
//!
//! This module provides:
//! - The profile store (one JSON document per agent)
//! - The secret store (one JSON document of API keys)
//! - Atomic full-document writes shared by both

mod profiles;
mod secrets;

pub use profiles::ProfileStore;
pub use secrets::{SecretSource, SecretStore};

#[cfg(test)]
pub use secrets::MockSecretSource;

use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Replace `path` with `content` via a sibling temp file and a rename.
///
/// Readers see either the previous document or the new one, never a partial write.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    debug!("Writing {:?} via {:?}", path, tmp_path);

    if let Err(e) = fs::write(&tmp_path, content).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    Ok(())
}

/// Serialize `value` as pretty-printed JSON
pub(crate) fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(value)?)
}
