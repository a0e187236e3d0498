//! Secret store: a single JSON object of API keys
//!
//! Values are stored as plaintext on local disk.

use super::{to_pretty_json, write_atomic};
use crate::error::{Error, Result, SecretError};
use crate::types::SecretSet;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Anything that can supply secrets for a launch
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Current secrets; failures yield an empty set
    async fn load(&self) -> SecretSet;
}

#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the secret file. A missing or malformed file is an empty set.
    pub async fn get(&self) -> SecretSet {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No secrets file at {:?}", self.path);
                return SecretSet::new();
            }
            Err(e) => {
                warn!("Failed to read secrets file {:?}: {}", self.path, e);
                return SecretSet::new();
            }
        };

        match serde_json::from_str::<SecretSet>(&raw) {
            Ok(secrets) => secrets,
            Err(e) => {
                warn!("Ignoring malformed secrets file {:?}: {}", self.path, e);
                SecretSet::new()
            }
        }
    }

    /// Overwrite the secret file with the full set
    pub async fn put(&self, secrets: &SecretSet) -> Result<()> {
        let content = to_pretty_json(secrets)?;
        write_atomic(&self.path, &content).await.map_err(|e| {
            error!("Failed to write secrets file {:?}: {}", self.path, e);
            Error::Secret(SecretError::WriteFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        let names: Vec<&str> = secrets.iter().map(|(name, _)| name).collect();
        info!("Saved {} secrets: {:?}", names.len(), names);
        Ok(())
    }
}

#[async_trait]
impl SecretSource for SecretStore {
    async fn load(&self) -> SecretSet {
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_get_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path().join("config.json"));
        assert!(store.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path().join("data").join("config.json"));

        let mut secrets = SecretSet::with_known_keys();
        secrets.insert("OPENAI_API_KEY", "sk-test");
        secrets.insert("ANTHROPIC_API_KEY", "sk-ant-\"quoted\"");

        store.put(&secrets).await.unwrap();
        assert_eq!(store.get().await, secrets);
    }

    #[tokio::test]
    async fn test_put_writes_pretty_json() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path().join("config.json"));

        let mut secrets = SecretSet::new();
        secrets.insert("OPENAI_API_KEY", "sk-test");
        store.put(&secrets).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{\n  \"OPENAI_API_KEY\": \"sk-test\"\n}");
    }

    // Secret reads swallow corruption while profile reads surface it.
    #[tokio::test]
    async fn test_get_corrupted_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path().join("config.json"));
        std::fs::write(store.path(), "{ \"OPENAI_API_KEY\": ").unwrap();

        assert!(store.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_non_string_values_is_empty() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path().join("config.json"));
        std::fs::write(store.path(), r#"{"OPENAI_API_KEY": 42}"#).unwrap();

        assert!(store.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let store = SecretStore::new(blocker.join("config.json"));

        let err = store.put(&SecretSet::new()).await.unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
