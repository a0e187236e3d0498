//! Agent profile store: one JSON document per agent

use super::{to_pretty_json, write_atomic};
use crate::config::DockConfig;
use crate::error::{Error, ProfileError, Result};
use crate::types::{validate_profile_name, AgentProfile};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Reads and writes profiles under a profiles directory.
///
/// No locking: concurrent writers to the same name race and the last rename wins.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles_dir: PathBuf,
    template_path: PathBuf,
}

impl ProfileStore {
    pub fn new(profiles_dir: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            template_path: template_path.into(),
        }
    }

    pub fn from_config(config: &DockConfig) -> Self {
        Self::new(&config.profiles_dir, &config.template_path)
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// File backing the profile called `name`
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_profile_name(name)?;
        Ok(self.profiles_dir.join(format!("{}.json", name)))
    }

    /// Whether a profile file exists for `name`
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Names of all profiles, sorted. A missing directory is an empty list.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.profiles_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Profiles directory missing: {:?}", self.profiles_dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension() != Some(std::ffi::OsStr::new("json")) {
                continue;
            }
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.starts_with('.') => names.push(stem.to_string()),
                Some(_) => {}
                None => warn!("Skipping non UTF-8 profile filename: {:?}", path),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Copy the template verbatim to `name`, overwriting any existing profile
    pub async fn create(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;

        let template = fs::read(&self.template_path).await.map_err(|e| {
            Error::Profile(ProfileError::TemplateUnreadable {
                path: self.template_path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        if path.exists() {
            warn!("Profile {} already exists, overwriting from template", name);
        }

        write_atomic(&path, &template).await?;
        info!("Created profile {} from {:?}", name, self.template_path);
        Ok(())
    }

    /// Load a profile. Missing files and invalid JSON are distinct errors.
    pub async fn read(&self, name: &str) -> Result<AgentProfile> {
        let path = self.path_for(name)?;
        debug!("Reading profile: {:?}", path);

        let raw = fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Profile(ProfileError::NotFound(name.to_string()))
            } else {
                Error::Io(e)
            }
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            Error::Profile(ProfileError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Replace the whole profile document
    pub async fn write(&self, name: &str, profile: &AgentProfile) -> Result<()> {
        let path = self.path_for(name)?;
        let content = to_pretty_json(profile)?;
        write_atomic(&path, &content).await?;
        info!("Saved profile {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExampleMessage, Role};
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    const TEMPLATE: &str = r#"{
  "name": "andy",
  "model": "gpt-4o-mini",
  "conversing": "Be helpful.",
  "coding": "Write code.",
  "modes": { "hunting": true, "cowardice": false },
  "conversation_examples": [],
  "coding_examples": []
}"#;

    fn setup() -> (TempDir, ProfileStore) {
        let dir = tempdir().unwrap();
        let template = dir.path().join("andy.json");
        std::fs::write(&template, TEMPLATE).unwrap();
        let store = ProfileStore::new(dir.path().join("profiles"), template);
        (dir, store)
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let (_dir, store) = setup();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_dir_is_empty() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.profiles_dir()).unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_only_json_files() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.profiles_dir()).unwrap();
        std::fs::write(store.profiles_dir().join("zed.json"), "{}").unwrap();
        std::fs::write(store.profiles_dir().join("bob.json"), "{}").unwrap();
        std::fs::write(store.profiles_dir().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(store.profiles_dir().join("dir.json")).unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["bob", "zed"]);
    }

    #[tokio::test]
    async fn test_list_skips_leftover_temp_files() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.profiles_dir()).unwrap();
        std::fs::write(store.profiles_dir().join("bob.json"), "{}").unwrap();
        std::fs::write(
            store
                .profiles_dir()
                .join(format!(".bob.json.{}.tmp", uuid::Uuid::new_v4())),
            "{",
        )
        .unwrap();
        std::fs::write(store.profiles_dir().join(".hidden.json"), "{}").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_exists() {
        let (_dir, store) = setup();
        assert!(!store.exists("bob").await.unwrap());
        store.create("bob").await.unwrap();
        assert!(store.exists("bob").await.unwrap());
        assert!(store.exists("../bob").await.is_err());
    }

    #[tokio::test]
    async fn test_create_copies_template_verbatim() {
        let (_dir, store) = setup();
        store.create("bob").await.unwrap();

        let written = std::fs::read_to_string(store.path_for("bob").unwrap()).unwrap();
        assert_eq!(written, TEMPLATE);
        assert_eq!(store.list().await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_create_overwrites_existing() {
        let (_dir, store) = setup();
        store.create("bob").await.unwrap();

        let mut profile = store.read("bob").await.unwrap();
        profile.conversing = "Changed.".to_string();
        store.write("bob", &profile).await.unwrap();

        store.create("bob").await.unwrap();
        let written = std::fs::read_to_string(store.path_for("bob").unwrap()).unwrap();
        assert_eq!(written, TEMPLATE);
    }

    #[tokio::test]
    async fn test_create_replaces_non_json_file() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.profiles_dir()).unwrap();
        std::fs::write(store.path_for("bob").unwrap(), "not json at all").unwrap();
        assert_eq!(store.read("bob").await.unwrap_err().kind(), "malformed");

        store.create("bob").await.unwrap();
        assert_eq!(store.read("bob").await.unwrap().model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_create_without_template_fails() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles"), dir.path().join("missing.json"));

        let err = store.create("bob").await.unwrap_err();
        assert_eq!(err.kind(), "template_unreadable");
        assert!(!store.path_for("bob").unwrap().exists());
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (_dir, store) = setup();
        let mut profile = AgentProfile::new("carl", "claude-3-haiku-20240307");
        profile.conversing = "Talk like a pirate.".to_string();
        profile.modes.insert("hunting".to_string(), true);
        profile.coding_examples.push(vec![
            ExampleMessage::new(Role::User, "build a house"),
            ExampleMessage::new(Role::Assistant, "```\nbuild()\n```"),
        ]);
        profile
            .extra
            .insert("cooldown".to_string(), serde_json::json!(3000));

        store.write("carl", &profile).await.unwrap();
        let loaded = store.read("carl").await.unwrap();

        assert_eq!(loaded, profile);
    }

    #[tokio::test]
    async fn test_write_is_pretty_printed() {
        let (_dir, store) = setup();
        store
            .write("carl", &AgentProfile::new("carl", "gpt-4o"))
            .await
            .unwrap();

        let written = std::fs::read_to_string(store.path_for("carl").unwrap()).unwrap();
        assert_eq!(
            written,
            r#"{
  "name": "carl",
  "model": "gpt-4o",
  "conversing": "",
  "coding": "",
  "modes": {},
  "conversation_examples": [],
  "coding_examples": []
}"#
        );
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, store) = setup();
        let err = store.read("ghost").await.unwrap_err();
        assert!(matches!(err, Error::Profile(ProfileError::NotFound(ref n)) if n == "ghost"));
    }

    #[tokio::test]
    async fn test_read_invalid_json_is_malformed() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.profiles_dir()).unwrap();
        std::fs::write(store.path_for("broken").unwrap(), "{ not json").unwrap();

        let err = store.read("broken").await.unwrap_err();
        assert!(matches!(err, Error::Profile(ProfileError::Malformed { .. })));
        assert_eq!(err.kind(), "malformed");
    }

    #[tokio::test]
    async fn test_invalid_names_never_touch_disk() {
        let (_dir, store) = setup();
        assert!(store.create("../escape").await.is_err());
        assert!(store.read("a/b").await.is_err());
        assert!(store
            .write("..", &AgentProfile::new("x", "gpt-4o"))
            .await
            .is_err());
    }
}
