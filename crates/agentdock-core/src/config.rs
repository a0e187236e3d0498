//! Installation paths and launch settings

use crate::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_ENTRYPOINT: &str = "node main.js";
const DEFAULT_TEMPLATE: &str = "andy.json";

/// Where profiles, the template and secrets live, and how to launch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DockConfig {
    /// Root of the automation project; launches run here
    pub automation_root: PathBuf,
    pub profiles_dir: PathBuf,
    /// Profile copied verbatim by `create`
    pub template_path: PathBuf,
    pub secrets_path: PathBuf,
    /// Executable invocation prefixed to `--profiles ...`
    pub entrypoint: String,
}

/// On-disk settings; every field except the root is optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    automation_root: PathBuf,
    profiles_dir: Option<PathBuf>,
    template_path: Option<PathBuf>,
    secrets_path: Option<PathBuf>,
    entrypoint: Option<String>,
}

impl DockConfig {
    /// Defaults for an automation project rooted at `root`
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            profiles_dir: root.join("profiles"),
            template_path: root.join(DEFAULT_TEMPLATE),
            secrets_path: default_secrets_path(),
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            automation_root: root,
        }
    }

    /// Load a settings file. Missing fields fall back to root-relative defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings: {:?}", path);

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(ConfigError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        let settings: SettingsFile = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(ConfigError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        let mut config = Self::from_root(settings.automation_root);
        if let Some(dir) = settings.profiles_dir {
            config.profiles_dir = dir;
        }
        if let Some(template) = settings.template_path {
            config.template_path = template;
        }
        if let Some(secrets) = settings.secrets_path {
            config.secrets_path = secrets;
        }
        if let Some(entrypoint) = settings.entrypoint {
            config.entrypoint = entrypoint;
        }

        info!("Settings loaded (automation root: {:?})", config.automation_root);
        Ok(config)
    }

    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = entrypoint.into();
        self
    }

    /// How a profile is referenced on the launch command line
    pub fn profile_arg(&self, name: &str) -> String {
        let file = format!("{}.json", name);
        match self.profiles_dir.strip_prefix(&self.automation_root) {
            Ok(relative) => {
                let mut arg = String::from(".");
                for component in relative.components() {
                    arg.push('/');
                    arg.push_str(&component.as_os_str().to_string_lossy());
                }
                format!("{}/{}", arg, file)
            }
            Err(_) => self.profiles_dir.join(file).display().to_string(),
        }
    }
}

/// `<data dir>/agentdock/config.json`, or a local fallback
pub fn default_secrets_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("agentdock"))
        .unwrap_or_else(|| PathBuf::from(".agentdock"))
        .join("config.json")
}
