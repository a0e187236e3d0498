//! Launch request, output event and outcome types

use crate::config::DockConfig;
use crate::error::{Error, LaunchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchId(pub uuid::Uuid);

impl LaunchId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LaunchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for LaunchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Which child stream a chunk came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A chunk of child output pushed to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputEvent {
    pub launch_id: LaunchId,
    pub stream: OutputStream,
    pub data: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl OutputEvent {
    pub fn new(launch_id: LaunchId, stream: OutputStream, data: impl Into<String>) -> Self {
        Self {
            launch_id,
            stream,
            data: data.into(),
            at: chrono::Utc::now(),
        }
    }
}

/// The profiles chosen for one launch, in selection order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchRequest {
    profiles: Vec<String>,
}

impl LaunchRequest {
    /// Build a request, dropping repeated names but keeping first-seen order
    pub fn new<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in profiles {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { profiles: unique }
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Shell command that runs the automation entrypoint against these profiles
    pub fn to_command(&self, config: &DockConfig) -> Result<String> {
        if self.is_empty() {
            return Err(Error::Launch(LaunchError::NoSelection));
        }

        let args: Vec<String> = self
            .profiles
            .iter()
            .map(|name| config.profile_arg(name))
            .collect();

        Ok(format!("{} --profiles {}", config.entrypoint, args.join(" ")))
    }
}

/// Result of a launch that exited with code 0
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOutcome {
    pub launch_id: LaunchId,
    pub exit_code: i32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_request_dedupes_in_order() {
        let request = LaunchRequest::new(["bob", "andy", "bob"]);
        assert_eq!(request.profiles(), &["bob".to_string(), "andy".to_string()]);
    }

    #[test]
    fn test_empty_request_is_no_selection() {
        let config = DockConfig::from_root(PathBuf::from("/srv/automation"));
        let err = LaunchRequest::default().to_command(&config).unwrap_err();
        assert_eq!(err.kind(), "no_selection");
    }

    #[test]
    fn test_command_uses_relative_profile_paths() {
        let config = DockConfig::from_root(PathBuf::from("/srv/automation"));
        let command = LaunchRequest::new(["andy", "bob"]).to_command(&config).unwrap();
        assert_eq!(
            command,
            "node main.js --profiles ./profiles/andy.json ./profiles/bob.json"
        );
    }

    #[test]
    fn test_launch_id_round_trips_through_string() {
        let id = LaunchId::new();
        let parsed: LaunchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
